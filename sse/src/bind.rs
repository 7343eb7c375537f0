use crate::options::Options;
use crate::sender::PayloadSender;
use crate::session::{Session, SessionId, Termination};
use crate::writer::body_channel;
use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
        HeaderName, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use log::*;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};

/// Middleware future returned by [`bind`].
pub type BindFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Turns the routes it wraps into event streams of `T`.
///
/// Takes zero or one [`Options`] (`None`, `Some(options)`, or any iterator;
/// the first wins). The result plugs into `axum::middleware::from_fn`:
///
/// ```rust,ignore
/// Router::new().route(
///     "/ticker",
///     get(ticker).layer(from_fn(sse::bind::<Tick, _>(Some(options)))),
/// )
/// ```
///
/// Handlers behind it take a [`PayloadSender<T>`] argument and send payloads
/// through it; the stream ends when the handler returns.
pub fn bind<T, I>(
    options: I,
) -> impl Fn(Request, Next) -> BindFuture + Clone + Send + Sync + 'static
where
    T: Serialize + Send + Sync + 'static,
    I: IntoIterator<Item = Options>,
{
    let options = Options::first_or_default(options);
    move |request: Request, next: Next| -> BindFuture {
        Box::pin(serve::<T>(options, request, next))
    }
}

/// Streams one request as server-sent events.
///
/// The handler chain behind `next` runs on its own task, because the response
/// has to be handed back to hyper before any frame can reach the client. When
/// that task returns, the session is told to stop and joined; the response
/// body ends only after the session has released it.
pub async fn serve<T>(options: Options, mut request: Request, next: Next) -> Response
where
    T: Serialize + Send + Sync + 'static,
{
    let id = SessionId::new();
    debug!(
        "sse[{id}]: binding {} {} to a {} stream",
        request.method(),
        request.uri().path(),
        std::any::type_name::<T>()
    );

    let (payload_tx, payload_rx) = mpsc::channel::<T>(options.channel_capacity());
    request
        .extensions_mut()
        .insert(PayloadSender::new(payload_tx));

    let (writer, body, disconnect) = body_channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let session = Session::new(id.clone(), options, payload_rx, writer);
    let session_task = tokio::spawn(session.run(disconnect.wait(), async move {
        // Resolves on send or when the sender is dropped.
        let _ = stop_rx.await;
    }));

    tokio::spawn(async move {
        let handler_response = next.run(request).await;
        debug!(
            "sse[{id}]: handler returned {}, stopping stream",
            handler_response.status()
        );

        let _ = stop_tx.send(());
        match session_task.await {
            Ok(Termination::TimedOut) => info!("sse[{id}]: stream ended after timeout"),
            Ok(termination) => debug!("sse[{id}]: stream joined ({termination:?})"),
            Err(e) => error!("sse[{id}]: session task failed: {e}"),
        }
    });

    event_stream_response(body)
}

fn event_stream_response(body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::StatusCode,
        middleware::from_fn,
        routing::get,
        Router,
    };
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time;
    use tower::ServiceExt;

    #[derive(Debug, Serialize)]
    #[allow(non_snake_case)]
    struct Object {
        Message: String,
    }

    async fn send_once(events: PayloadSender<Object>) {
        events
            .send(Object {
                Message: "X".to_string(),
            })
            .await
            .unwrap();
        time::sleep(Duration::from_secs(1)).await;
    }

    async fn send_every_second(events: PayloadSender<Object>) {
        let mut sequence = 0;
        loop {
            tokio::select! {
                _ = events.closed() => return,
                _ = time::sleep(Duration::from_secs(1)) => {
                    sequence += 1;
                    let message = Object { Message: format!("tick {sequence}") };
                    if events.send(message).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    fn app() -> Router {
        let fast_pings = Options::new().with_ping_interval(Duration::from_millis(300));
        let fastest_pings = Options::new().with_ping_interval(Duration::from_millis(100));

        Router::new()
            .route(
                "/normal",
                get(send_once).layer(from_fn(bind::<Object, _>(None))),
            )
            .route(
                "/ping",
                get(send_once).layer(from_fn(bind::<Object, _>([
                    fast_pings,
                    fastest_pings,
                ]))),
            )
            .route("/unbound", get(send_once))
    }

    async fn get_request(uri: &str) -> Response {
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app().oneshot(request).await.unwrap()
    }

    fn assert_event_stream_headers(response: &Response) {
        let headers = response.headers();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers["x-accel-buffering"], "no");
    }

    #[tokio::test(start_paused = true)]
    async fn normal_stream_sends_payload_and_ends_with_handler() {
        let response = get_request("/normal").await;
        assert_event_stream_headers(&response);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            ": ping\n\nevents: stream opened\n\ndata: {\"Message\":\"X\"}\n\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_options_set_the_ping_interval() {
        let response = get_request("/ping").await;
        assert_event_stream_headers(&response);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            ": ping\n\nevents: stream opened\n\ndata: {\"Message\":\"X\"}\n\n: ping\n\n: ping\n\n: ping\n\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn client_disconnect_ends_the_session_and_the_producer() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let app = Router::new().route(
            "/hangup",
            get(move |events: PayloadSender<Object>| {
                let flag = flag.clone();
                async move {
                    send_every_second(events).await;
                    flag.store(true, Ordering::SeqCst);
                }
            })
            .layer(from_fn(bind::<Object, _>(None))),
        );
        let request = axum::http::Request::builder()
            .uri("/hangup")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_event_stream_headers(&response);

        let mut data = response.into_body().into_data_stream();
        let mut received = String::new();
        while !received.contains("data: ") {
            let chunk = data.next().await.unwrap().unwrap();
            received.push_str(std::str::from_utf8(&chunk).unwrap());
        }
        assert!(received.starts_with(": ping\n\nevents: stream opened\n\n"));
        assert!(received.ends_with("data: {\"Message\":\"tick 1\"}\n\n"));

        assert!(!finished.load(Ordering::SeqCst));

        // Hanging up drops the body, which cancels the session and closes the
        // producer's channel.
        drop(data);
        time::sleep(Duration::from_millis(50)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn handler_without_binding_is_rejected() {
        let response = get_request("/unbound").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
