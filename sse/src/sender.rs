use crate::error::{Error, ErrorKind};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use log::*;
use tokio::sync::mpsc;

/// Send-only handle to a session's payload channel.
///
/// `bind::<T>` places one in the request extensions; handlers take it as an
/// argument and push values of `T`, each becoming one `data:` frame.
pub struct PayloadSender<T> {
    inner: mpsc::Sender<T>,
}

// Derived Clone would require T: Clone.
impl<T> Clone for PayloadSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PayloadSender<T>
where
    T: Send,
{
    pub(crate) fn new(inner: mpsc::Sender<T>) -> Self {
        Self { inner }
    }

    /// Queues a payload for the client, waiting while the channel is full.
    ///
    /// Fails once the session has ended (client gone, timeout); the payload is
    /// dropped in that case.
    pub async fn send(&self, payload: T) -> Result<(), Error> {
        self.inner
            .send(payload)
            .await
            .map_err(|_| Error::new(ErrorKind::SessionEnded))
    }

    /// Resolves when the session stops receiving payloads. Long-running
    /// producers select on this to notice a departed client.
    pub async fn closed(&self) {
        self.inner.closed().await
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for PayloadSender<T>
where
    T: Send + 'static,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<PayloadSender<T>>() {
            Some(sender) => Ok(sender.clone()),
            None => {
                error!(
                    "No event stream bound for payload type {}",
                    std::any::type_name::<T>()
                );
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "No event stream bound for this route",
                ))
            }
        }
    }
}
