//! Handler outcomes.

use http::{Response, StatusCode};

/// Result returned by a request handler.
pub type HandlerResult<B> = Result<Response<B>, HandlerError<B>>;

/// Error type for handler execution.
///
/// `Abort` carries a fully formed response (a 404 page, a redirect) that
/// should still be sent to the client. `Fault` is an unexpected failure with
/// no response attached.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError<B> {
    #[error("Request aborted with status {}", .0.status())]
    Abort(Response<B>),

    #[error("Handler fault: {0}")]
    Fault(#[from] anyhow::Error),
}

impl<B> HandlerError<B> {
    /// Abort with the given response.
    pub fn abort(response: Response<B>) -> Self {
        Self::Abort(response)
    }

    /// Abort with an empty-bodied response of the given status.
    pub fn status(status: StatusCode) -> Self
    where
        B: Default,
    {
        let mut response = Response::new(B::default());
        *response.status_mut() = status;
        Self::Abort(response)
    }

    /// Whether this error carries a response.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_builds_abort() {
        let err: HandlerError<String> = HandlerError::status(StatusCode::NOT_FOUND);

        assert!(err.is_abort());
        match err {
            HandlerError::Abort(resp) => {
                assert_eq!(resp.status(), StatusCode::NOT_FOUND);
                assert!(resp.body().is_empty());
            }
            HandlerError::Fault(_) => panic!("expected abort"),
        }
    }

    #[test]
    fn test_fault_from_anyhow() {
        let err: HandlerError<String> = anyhow::anyhow!("database unavailable").into();

        assert!(!err.is_abort());
        assert_eq!(err.to_string(), "Handler fault: database unavailable");
    }

    #[test]
    fn test_abort_display() {
        let err: HandlerError<String> = HandlerError::status(StatusCode::GONE);
        assert_eq!(err.to_string(), "Request aborted with status 410 Gone");
    }
}
