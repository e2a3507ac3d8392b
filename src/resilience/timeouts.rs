//! Timeout enforcement.
//!
//! Every outbound call runs under a deadline. A call that misses it is
//! dropped and reported as `Timeout`. Inbound requests get a second, wider
//! deadline covering all retries.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::time::Duration;

use crate::error::{classify, ApiError, ErrorKind, FailureOrigin, RawFailure};

/// Run `future` under `deadline`, converting expiry into a classified timeout.
pub async fn with_deadline<T, F>(deadline: Duration, endpoint: &str, future: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(endpoint = %endpoint, deadline_ms = deadline.as_millis() as u64, "Upstream call timed out");
            Err(classify(
                &RawFailure::Transport {
                    message: format!("no response within {}ms", deadline.as_millis()),
                    timed_out: true,
                },
                endpoint,
            ))
        }
    }
}

/// Whole-request deadline. Expiry answers 504 with the usual error envelope.
pub async fn request_deadline_middleware(
    State(deadline): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, deadline_ms = deadline.as_millis() as u64, "Request deadline exceeded");
            ApiError::new(ErrorKind::Timeout, FailureOrigin::Gateway, "gateway").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_timeout() {
        let result: Result<(), ApiError> = with_deadline(Duration::from_secs(30), "crm", async {
            tokio::time::sleep(Duration::from_secs(31)).await;
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let result = with_deadline(Duration::from_secs(30), "crm", async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
