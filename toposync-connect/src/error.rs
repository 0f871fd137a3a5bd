//! Error types for toposync-connect.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// All errors that can arise from REST calls and credential loading.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The credential file could not be read or held no usable token.
    /// Raised before any network traffic.
    #[error("cannot read credential file {path}: {source}")]
    Credential {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request did not complete within the agent timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The server answered with an unexpected HTTP status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The request failed before an HTTP status was received.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("unexpected response payload from {url}: {source}")]
    Payload {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Classify a failed `ureq` call.
///
/// Timeouts surface inside the transport error's source chain as I/O errors
/// and become the distinct [`ConnectError::Timeout`] class.
pub(crate) fn from_ureq(url: &str, err: ureq::Error, timeout: Duration) -> ConnectError {
    match err {
        ureq::Error::Status(status, _) => ConnectError::Status {
            url: url.to_owned(),
            status,
        },
        transport => {
            if is_timeout(&transport) {
                ConnectError::Timeout {
                    url: url.to_owned(),
                    timeout,
                }
            } else {
                ConnectError::Transport {
                    url: url.to_owned(),
                    source: Box::new(transport),
                }
            }
        }
    }
}

fn is_timeout(err: &ureq::Error) -> bool {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = cause {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        cause = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_the_code() {
        let err = from_ureq(
            "https://example.org/x",
            ureq::Error::Status(422, ureq::Response::new(422, "Unprocessable Entity", "").unwrap()),
            Duration::from_secs(30),
        );
        match err {
            ConnectError::Status { url, status } => {
                assert_eq!(url, "https://example.org/x");
                assert_eq!(status, 422);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn credential_error_names_the_path() {
        let err = ConnectError::Credential {
            path: PathBuf::from("/run/secrets/token"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/run/secrets/token"));
    }
}
