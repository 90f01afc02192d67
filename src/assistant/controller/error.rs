use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub(crate) enum WaiterError {
    #[display("transport error: {message}")]
    Transport { message: String },
    #[display("server responded with status {code}")]
    ServerStatus { code: u16 },
    #[display("invalid response format from {endpoint}: {snippet}")]
    InvalidResponseFormat {
        endpoint: &'static str,
        snippet: String,
    },
    #[display("login reported success but no restaurant session id was issued")]
    AuthIncomplete,
    #[display("{message}")]
    Validation { message: String },
    #[display("server rejected the request: {message}")]
    ServerRejected { message: String },
    #[display("session storage error: {message}")]
    Storage { message: String },
}

impl WaiterError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// transport and server-status failures are the ones a later poll may recover from
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ServerStatus { .. })
    }
}

impl From<reqwest::Error> for WaiterError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::ServerStatus {
                code: status.as_u16(),
            };
        }
        let message = if e.is_timeout() {
            format!("request timed out, {}", e)
        } else if e.is_connect() {
            format!("backend unreachable, {}", e)
        } else {
            e.to_string()
        };
        Self::Transport { message }
    }
}

impl From<serde_json::Error> for WaiterError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for WaiterError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

pub(crate) type WaiterResult<T> = Result<T, WaiterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_diagnostic_text() {
        let err = WaiterError::ServerRejected {
            message: "Invalid waiter code".to_string(),
        };
        assert_eq!(err.to_string(), "server rejected the request: Invalid waiter code");

        let err = WaiterError::InvalidResponseFormat {
            endpoint: "login",
            snippet: "<b>Fatal error</b>".to_string(),
        };
        assert!(err.to_string().contains("<b>Fatal error</b>"));
    }

    #[test]
    fn test_is_transport() {
        assert!(WaiterError::ServerStatus { code: 502 }.is_transport());
        assert!(WaiterError::Transport { message: "reset".to_string() }.is_transport());
        assert!(!WaiterError::AuthIncomplete.is_transport());
        assert!(!WaiterError::validation("waiter code is required").is_transport());
    }
}
