/// Every ads-platform operation fails with this one error, carrying the
/// upstream message verbatim. The core never retries platform calls.
#[derive(Clone, Debug, thiserror::Error)]
#[error("platform request failed: {0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_upstream_message() {
        let err = PlatformError::new("(#100) Invalid parameter");
        assert_eq!(err.to_string(), "platform request failed: (#100) Invalid parameter");
    }
}
