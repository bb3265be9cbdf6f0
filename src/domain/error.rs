use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please enter at least one Bandcamp album URL.")]
    MissingUrl,

    #[error("Please select a download directory.")]
    MissingPath,

    #[error("failed to start yt-dlp: {0}")]
    Spawn(String),

    /// Message reported by the extractor, kept verbatim.
    #[error("{0}")]
    Extractor(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_message_is_verbatim() {
        let err = AppError::Extractor("Unsupported URL: https://example.com".to_string());
        assert_eq!(err.to_string(), "Unsupported URL: https://example.com");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            AppError::MissingUrl.to_string(),
            "Please enter at least one Bandcamp album URL."
        );
        assert_eq!(
            AppError::MissingPath.to_string(),
            "Please select a download directory."
        );
    }
}
