//! Error types for Rotacast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RotacastError>;

#[derive(Error, Debug)]
pub enum RotacastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Exclusion list error: {0}")]
    Exclusions(#[from] ExclusionError),

    #[error("Rotation queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RotacastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RotacastError::InvalidInput(_) => 3,
            RotacastError::Platform(PlatformError::Authentication(_)) => 2,
            RotacastError::Platform(_) => 1,
            RotacastError::Config(_) => 1,
            RotacastError::Catalog(_) => 1,
            RotacastError::Exclusions(_) => 1,
            RotacastError::Queue(_) => 1,
            RotacastError::Render(_) => 1,
            RotacastError::Io(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] csv::Error),

    #[error("Catalog is missing required column: {0}")]
    MissingColumn(String),

    #[error("Catalog is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ExclusionError {
    #[error("Failed to read exclusion file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Invalid exclusion entry on line {line_no}: {text:?}")]
    Parse { line_no: usize, text: String },
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to read queue state: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to persist queue state: {0}")]
    WriteError(std::io::Error),

    #[error("Invalid queue entry on line {line_no}: {text:?}")]
    Parse { line_no: usize, text: String },

    #[error("No eligible items remain: every catalog entry is excluded")]
    NoEligibleItems,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to fetch source asset: {0}")]
    Fetch(String),

    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Failed to encode rendered image: {0}")]
    Encode(String),

    #[error("Render timed out after {0}s")]
    Timeout(u64),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Caption validation failed: {0}")]
    Validation(String),

    #[error("Media upload failed: {0}")]
    Upload(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = RotacastError::InvalidInput("empty caption".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error =
            RotacastError::Platform(PlatformError::Authentication("bad token".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_platform_errors() {
        for platform_error in [
            PlatformError::Upload("boom".to_string()),
            PlatformError::Posting("boom".to_string()),
            PlatformError::Network("boom".to_string()),
            PlatformError::Validation("boom".to_string()),
            PlatformError::RateLimit("boom".to_string()),
            PlatformError::Timeout("boom".to_string()),
        ] {
            assert_eq!(RotacastError::Platform(platform_error).exit_code(), 1);
        }
    }

    #[test]
    fn test_exit_code_fatal_run_errors() {
        assert_eq!(RotacastError::Queue(QueueError::NoEligibleItems).exit_code(), 1);
        assert_eq!(
            RotacastError::Render(RenderError::Fetch("404".to_string())).exit_code(),
            1
        );
        assert_eq!(
            RotacastError::Catalog(CatalogError::MissingColumn("title".to_string())).exit_code(),
            1
        );
    }

    #[test]
    fn test_error_message_formatting() {
        let error = RotacastError::Queue(QueueError::NoEligibleItems);
        assert_eq!(
            format!("{}", error),
            "Rotation queue error: No eligible items remain: every catalog entry is excluded"
        );

        let error = RotacastError::Exclusions(ExclusionError::Parse {
            line_no: 3,
            text: "abc".to_string(),
        });
        let message = format!("{}", error);
        assert!(message.contains("line 3"));
        assert!(message.contains("abc"));
    }

    #[test]
    fn test_error_conversion_from_queue_error() {
        let error: RotacastError = QueueError::NoEligibleItems.into();
        assert!(matches!(error, RotacastError::Queue(_)));
    }

    #[test]
    fn test_error_conversion_from_platform_error() {
        let error: RotacastError = PlatformError::Posting("nope".to_string()).into();
        assert!(matches!(error, RotacastError::Platform(_)));
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Network("connection refused".to_string());
        let cloned = original.clone();
        assert_eq!(format!("{}", original), format!("{}", cloned));
    }
}
