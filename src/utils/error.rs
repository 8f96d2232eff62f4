use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("No status table matched on page {url}")]
    TableNotFound { url: String },

    #[error("Invalid mail address '{address}': {source}")]
    AddressError {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build mail message: {0}")]
    MessageError(#[from] lettre::error::Error),

    #[error("SMTP transport failed: {0}")]
    TransportError(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Delivery,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NotifyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NotifyError::HttpError(_) | NotifyError::HttpStatusError { .. } => ErrorCategory::Network,
            NotifyError::ConfigValidationError { .. }
            | NotifyError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            NotifyError::CsvError(_)
            | NotifyError::SerializationError(_)
            | NotifyError::TableNotFound { .. } => ErrorCategory::Data,
            NotifyError::AddressError { .. }
            | NotifyError::MessageError(_)
            | NotifyError::TransportError(_) => ErrorCategory::Delivery,
            NotifyError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            NotifyError::HttpError(_) | NotifyError::HttpStatusError { .. } => {
                "Check network connectivity and the source.url setting; the cached table is used meanwhile"
            }
            NotifyError::TableNotFound { .. } => {
                "The page layout may have changed; review the [[table.matchers]] rules"
            }
            NotifyError::ConfigValidationError { .. }
            | NotifyError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and run again"
            }
            NotifyError::CsvError(_) => "Make sure the recipients file is plain CSV with one address per row",
            NotifyError::SerializationError(_) => "Delete the cache file; it will be rebuilt on the next fetch",
            NotifyError::AddressError { .. } => "Check the sender and recipient addresses",
            NotifyError::MessageError(_) | NotifyError::TransportError(_) => {
                "Verify the SMTP host, port and credentials"
            }
            NotifyError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch the status page: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Could not read status data: {}", self),
            ErrorCategory::Delivery => format!("Could not send the report: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_high_severity() {
        let err = NotifyError::ConfigValidationError {
            field: "mail.host".to_string(),
            message: "must not be empty".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("mail.host"));
    }

    #[test]
    fn test_table_not_found_is_low_severity() {
        let err = NotifyError::TableNotFound {
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().starts_with("Could not read status data"));
    }
}
