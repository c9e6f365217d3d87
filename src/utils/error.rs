use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Service responded with status {status}: {message}")]
    ServiceError { status: u16, message: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Notification failed: {message}")]
    NotificationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Validation,
    NotFound,
    Authentication,
    Storage,
    Configuration,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        StoreError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::HttpError(_) | StoreError::ServiceError { .. } => ErrorCategory::Network,
            StoreError::StorageError(_) | StoreError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            StoreError::ConfigError { .. }
            | StoreError::ConfigValidationError { .. }
            | StoreError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            StoreError::ValidationError { .. } => ErrorCategory::Validation,
            StoreError::NotFound { .. } => ErrorCategory::NotFound,
            StoreError::Unauthenticated => ErrorCategory::Authentication,
            StoreError::NotificationError { .. } => ErrorCategory::Notification,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Notification => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::NotFound | ErrorCategory::Authentication => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            StoreError::HttpError(_) => "Could not reach the store service".to_string(),
            StoreError::ServiceError { status, .. } => {
                format!("The store service rejected the request (HTTP {})", status)
            }
            StoreError::StorageError(_) | StoreError::SerializationError(_) => {
                "The local cart could not be read or saved".to_string()
            }
            StoreError::ConfigError { .. }
            | StoreError::ConfigValidationError { .. }
            | StoreError::InvalidConfigValueError { .. } => format!("Invalid configuration: {}", self),
            StoreError::ValidationError { message } => message.clone(),
            StoreError::NotFound { resource, id } => format!("No {} with id {}", resource, id),
            StoreError::Unauthenticated => "You need to log in first".to_string(),
            StoreError::NotificationError { .. } => {
                "The customer notification could not be sent".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the store service is running and base_url is correct",
            ErrorCategory::Storage => "Check permissions on the cart storage path or delete the cart file",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::Validation => "Correct the input and try again",
            ErrorCategory::NotFound => "Run `storefront products` or `storefront orders list` to see valid ids",
            ErrorCategory::Authentication => "Run `storefront login` or pass --username/--password",
            ErrorCategory::Notification => "The order status was still updated; notify the customer manually",
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        let err = StoreError::ServiceError {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        assert_eq!(
            StoreError::not_found("order", 7).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StoreError::validation("quantity must be at least 1").category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_user_friendly_message() {
        let err = StoreError::not_found("product", "a");
        assert_eq!(err.user_friendly_message(), "No product with id a");
        assert_eq!(
            StoreError::Unauthenticated.severity(),
            ErrorSeverity::High
        );
    }
}
