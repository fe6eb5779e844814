use super::super::storage::StorageError;
use shared::error::ErrorCode;
use shared::membership::{CommandError, DomainError};
use thiserror::Error;

/// Manager errors
///
/// Business-rule violations keep their [`DomainError`] identity all the way
/// to the response; infrastructure failures collapse into a handful of
/// storage codes.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Map a storage failure onto a stable error code
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    if let StorageError::Serialization(_) = e {
        return ErrorCode::SerializationError;
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    ErrorCode::StorageError
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                CommandError::new(code, e.to_string())
            }
            ManagerError::Domain(e) => CommandError::new(e.error_code(), e.to_string()),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_keeps_its_code() {
        let err = ManagerError::Domain(DomainError::ApplicationNotFound(42));
        let command_error = CommandError::from(err);
        assert_eq!(command_error.code, ErrorCode::ApplicationNotFound);
        assert!(command_error.message.contains("42"));
    }

    #[test]
    fn test_serialization_error_classification() {
        let json_err = serde_json::from_str::<u64>("not a number").unwrap_err();
        let err = ManagerError::Storage(StorageError::Serialization(json_err));
        let command_error = CommandError::from(err);
        assert_eq!(command_error.code, ErrorCode::SerializationError);
    }
}
