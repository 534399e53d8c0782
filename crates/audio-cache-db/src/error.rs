//! Error types for the cache metadata store

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Database(Box<sqlx::Error>),
    /// An entry already exists for this key; the caller's dedup protocol is broken
    DuplicateKey(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "Database error: {}", err),
            StoreError::DuplicateKey(key) => {
                write!(f, "Duplicate cache key: {}", key)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err.as_ref()),
            StoreError::DuplicateKey(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_display() {
        let err = StoreError::DuplicateKey("abc123".to_string());
        assert_eq!(format!("{}", err), "Duplicate cache key: abc123");
    }

    #[test]
    fn test_database_error_has_source() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(format!("{}", err).starts_with("Database error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
