// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Error Types
//!
//! Failure taxonomy for the data layer. Every fallible data-plane API
//! returns [`DataResult`], so callers can tell "no record" (`Ok(None)`)
//! apart from "the tier is broken" (`Err`). Transport faults on bike reads
//! are recovered inside the repositories (offline tolerance) and never
//! reach the caller; everywhere else they surface as [`DataError::Transport`].

use thiserror::Error;

/// Result alias used across the data layer
pub type DataResult<T> = Result<T, DataError>;

/// Errors surfaced by the store, gateway and repository layers
#[derive(Debug, Error)]
pub enum DataError {
    /// The on-device store failed (I/O, locking, schema). Distinct from a
    /// lookup miss, which is `Ok(None)`.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    /// The backend could not be reached or answered with a protocol fault
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend refused the login or omitted the access token
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// A remote payload was structurally valid JSON but unusable
    #[error("invalid remote payload: {0}")]
    InvalidPayload(String),

    /// A stored record could not be decoded back into its domain type
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Password hashing or verification failed
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Corrupt(err.to_string())
    }
}

impl From<chrono::ParseError> for DataError {
    fn from(err: chrono::ParseError) -> Self {
        DataError::Corrupt(err.to_string())
    }
}

impl From<uuid::Error> for DataError {
    fn from(err: uuid::Error) -> Self {
        DataError::Corrupt(err.to_string())
    }
}

impl DataError {
    /// True for errors the bike read paths are allowed to absorb
    pub fn is_transport(&self) -> bool {
        matches!(self, DataError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DataError = parse_err.into();
        assert!(matches!(err, DataError::Corrupt(_)));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_login_rejected_display() {
        let err = DataError::LoginRejected("status 401".to_string());
        assert_eq!(err.to_string(), "login rejected: status 401");
    }
}
