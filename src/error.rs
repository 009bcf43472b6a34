//! Error accumulation and fatal error types.
//!
//! Loading several files produces many independent problems. They are
//! collected into an [`ErrorList`] so the caller sees every problem in one
//! report instead of only the first.

use std::fmt;
use thiserror::Error;

/// Accumulates free-form diagnostics during a multi-file pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<String>);

impl ErrorList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append one diagnostic.
    pub fn add(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Append every diagnostic from another list, keeping order.
    pub fn extend(&mut self, other: ErrorList) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Finalize the list: `None` when nothing was recorded.
    pub fn into_error(self) -> Option<ConfigError> {
        if self.is_empty() {
            None
        } else {
            Some(ConfigError::Diagnostics(self))
        }
    }

    /// Finalize the list as a `Result`.
    pub fn into_result(self) -> Result<(), ConfigError> {
        match self.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "{}", only),
            many => {
                write!(f, "multiple errors")?;
                for (i, message) in many.iter().enumerate() {
                    write!(f, "\n(#{}) {}", i + 1, message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorList {}

impl From<Vec<String>> for ErrorList {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

/// Errors returned by configuration loading.
///
/// `UnknownIdField`, `DuplicateField` and `SchemaLoad` are structural and abort
/// the call immediately. `Diagnostics` carries the recoverable problems found
/// during a completed pass.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("identifier field {0} is not declared in the schema")]
    UnknownIdField(String),

    #[error("schema declares field {0} more than once")]
    DuplicateField(String),

    #[error("loading schema {path}: {reason}")]
    SchemaLoad { path: String, reason: String },

    #[error("{0}")]
    Diagnostics(ErrorList),
}

impl ConfigError {
    /// The accumulated diagnostics, if this is a recoverable error.
    pub fn diagnostics(&self) -> Option<&ErrorList> {
        match self {
            ConfigError::Diagnostics(list) => Some(list),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_is_no_error() {
        let errors = ErrorList::new();
        assert!(errors.into_error().is_none());
    }

    #[test]
    fn test_single_error_verbatim() {
        let mut errors = ErrorList::new();
        errors.add("invalid, no such file [a.json]");
        let err = errors.into_error().unwrap();
        assert_eq!(err.to_string(), "invalid, no such file [a.json]");
    }

    #[test]
    fn test_multiple_errors_numbered() {
        let mut errors = ErrorList::new();
        errors.add("first");
        errors.add("second");
        errors.add("first");
        let err = errors.into_error().unwrap();
        assert_eq!(
            err.to_string(),
            "multiple errors\n(#1) first\n(#2) second\n(#3) first"
        );
        assert_eq!(err.diagnostics().unwrap().len(), 3);
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut a = ErrorList::from(vec!["a".to_string()]);
        let b = ErrorList::from(vec!["b".to_string(), "c".to_string()]);
        a.extend(b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_structural_errors_have_no_diagnostics() {
        let err = ConfigError::UnknownIdField("Name".to_string());
        assert!(err.diagnostics().is_none());
        assert_eq!(
            err.to_string(),
            "identifier field Name is not declared in the schema"
        );
    }
}
