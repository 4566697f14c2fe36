use std::fmt;

use crate::validate::IntegrityIssue;

#[derive(Debug)]
pub enum DataError {
    /// The dataset parsed but failed referential or structural checks.
    Integrity(Vec<IntegrityIssue>),
    Json(serde_json::Error),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Integrity(issues) => {
                write!(f, "dataset failed integrity checks ({} issues)", issues.len())?;
                for issue in issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
            DataError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Json(e) => Some(e),
            DataError::Integrity(_) => None,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(e: serde_json::Error) -> Self {
        DataError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
