// Errors raised while shaping triplestore payloads or talking to an endpoint

use std::fmt;

/// The payload returned by a triplestore matches neither the SPARQL JSON results
/// format nor the QLever columnar format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The document is not a JSON object or lacks `head`/`results`.
    Malformed(String),
    /// QLever `selected` is missing or not an array.
    SelectedNotArray,
    /// QLever `res` is present but not an array.
    RowsNotArray,
    /// A QLever row is not an array.
    RowNotArray { row: usize },
    /// A QLever row has a different number of cells than `selected`.
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShapeError::Malformed(reason) => {
                write!(f, "Invalid SPARQL results document: {}", reason)
            }
            ShapeError::SelectedNotArray => {
                write!(f, "Invalid QLever results: 'selected' must be an array")
            }
            ShapeError::RowsNotArray => {
                write!(f, "Invalid QLever results: 'res' must be an array")
            }
            ShapeError::RowNotArray { row } => {
                write!(f, "Invalid row at index {}: each row in 'res' must be an array", row)
            }
            ShapeError::ArityMismatch {
                row,
                expected,
                found,
            } => write!(
                f,
                "Mismatched entry length at index {}: expected {}, got {}",
                row, expected, found
            ),
        }
    }
}

impl std::error::Error for ShapeError {}

/// The triplestore answered with an unsuccessful HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Triplestore request failed ({}): {}", self.status, self.message)
    }
}

impl std::error::Error for RequestError {}
