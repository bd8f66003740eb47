use serde::Serialize;
use thiserror::Error;

use crate::types::Piece;

/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Errors that end an optimization run. None of them are retried.
#[derive(Debug, Clone, Error)]
pub enum OptimizeError {
    /// One or more pieces fit an empty slab in neither orientation.
    #[error(
        "some pieces are too large to fit on any slab, even after splitting: {}",
        labels(.pieces)
    )]
    Unplaceable { pieces: Vec<Piece> },

    /// No complete layout was found within the slab limit.
    #[error(
        "no layout fits within {max_slabs} slab(s); raise the slab limit or enable splitting"
    )]
    Infeasible { max_slabs: usize },

    /// A solver failed unexpectedly.
    #[error("an error occurred during optimization: {0}")]
    Computation(String),

    /// The configuration or piece list is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

fn labels(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| p.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unplaceable,
    Infeasible,
    Computation,
    InvalidInput,
}

impl OptimizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unplaceable { .. } => ErrorKind::Unplaceable,
            Self::Infeasible { .. } => ErrorKind::Infeasible,
            Self::Computation(_) => ErrorKind::Computation,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// The offending pieces, if the error names any.
    pub fn pieces(&self) -> &[Piece] {
        match self {
            Self::Unplaceable { pieces } => pieces,
            _ => &[],
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            pieces: self.pieces().to_vec(),
        }
    }
}

/// Serializable form of an [`OptimizeError`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub pieces: Vec<Piece>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unplaceable_message_lists_labels() {
        let err = OptimizeError::Unplaceable {
            pieces: vec![
                Piece::new("1", 200.0, 200.0, 0.0, "Island"),
                Piece::new("2", 300.0, 150.0, 0.0, "Bar"),
            ],
        };
        assert_eq!(err.kind(), ErrorKind::Unplaceable);
        assert_eq!(err.pieces().len(), 2);
        assert!(err.to_string().ends_with("Island, Bar"));
    }

    #[test]
    fn test_infeasible_has_remediation_hint() {
        let err = OptimizeError::Infeasible { max_slabs: 1 };
        let report = err.report();
        assert_eq!(report.kind, ErrorKind::Infeasible);
        assert!(report.message.contains("raise the slab limit"));
        assert!(report.pieces.is_empty());
    }
}
