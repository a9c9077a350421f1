use relsql_ir::ScalarKind;
use thiserror::Error;

/// Contract violations in a query tree.
///
/// Every variant describes a tree the producer should never have built.
/// Translation stops at the first one and returns no partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("Top-level node must be a projection, found {0}")]
    RootNotProjection(&'static str),

    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    #[error("Variable declared more than once: {0}")]
    DuplicateVariable(String),

    #[error("Column '{column}' is not exposed by '{variable}'")]
    UnknownColumn { variable: String, column: String },

    #[error("Variable '{0}' has no value column to stand for")]
    NoValueColumn(String),

    #[error("Reference to '{0}' is not reachable from the block consuming it")]
    OutOfScope(String),

    #[error("Property access is not rooted at a variable")]
    UnrootedProperty,

    #[error("Invalid join: {0}")]
    InvalidJoin(String),

    #[error("Projection selects no columns")]
    EmptyProjection,

    #[error("Literal does not fit declared kind {kind}: {reason}")]
    LiteralKind { kind: ScalarKind, reason: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
}

impl TranslateError {
    pub(crate) fn literal(kind: ScalarKind, reason: impl Into<String>) -> Self {
        TranslateError::LiteralKind {
            kind,
            reason: reason.into(),
        }
    }
}
