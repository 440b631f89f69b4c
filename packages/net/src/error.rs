//! Error types for the net container

use thiserror::Error;

use crate::component::{ComponentKind, ConnectableKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetError {
    #[error("Duplicate {kind} identifier: {id}")]
    DuplicateIdentifier { kind: IdentifierKind, id: String },

    #[error("No {kind} '{id}' in net")]
    ComponentNotFound { kind: ComponentKind, id: String },

    #[error("No {0} token found in current petri net")]
    TokenNotFound(String),

    #[error("Arc '{arc}' would connect {source_kind} to {target_kind}")]
    StructuralViolation {
        arc: String,
        source_kind: ConnectableKind,
        target_kind: ConnectableKind,
    },

    #[error("Arc '{arc}' has no real target yet")]
    UncommittedArc { arc: String },

    #[error("Arc '{arc}' references missing endpoint {endpoint}")]
    DanglingEndpoint { arc: String, endpoint: String },

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Identifier namespaces: one per component kind, plus tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Component(ComponentKind),
    Token,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Component(kind) => kind.fmt(f),
            IdentifierKind::Token => write!(f, "token"),
        }
    }
}

impl NetError {
    pub(crate) fn duplicate(kind: ComponentKind, id: &str) -> Self {
        NetError::DuplicateIdentifier {
            kind: IdentifierKind::Component(kind),
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(kind: ComponentKind, id: &str) -> Self {
        NetError::ComponentNotFound {
            kind,
            id: id.to_string(),
        }
    }
}
