//! Error types for the editor

use pipe_net::NetError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Net error: {0}")]
    Net(#[from] NetError),

    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Token update failed: {0}")]
    BulkUpdateFailure(String),
}

impl EditorError {
    pub(crate) fn invalid(operation: &'static str, state: &'static str) -> Self {
        EditorError::InvalidTransition { operation, state }
    }
}
