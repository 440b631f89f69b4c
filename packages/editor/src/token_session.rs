//! # Token Editing Session
//!
//! Working copy of a document's token classes, as edited in a token dialog.
//!
//! The session holds the user's input until it is committed. A failed commit
//! leaves the net untouched, keeps the input, and stores a message the dialog
//! shows before letting the user re-enter their changes.

use pipe_net::Token;
use tracing::warn;

use crate::{EditorError, PetriNetController};

pub const PROBLEM_ENCOUNTERED_SAVING_UPDATES: &str =
    "Problem encountered saving updates to tokens.  Changes will be discarded; please re-enter.\n";

#[derive(Debug, Clone, Default)]
pub struct TokenEditSession {
    /// Desired token set, in display order
    tokens: Vec<Token>,

    /// Message from the last failed commit
    error_message: Option<String>,
}

impl TokenEditSession {
    /// Start from the document's current tokens
    pub fn new(controller: &PetriNetController) -> Self {
        Self::from_tokens(controller.net_tokens().cloned().collect())
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            error_message: None,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut Vec<Token> {
        &mut self.tokens
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Drop a token from the working set; returns it if it was present
    pub fn remove(&mut self, id: &str) -> Option<Token> {
        let pos = self.tokens.iter().position(|t| t.id == id)?;
        Some(self.tokens.remove(pos))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Apply the working set to the document as one undoable change.
    ///
    /// On failure the working set is kept for re-entry and
    /// [`TokenEditSession::error_message`] describes what went wrong.
    pub fn commit(&mut self, controller: &mut PetriNetController) -> Result<(), EditorError> {
        match controller.update_or_replace_tokens(self.tokens.clone()) {
            Ok(()) => {
                self.error_message = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "token session commit failed");
                self.error_message = Some(format!(
                    "{}Details: {}",
                    PROBLEM_ENCOUNTERED_SAVING_UPDATES, e
                ));
                Err(e)
            }
        }
    }
}
