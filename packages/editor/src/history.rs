//! # History Manager
//!
//! Groups edits into transactions and undoes/redoes whole transactions.
//!
//! ## Design
//!
//! - The caller applies an edit's forward effect, then records it
//! - `new_edit` seals the open transaction and opens a fresh one
//! - `add_edit` appends to the open transaction, opening one if needed
//! - Undo applies inverses in reverse order and moves the transaction to the
//!   redo stack; redo replays forwards in order and moves it back
//! - Opening a transaction clears the redo stack (linear history)
//! - Empty transactions are never recorded
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryManager::new();
//!
//! // Delete two places as one user action
//! history.new_edit();
//! for place in ["P0", "P1"] {
//!     let removal = net.remove_component(&ComponentRef::place(place))?;
//!     history.add_edit(Edit::RemoveComponent { component: removal.component, index: removal.index });
//! }
//! history.seal();
//!
//! // Both come back
//! history.undo(&mut net)?;
//! ```

use pipe_net::{NetError, PetriNet};
use tracing::{debug, warn};

use crate::edits::Edit;

/// Edits undone/redone as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    /// The edits in this transaction (in application order)
    pub edits: Vec<Edit>,

    /// Optional description of this transaction
    pub description: Option<String>,
}

impl Transaction {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Undo/redo history for one document
#[derive(Debug)]
pub struct HistoryManager {
    /// Sealed transactions (most recent last)
    undo_stack: Vec<Transaction>,

    /// Undone transactions (most recent last)
    redo_stack: Vec<Transaction>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Transaction currently accumulating edits
    open: Option<Transaction>,
}

impl HistoryManager {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create a history with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            open: None,
        }
    }

    /// Seal any open transaction and open a fresh one
    pub fn new_edit(&mut self) {
        self.seal();
        self.open = Some(Transaction::default());
        self.redo_stack.clear();
    }

    /// Append an edit to the open transaction, opening one if none is open.
    ///
    /// The edit's forward effect must already be applied to the net.
    pub fn add_edit(&mut self, edit: Edit) {
        if self.open.is_none() {
            self.new_edit();
        }
        if let Some(transaction) = &mut self.open {
            debug!(edit = edit.name(), "record edit");
            transaction.edits.push(edit);
        }
    }

    /// `new_edit` followed by `add_edit`
    pub fn add_new_edit(&mut self, edit: Edit) {
        self.new_edit();
        self.add_edit(edit);
    }

    /// Set description for the open transaction (if any)
    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(transaction) = &mut self.open {
            transaction.description = Some(description.into());
        }
    }

    /// Close the open transaction and push it onto the undo stack
    pub fn seal(&mut self) {
        if let Some(transaction) = self.open.take() {
            if !transaction.is_empty() {
                self.push_transaction(transaction);
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn push_transaction(&mut self, transaction: Transaction) {
        self.undo_stack.push(transaction);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent transaction.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. If an inverse fails
    /// part way, the edits already inverted are replayed, the transaction stays
    /// on the undo stack, and the error is returned.
    pub fn undo(&mut self, net: &mut PetriNet) -> Result<bool, NetError> {
        self.seal();
        let Some(transaction) = self.undo_stack.pop() else {
            return Ok(false);
        };

        for (i, edit) in transaction.edits.iter().enumerate().rev() {
            if let Err(e) = edit.inverse().apply(net) {
                warn!(error = %e, edit = edit.name(), "undo failed, rolling back");
                for done in &transaction.edits[i + 1..] {
                    if let Err(e) = done.apply(net) {
                        warn!(error = %e, "rollback of partial undo failed");
                    }
                }
                self.undo_stack.push(transaction);
                return Err(e);
            }
        }

        debug!(
            description = transaction.description.as_deref().unwrap_or(""),
            edits = transaction.edits.len(),
            "undo"
        );
        self.redo_stack.push(transaction);
        net.notify_observers();
        Ok(true)
    }

    /// Redo the most recently undone transaction.
    ///
    /// Returns `Ok(false)` when there is nothing to redo; failures are rolled
    /// back like [`HistoryManager::undo`].
    pub fn redo(&mut self, net: &mut PetriNet) -> Result<bool, NetError> {
        let Some(transaction) = self.redo_stack.pop() else {
            return Ok(false);
        };

        for (i, edit) in transaction.edits.iter().enumerate() {
            if let Err(e) = edit.apply(net) {
                warn!(error = %e, edit = edit.name(), "redo failed, rolling back");
                for done in transaction.edits[..i].iter().rev() {
                    if let Err(e) = done.inverse().apply(net) {
                        warn!(error = %e, "rollback of partial redo failed");
                    }
                }
                self.redo_stack.push(transaction);
                return Err(e);
            }
        }

        debug!(
            description = transaction.description.as_deref().unwrap_or(""),
            edits = transaction.edits.len(),
            "redo"
        );
        self.push_transaction(transaction);
        net.notify_observers();
        Ok(true)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_levels() > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of transactions undo can revert, counting a non-empty open one
    pub fn undo_levels(&self) -> usize {
        let open = self.open.as_ref().map_or(0, |t| usize::from(!t.is_empty()));
        self.undo_stack.len() + open
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open = None;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.open
            .as_ref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.undo_stack.last())
            .and_then(|t| t.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|t| t.description.as_deref())
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edits::FieldChange;
    use pipe_net::{ConnectableRef, Place, Point};

    fn net_with_place() -> PetriNet {
        let mut net = PetriNet::new();
        net.add_component(Place::new("P0", Point::new(0.0, 0.0))).unwrap();
        net
    }

    /// Move P0 and record the change
    fn move_place(net: &mut PetriNet, history: &mut HistoryManager, to: Point) {
        let component = ConnectableRef::place("P0");
        let from = net.set_position(&component, to).unwrap();
        history.add_edit(Edit::SetField(FieldChange::Position { component, from, to }));
    }

    #[test]
    fn test_history_creation() {
        let history = HistoryManager::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_and_redo_on_empty_stacks_are_noops() {
        let mut net = net_with_place();
        let mut history = HistoryManager::new();
        assert!(!history.undo(&mut net).unwrap());
        assert!(!history.redo(&mut net).unwrap());
        assert_eq!(net.version(), 0);
    }

    #[test]
    fn test_transaction_undone_as_one_unit() {
        let mut net = net_with_place();
        let mut history = HistoryManager::new();

        history.new_edit();
        history.set_description("Drag");
        move_place(&mut net, &mut history, Point::new(10.0, 0.0));
        move_place(&mut net, &mut history, Point::new(20.0, 5.0));
        history.seal();

        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description(), Some("Drag"));

        assert!(history.undo(&mut net).unwrap());
        assert_eq!(net.place("P0").unwrap().position, Point::new(0.0, 0.0));
        assert_eq!(history.redo_description(), Some("Drag"));

        assert!(history.redo(&mut net).unwrap());
        assert_eq!(net.place("P0").unwrap().position, Point::new(20.0, 5.0));
    }

    #[test]
    fn test_add_edit_auto_opens_transaction() {
        let mut net = net_with_place();
        let mut history = HistoryManager::new();

        move_place(&mut net, &mut history, Point::new(1.0, 1.0));
        assert!(history.is_open());
        // Open, non-empty transaction already counts
        assert_eq!(history.undo_levels(), 1);

        assert!(history.undo(&mut net).unwrap());
        assert!(!history.is_open());
        assert_eq!(net.place("P0").unwrap().position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_new_transaction_clears_redo() {
        let mut net = net_with_place();
        let mut history = HistoryManager::new();

        history.new_edit();
        move_place(&mut net, &mut history, Point::new(1.0, 1.0));
        history.undo(&mut net).unwrap();
        assert_eq!(history.redo_levels(), 1);

        history.new_edit();
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_empty_transactions_not_recorded() {
        let mut history = HistoryManager::new();
        history.new_edit();
        history.new_edit();
        history.seal();
        assert_eq!(history.undo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut net = net_with_place();
        let mut history = HistoryManager::with_max_levels(2);

        for i in 0..3 {
            history.new_edit();
            move_place(&mut net, &mut history, Point::new(i as f64, 0.0));
        }
        history.seal();

        // Should only keep 2 (max levels)
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_failed_undo_keeps_transaction() {
        let mut net = net_with_place();
        let mut history = HistoryManager::new();

        history.new_edit();
        move_place(&mut net, &mut history, Point::new(5.0, 5.0));
        history.seal();

        // Remove the place behind history's back
        net.remove_component(&pipe_net::ComponentRef::place("P0"))
            .unwrap();

        assert!(history.undo(&mut net).is_err());
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_undo_notifies_once_per_transaction() {
        let mut net = net_with_place();
        let mut history = HistoryManager::new();

        history.new_edit();
        move_place(&mut net, &mut history, Point::new(1.0, 0.0));
        move_place(&mut net, &mut history, Point::new(2.0, 0.0));
        move_place(&mut net, &mut history, Point::new(3.0, 0.0));

        let before = net.version();
        history.undo(&mut net).unwrap();
        assert_eq!(net.version(), before + 1);
    }
}
