//! # PIPE Editor
//!
//! Structural editing core for Petri net documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI collaborators: canvas, dialogs, menus    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: PetriNetController                  │
//! │  - numbering, selection, bulk translation   │
//! │  - deletion and token edits with history    │
//! │  - two-phase arc construction               │
//! │  - undo/redo of whole transactions          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ net: PetriNet container + observers         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Net is source of truth**: renderers re-read it when notified
//! 2. **Closed edit set**: every change is an [`Edit`] that knows its inverse
//! 3. **Whole transactions**: undo/redo never splits a user action
//! 4. **Drafts stay out of history**: an arc being drawn is in the net but
//!    only reaches history once it is committed
//! 5. **One writer**: a controller is driven from a single thread
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pipe_editor::PetriNetController;
//! use pipe_net::PetriNet;
//!
//! let mut controller = PetriNetController::new(PetriNet::new());
//!
//! let place = controller.create_place(0.0, 0.0)?;
//! let transition = controller.create_transition(100.0, 0.0)?;
//!
//! // Draw an arc
//! controller.start_creating_arc(place)?;
//! controller.add_arc_point(60.0, 10.0)?;
//! if controller.is_applicable_end_point(&transition) {
//!     controller.finish_creating_arc(transition)?;
//! }
//!
//! controller.undo()?;
//! ```

mod arc_construction;
mod config;
mod controller;
mod edits;
mod errors;
mod history;
mod token_session;

pub use arc_construction::{arc_id, ArcConstruction, ArcDraftState};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use controller::PetriNetController;
pub use edits::{Edit, FieldChange};
pub use errors::EditorError;
pub use history::{HistoryManager, Transaction};
pub use token_session::{TokenEditSession, PROBLEM_ENCOUNTERED_SAVING_UPDATES};

// Re-export model types for convenience
pub use pipe_net;
