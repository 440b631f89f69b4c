//! # PIPE Net
//!
//! In-memory document model for Petri nets: places, transitions, arcs and
//! token classes, owned by a single [`PetriNet`] container.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ editor: controller, history, arc drafting    │
//! └──────────────────────────────────────────────┘
//!                     ↓ mutate
//! ┌──────────────────────────────────────────────┐
//! │ net: PetriNet container                      │
//! │  - arena per kind, insertion ordered         │
//! │  - identifier uniqueness, arc kind rules     │
//! │  - cascade removal of incident arcs          │
//! │  - atomic token set replacement              │
//! └──────────────────────────────────────────────┘
//!                     ↓ notify
//! ┌──────────────────────────────────────────────┐
//! │ observers (renderers) re-read the views      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The container is single-writer. Callers that share it across threads must
//! serialize every mutating call themselves.

mod component;
mod error;
mod geometry;
mod net;
mod token;

pub use component::{
    Arc, ArcTarget, Component, ComponentKind, ComponentRef, Connectable, ConnectableKind,
    ConnectableRef, Place, Positioned, Transition, DEFAULT_PLACE_SIZE, DEFAULT_TRANSITION_SIZE,
};
pub use error::{IdentifierKind, NetError};
pub use geometry::{Point, Rect};
pub use net::{NetObserver, ObserverId, PetriNet, Removal, RemovedArc};
pub use token::{Color, Token, TokenAttributes, TokenState};
