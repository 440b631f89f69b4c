//! # Reversible Edits
//!
//! Atomic, invertible changes to a [`PetriNet`].
//!
//! ## Design Principles
//!
//! 1. **Self-contained**: each edit carries the state needed to apply it and
//!    to compute its inverse, so history never consults the live model
//! 2. **Closed set**: add, remove, field change and token-state replacement
//! 3. **Forward first**: callers mutate the net, then record the edit; history
//!    only ever applies inverses (undo) or replays forwards (redo)
//!
//! ## Edit Semantics
//!
//! ### AddComponent / RemoveComponent
//! - Carry the full component and the index it occupies within its kind
//! - Each is the other's inverse, so undo restores z-order exactly
//! - Arcs removed by cascade are recorded as their own `RemoveComponent`
//!   edits, before the connectable they were attached to
//!
//! ### SetField
//! - `from`/`to` pair; the inverse swaps them
//! - Optional values (`None`) mean the map entry is absent
//!
//! ### ReplaceTokens
//! - Before/after snapshots of everything keyed by token identifier

use pipe_net::{Component, ConnectableRef, NetError, PetriNet, Point, TokenState};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One reversible unit of change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Edit {
    /// A component was inserted at `index`
    AddComponent { component: Component, index: usize },

    /// A component was removed from `index`
    RemoveComponent { component: Component, index: usize },

    /// A single field changed
    SetField(FieldChange),

    /// The token set (and everything keyed by it) changed
    ReplaceTokens { before: TokenState, after: TokenState },
}

/// Field-level change with both the old and the new value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldChange {
    Position {
        component: ConnectableRef,
        from: Point,
        to: Point,
    },

    Name {
        component: ConnectableRef,
        from: String,
        to: String,
    },

    Marking {
        place: String,
        token: String,
        from: Option<u32>,
        to: Option<u32>,
    },

    ArcWeight {
        arc: String,
        token: String,
        from: Option<String>,
        to: Option<String>,
    },
}

impl FieldChange {
    pub fn inverse(&self) -> FieldChange {
        match self {
            FieldChange::Position { component, from, to } => FieldChange::Position {
                component: component.clone(),
                from: *to,
                to: *from,
            },
            FieldChange::Name { component, from, to } => FieldChange::Name {
                component: component.clone(),
                from: to.clone(),
                to: from.clone(),
            },
            FieldChange::Marking {
                place,
                token,
                from,
                to,
            } => FieldChange::Marking {
                place: place.clone(),
                token: token.clone(),
                from: *to,
                to: *from,
            },
            FieldChange::ArcWeight {
                arc,
                token,
                from,
                to,
            } => FieldChange::ArcWeight {
                arc: arc.clone(),
                token: token.clone(),
                from: to.clone(),
                to: from.clone(),
            },
        }
    }

    fn apply(&self, net: &mut PetriNet) -> Result<(), NetError> {
        match self {
            FieldChange::Position { component, to, .. } => {
                net.set_position(component, *to)?;
            }
            FieldChange::Name { component, to, .. } => {
                net.set_name(component, to)?;
            }
            FieldChange::Marking {
                place, token, to, ..
            } => {
                net.set_marking(place, token, *to)?;
            }
            FieldChange::ArcWeight { arc, token, to, .. } => {
                net.set_arc_weight(arc, token, to.as_deref())?;
            }
        }
        Ok(())
    }
}

impl Edit {
    /// Apply the forward effect of this edit
    pub fn apply(&self, net: &mut PetriNet) -> Result<(), NetError> {
        match self {
            Edit::AddComponent { component, index } => {
                net.insert_component_at(component.clone(), *index)
            }

            Edit::RemoveComponent { component, .. } => {
                let removal = net.remove_component(&component.component_ref())?;
                if !removal.cascaded.is_empty() {
                    warn!(
                        component = %component.component_ref(),
                        cascaded = removal.cascaded.len(),
                        "replayed removal took incident arcs not recorded in history"
                    );
                }
                Ok(())
            }

            Edit::SetField(change) => change.apply(net),

            Edit::ReplaceTokens { after, .. } => {
                net.restore_token_state(after.clone());
                Ok(())
            }
        }
    }

    /// The edit that undoes this one
    pub fn inverse(&self) -> Edit {
        match self {
            Edit::AddComponent { component, index } => Edit::RemoveComponent {
                component: component.clone(),
                index: *index,
            },
            Edit::RemoveComponent { component, index } => Edit::AddComponent {
                component: component.clone(),
                index: *index,
            },
            Edit::SetField(change) => Edit::SetField(change.inverse()),
            Edit::ReplaceTokens { before, after } => Edit::ReplaceTokens {
                before: after.clone(),
                after: before.clone(),
            },
        }
    }

    /// Get a debug name for this edit
    pub fn name(&self) -> &'static str {
        match self {
            Edit::AddComponent { .. } => "AddComponent",
            Edit::RemoveComponent { .. } => "RemoveComponent",
            Edit::SetField(_) => "SetField",
            Edit::ReplaceTokens { .. } => "ReplaceTokens",
        }
    }
}
