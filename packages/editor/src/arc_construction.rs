//! # Arc Construction
//!
//! Two-phase protocol for drawing a new arc.
//!
//! ```text
//!          start(source)             finish(target)
//!   Idle ───────────────▶ Drafting ─────────────────▶ Idle (arc committed)
//!                           │  ▲
//!                add_point  └──┘
//!                           │
//!                           └────── cancel ─────────▶ Idle (no trace)
//! ```
//!
//! The draft arc is inserted into the net as soon as drafting starts so
//! renderers draw it through the normal observer path, but it only enters
//! history on `finish`. Cancelling removes it from the net, leaving neither
//! the model nor the undo stack changed.

use pipe_net::{Arc, ComponentRef, ConnectableRef, NetError, PetriNet, Point};
use tracing::{debug, info};

use crate::edits::Edit;
use crate::history::HistoryManager;
use crate::EditorError;

/// Stands in for the target identifier while the arc is a draft
const DRAFT_TARGET: &str = "<draft>";

/// Where the arc-drawing protocol currently is
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArcDraftState {
    #[default]
    Idle,
    Drafting {
        /// Identifier of the draft arc in the net
        arc_id: String,
        source: ConnectableRef,
    },
}

impl ArcDraftState {
    fn label(&self) -> &'static str {
        match self {
            ArcDraftState::Idle => "idle",
            ArcDraftState::Drafting { .. } => "drafting an arc",
        }
    }
}

/// Identifier a committed arc gets from its endpoints
pub fn arc_id(source: &ConnectableRef, target: &ConnectableRef) -> String {
    format!("{} TO {}", source.id, target.id)
}

#[derive(Debug, Default)]
pub struct ArcConstruction {
    state: ArcDraftState,
}

impl ArcConstruction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ArcDraftState {
        &self.state
    }

    pub fn is_drafting(&self) -> bool {
        matches!(self.state, ArcDraftState::Drafting { .. })
    }

    /// Begin drawing an arc from `source`.
    ///
    /// The draft's free end starts at the source's own position.
    pub fn start(&mut self, net: &mut PetriNet, source: ConnectableRef) -> Result<(), EditorError> {
        if self.is_drafting() {
            return Err(EditorError::invalid("start creating an arc", self.state.label()));
        }

        let origin = net
            .connectable(&source)
            .map(|c| c.position())
            .ok_or_else(|| NetError::ComponentNotFound {
                kind: source.kind.into(),
                id: source.id.clone(),
            })?;

        let arc_id = format!("{} TO {}", source.id, DRAFT_TARGET);
        net.insert_draft(Arc::draft(arc_id.clone(), source.clone(), origin))?;
        net.notify_observers();

        debug!(source = %source, "start drafting arc");
        self.state = ArcDraftState::Drafting { arc_id, source };
        Ok(())
    }

    /// Move the draft's free end to (x, y)
    pub fn add_point(&mut self, net: &mut PetriNet, x: f64, y: f64) -> Result<(), EditorError> {
        let ArcDraftState::Drafting { arc_id, .. } = &self.state else {
            return Err(EditorError::invalid("add an arc point", self.state.label()));
        };

        net.set_draft_target(arc_id, Point::new(x, y))?;
        net.notify_observers();
        Ok(())
    }

    /// Whether an arc being drawn may end on `candidate`.
    ///
    /// Always false when no arc is being drawn.
    pub fn is_applicable_end_point(&self, net: &PetriNet, candidate: &ConnectableRef) -> bool {
        let ArcDraftState::Drafting { source, .. } = &self.state else {
            return false;
        };

        net.connectable(candidate)
            .is_some_and(|c| c.is_end_point() && c.kind() != source.kind)
    }

    /// Bind the draft to `target` and record its creation as one transaction.
    ///
    /// Fails with a structural violation if `target` has the same kind as the
    /// source, or a duplicate identifier if the two are already connected in
    /// that direction; the draft stays open in either case so the caller can
    /// pick another target or cancel. Returns the committed arc's identifier.
    pub fn finish(
        &mut self,
        net: &mut PetriNet,
        history: &mut HistoryManager,
        target: ConnectableRef,
    ) -> Result<String, EditorError> {
        let ArcDraftState::Drafting { arc_id: draft_id, source } = &self.state else {
            return Err(EditorError::invalid("finish creating an arc", self.state.label()));
        };

        let final_id = arc_id(source, &target);
        let index = net.bind_arc_target(draft_id, &final_id, target)?;

        let component = net
            .component(&ComponentRef::arc(&final_id))
            .ok_or_else(|| NetError::ComponentNotFound {
                kind: pipe_net::ComponentKind::Arc,
                id: final_id.clone(),
            })?;
        history.add_new_edit(Edit::AddComponent { component, index });
        history.set_description("Create arc");
        history.seal();

        info!(arc = %final_id, "arc created");
        self.state = ArcDraftState::Idle;
        net.notify_observers();
        Ok(final_id)
    }

    /// Discard the draft arc without touching history
    pub fn cancel(&mut self, net: &mut PetriNet) -> Result<(), EditorError> {
        let ArcDraftState::Drafting { arc_id, .. } = std::mem::take(&mut self.state) else {
            return Err(EditorError::invalid("cancel arc creation", "idle"));
        };

        match net.remove_component(&ComponentRef::arc(&arc_id)) {
            Ok(_) | Err(NetError::ComponentNotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        net.notify_observers();

        debug!(arc = %arc_id, "arc draft cancelled");
        Ok(())
    }
}
