//! # Document Controller
//!
//! The façade UI collaborators call into for one open Petri net document.
//!
//! A controller exclusively owns its net, its history, the arc-drawing
//! protocol, the selection set and the numbering counters. Nothing here is
//! shared between documents.
//!
//! ## Lifecycle
//!
//! ```text
//! open → select / drag / draw arcs / edit tokens → undo / redo → close
//!           ↓                                         ↑
//!        PetriNet mutations ── recorded as ──▶ HistoryManager
//! ```
//!
//! Every history-recorded action is sealed as its own transaction and
//! followed by exactly one observer notification.

use std::collections::HashSet;

use pipe_net::{
    Color, Component, ComponentKind, ComponentRef, ConnectableRef, NetError, NetObserver,
    ObserverId, PetriNet, Place, Point, Positioned, Rect, Token, Transition,
};
use tracing::{debug, info, warn};

use crate::arc_construction::{ArcConstruction, ArcDraftState};
use crate::config::EditorConfig;
use crate::edits::{Edit, FieldChange};
use crate::history::HistoryManager;
use crate::EditorError;

/// Editing controller for one Petri net document
#[derive(Debug)]
pub struct PetriNetController {
    net: PetriNet,
    history: HistoryManager,
    arc_construction: ArcConstruction,
    selected: HashSet<ComponentRef>,
    place_number: u32,
    transition_number: u32,
    config: EditorConfig,
}

impl PetriNetController {
    pub fn new(net: PetriNet) -> Self {
        Self::with_config(net, EditorConfig::default())
    }

    pub fn with_config(net: PetriNet, config: EditorConfig) -> Self {
        Self {
            net,
            history: HistoryManager::with_max_levels(config.max_undo_levels),
            arc_construction: ArcConstruction::new(),
            selected: HashSet::new(),
            place_number: 0,
            transition_number: 0,
            config,
        }
    }

    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn add_observer(&mut self, observer: impl NetObserver + 'static) -> ObserverId {
        self.net.add_observer(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.net.remove_observer(id)
    }

    // ---- numbering -------------------------------------------------------

    /// Next place number for this document; never reused
    pub fn get_unique_place_number(&mut self) -> u32 {
        let n = self.place_number;
        self.place_number += 1;
        n
    }

    /// Next transition number for this document; never reused
    pub fn get_unique_transition_number(&mut self) -> u32 {
        let n = self.transition_number;
        self.transition_number += 1;
        n
    }

    // ---- creation --------------------------------------------------------

    /// Create a place with a synthesized identifier (`P0`, `P1`, …)
    pub fn create_place(&mut self, x: f64, y: f64) -> Result<ConnectableRef, EditorError> {
        let number = self.get_unique_place_number();
        let id = format!("{}{}", self.config.place_prefix, number);
        let size = self.config.place_size;
        let place = Place::new(id.clone(), Point::new(x, y)).with_size(size, size);
        self.add_component(place)?;
        Ok(ConnectableRef::place(id))
    }

    /// Create a transition with a synthesized identifier (`T0`, `T1`, …)
    pub fn create_transition(&mut self, x: f64, y: f64) -> Result<ConnectableRef, EditorError> {
        let number = self.get_unique_transition_number();
        let id = format!("{}{}", self.config.transition_prefix, number);
        let size = self.config.transition_size;
        let transition = Transition::new(id.clone(), Point::new(x, y)).with_size(size, size);
        self.add_component(transition)?;
        Ok(ConnectableRef::transition(id))
    }

    /// Insert a component as one undoable transaction.
    ///
    /// Arcs must be bound to both endpoints; draws go through
    /// [`PetriNetController::start_creating_arc`].
    pub fn add_component(&mut self, component: impl Into<Component>) -> Result<(), EditorError> {
        let component = component.into();
        let r = component.component_ref();
        self.net.add_component(component.clone())?;
        let index = self.net.index_of(&r).unwrap_or_default();
        self.record(format!("Add {}", r.kind), Edit::AddComponent { component, index });
        Ok(())
    }

    // ---- selection -------------------------------------------------------

    pub fn select(&mut self, component: ComponentRef) {
        self.selected.insert(component);
    }

    pub fn deselect(&mut self, component: &ComponentRef) {
        self.selected.remove(component);
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, component: &ComponentRef) -> bool {
        self.selected.contains(component)
    }

    pub fn selection(&self) -> impl Iterator<Item = &ComponentRef> + '_ {
        self.selected.iter()
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    /// Select every place and transition whose bounds intersect `area`, then
    /// every committed arc with an endpoint among those just swept.
    pub fn select_area(&mut self, area: Rect) {
        let mut swept: HashSet<ConnectableRef> = HashSet::new();
        swept.extend(
            self.net
                .places()
                .filter(|p| p.bounds().intersects(&area))
                .map(|p| ConnectableRef::place(&p.id)),
        );
        swept.extend(
            self.net
                .transitions()
                .filter(|t| t.bounds().intersects(&area))
                .map(|t| ConnectableRef::transition(&t.id)),
        );

        let arcs: Vec<ComponentRef> = self
            .net
            .committed_arcs()
            .filter(|arc| {
                swept.contains(&arc.source)
                    || arc.target_ref().is_some_and(|t| swept.contains(t))
            })
            .map(|arc| ComponentRef::arc(&arc.id))
            .collect();

        debug!(connectables = swept.len(), arcs = arcs.len(), "area selection");
        self.selected.extend(swept.into_iter().map(ComponentRef::from));
        self.selected.extend(arcs);
    }

    /// Shift every selected place and transition by (dx, dy).
    ///
    /// Arcs follow their endpoints. Observers are notified once for the batch.
    /// Not recorded in history; use [`PetriNetController::set_position`] for
    /// an undoable move.
    pub fn translate_selected(&mut self, dx: f64, dy: f64) {
        let targets: Vec<ConnectableRef> = self
            .selected
            .iter()
            .filter_map(ComponentRef::as_connectable)
            .collect();

        for target in &targets {
            let Some(position) = self.net.connectable(target).map(|c| c.position()) else {
                continue;
            };
            if let Err(e) = self.net.set_position(target, position.translated(dx, dy)) {
                warn!(error = %e, "translate skipped component");
            }
        }
        self.net.notify_observers();
    }

    // ---- deletion --------------------------------------------------------

    /// Delete every selected component as one transaction and clear the
    /// selection. Returns how many components were removed, cascaded arcs
    /// included.
    pub fn delete_selection(&mut self) -> Result<usize, EditorError> {
        self.abandon_draft();

        let net = &self.net;
        let mut targets: Vec<ComponentRef> = self
            .selected
            .drain()
            .filter(|target| net.contains(target))
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }
        // Arcs first so an arc selected alongside its endpoint is recorded once
        targets.sort_by(|a, b| {
            (a.kind != ComponentKind::Arc, a.kind, &a.id).cmp(&(
                b.kind != ComponentKind::Arc,
                b.kind,
                &b.id,
            ))
        });

        self.history.new_edit();
        self.history.set_description("Delete selection");

        let mut removed = 0;
        let mut result = Ok(());
        for target in &targets {
            if !self.net.contains(target) {
                continue;
            }
            match self.delete_component(target) {
                Ok(n) => removed += n,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.history.seal();
        self.net.notify_observers();
        info!(removed, "deleted selection");
        result.map(|()| removed)
    }

    /// Delete one component (and its incident arcs) as one transaction
    pub fn delete(&mut self, component: &ComponentRef) -> Result<usize, EditorError> {
        if !self.net.contains(component) {
            return Err(NetError::ComponentNotFound {
                kind: component.kind,
                id: component.id.clone(),
            }
            .into());
        }

        self.abandon_draft();
        if !self.net.contains(component) {
            // It was the draft itself
            return Ok(0);
        }

        self.history.new_edit();
        self.history.set_description(format!("Delete {}", component.kind));
        let result = self.delete_component(component);
        self.history.seal();

        if result.is_ok() {
            self.net.notify_observers();
        }
        result
    }

    /// Remove a component, adding its removal (and cascade) to the open
    /// transaction
    fn delete_component(&mut self, component: &ComponentRef) -> Result<usize, EditorError> {
        let removal = self.net.remove_component(component)?;
        let removed = 1 + removal.cascaded.len();

        for cascaded in removal.cascaded {
            self.selected.remove(&ComponentRef::arc(&cascaded.arc.id));
            self.history.add_edit(Edit::RemoveComponent {
                component: Component::Arc(cascaded.arc),
                index: cascaded.index,
            });
        }
        self.selected.remove(component);
        self.history.add_edit(Edit::RemoveComponent {
            component: removal.component,
            index: removal.index,
        });
        Ok(removed)
    }

    // ---- field edits -----------------------------------------------------

    pub fn set_position(&mut self, component: &ConnectableRef, to: Point) -> Result<(), EditorError> {
        let from = self.net.set_position(component, to)?;
        if from != to {
            self.record(
                "Move",
                Edit::SetField(FieldChange::Position {
                    component: component.clone(),
                    from,
                    to,
                }),
            );
        }
        Ok(())
    }

    pub fn rename(&mut self, component: &ConnectableRef, name: &str) -> Result<(), EditorError> {
        let from = self.net.set_name(component, name)?;
        if from != name {
            self.record(
                "Rename",
                Edit::SetField(FieldChange::Name {
                    component: component.clone(),
                    from,
                    to: name.to_string(),
                }),
            );
        }
        Ok(())
    }

    /// Set a place's count for one token class (`None` clears the entry)
    pub fn set_marking(
        &mut self,
        place: &str,
        token: &str,
        count: Option<u32>,
    ) -> Result<(), EditorError> {
        let from = self.net.set_marking(place, token, count)?;
        if from != count {
            self.record(
                "Set marking",
                Edit::SetField(FieldChange::Marking {
                    place: place.to_string(),
                    token: token.to_string(),
                    from,
                    to: count,
                }),
            );
        }
        Ok(())
    }

    /// Set an arc's weight expression for one token class (`None` clears it).
    ///
    /// An arc still being drawn has no weights until it is committed.
    pub fn set_arc_weight(
        &mut self,
        arc: &str,
        token: &str,
        expression: Option<&str>,
    ) -> Result<(), EditorError> {
        if self.net.arc(arc).is_some_and(|a| a.is_draft()) {
            return Err(NetError::UncommittedArc {
                arc: arc.to_string(),
            }
            .into());
        }
        let from = self.net.set_arc_weight(arc, token, expression)?;
        let to = expression.map(str::to_string);
        if from != to {
            self.record(
                "Set arc weight",
                Edit::SetField(FieldChange::ArcWeight {
                    arc: arc.to_string(),
                    token: token.to_string(),
                    from,
                    to,
                }),
            );
        }
        Ok(())
    }

    // ---- tokens ----------------------------------------------------------

    /// Add a token class with an initial count of zero
    pub fn create_new_token(
        &mut self,
        name: &str,
        enabled: bool,
        color: Color,
    ) -> Result<(), EditorError> {
        let before = self.net.token_state();
        self.net.add_token(Token::new(name, enabled, 0, color))?;
        let after = self.net.token_state();
        self.record("Create token", Edit::ReplaceTokens { before, after });
        Ok(())
    }

    pub fn get_token(&self, name: &str) -> Result<&Token, NetError> {
        self.net
            .token(name)
            .ok_or_else(|| NetError::TokenNotFound(name.to_string()))
    }

    pub fn net_tokens(&self) -> impl ExactSizeIterator<Item = &Token> + '_ {
        self.net.tokens()
    }

    /// Update one token; a changed `name` renames it along with every marking
    /// and arc weight that refers to it
    pub fn update_token(
        &mut self,
        current_name: &str,
        name: &str,
        enabled: bool,
        color: Color,
    ) -> Result<(), EditorError> {
        let mut attributes = self.get_token(current_name)?.attributes();
        attributes.enabled = enabled;
        attributes.color = color;

        let before = self.net.token_state();
        self.net.update_token(current_name, name, attributes)?;
        let after = self.net.token_state();
        if before != after {
            self.record("Update token", Edit::ReplaceTokens { before, after });
        }
        Ok(())
    }

    /// Replace the whole token set at once (update, insert, remove).
    ///
    /// All or nothing: on failure the prior token set is untouched and the
    /// reason is returned as [`EditorError::BulkUpdateFailure`].
    pub fn update_or_replace_tokens(&mut self, desired: Vec<Token>) -> Result<(), EditorError> {
        let before = self.net.token_state();
        self.net
            .update_or_replace_tokens(desired)
            .map_err(|e| EditorError::BulkUpdateFailure(e.to_string()))?;
        let after = self.net.token_state();
        if before != after {
            self.record("Edit tokens", Edit::ReplaceTokens { before, after });
        }
        Ok(())
    }

    // ---- arc construction ------------------------------------------------

    pub fn arc_state(&self) -> &ArcDraftState {
        self.arc_construction.state()
    }

    pub fn is_currently_creating_arc(&self) -> bool {
        self.arc_construction.is_drafting()
    }

    pub fn start_creating_arc(&mut self, source: ConnectableRef) -> Result<(), EditorError> {
        self.arc_construction.start(&mut self.net, source)
    }

    pub fn add_arc_point(&mut self, x: f64, y: f64) -> Result<(), EditorError> {
        self.arc_construction.add_point(&mut self.net, x, y)
    }

    pub fn is_applicable_end_point(&self, candidate: &ConnectableRef) -> bool {
        self.arc_construction
            .is_applicable_end_point(&self.net, candidate)
    }

    /// Commit the arc being drawn; returns its identifier
    pub fn finish_creating_arc(&mut self, target: ConnectableRef) -> Result<String, EditorError> {
        self.arc_construction
            .finish(&mut self.net, &mut self.history, target)
    }

    pub fn cancel_arc_creation(&mut self) -> Result<(), EditorError> {
        self.arc_construction.cancel(&mut self.net)
    }

    // ---- history ---------------------------------------------------------

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.abandon_draft();
        let undone = self.history.undo(&mut self.net)?;
        self.prune_selection();
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.abandon_draft();
        let redone = self.history.redo(&mut self.net)?;
        self.prune_selection();
        Ok(redone)
    }

    /// Drop session state: selection, any arc draft, and history
    pub fn close(&mut self) {
        self.abandon_draft();
        self.selected.clear();
        self.history.clear();
        debug!("document closed");
    }

    /// Record one edit as its own sealed transaction and notify observers
    fn record(&mut self, description: impl Into<String>, edit: Edit) {
        self.history.add_new_edit(edit);
        self.history.set_description(description);
        self.history.seal();
        self.net.notify_observers();
    }

    fn abandon_draft(&mut self) {
        if self.arc_construction.is_drafting() {
            warn!("abandoning arc draft");
            if let Err(e) = self.arc_construction.cancel(&mut self.net) {
                warn!(error = %e, "could not remove arc draft");
            }
        }
    }

    fn prune_selection(&mut self) {
        let net = &self.net;
        self.selected.retain(|r| net.contains(r));
    }
}
