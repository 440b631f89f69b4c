//! # Petri Net Container
//!
//! Owns every component of one document and enforces the structural
//! invariants on insert and remove:
//!
//! - identifiers are unique per kind (tokens have their own namespace)
//! - an arc connects a place to a transition or a transition to a place
//! - removing a connectable removes every arc incident to it
//!
//! Storage is one insertion-ordered arena per kind. Arcs hold endpoint
//! handles, never the endpoints themselves.
//!
//! Mutating methods do not notify observers on their own; whoever drives a
//! change calls [`PetriNet::notify_observers`] once the change is complete so
//! several mutations can be batched into one notification.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::component::{
    Arc, ArcTarget, Component, ComponentKind, ComponentRef, Connectable, ConnectableKind,
    ConnectableRef, Place, Positioned, Transition,
};
use crate::error::{IdentifierKind, NetError};
use crate::geometry::Point;
use crate::token::{Token, TokenAttributes, TokenState};

/// Receives "model changed" notifications (no payload).
///
/// Implemented for any `FnMut()` closure.
pub trait NetObserver {
    fn model_changed(&mut self);
}

impl<F: FnMut()> NetObserver for F {
    fn model_changed(&mut self) {
        self()
    }
}

/// Handle returned by [`PetriNet::add_observer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// An arc removed as a side effect of removing one of its endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedArc {
    pub arc: Arc,
    /// Position the arc occupied at the moment it was removed
    pub index: usize,
}

/// Everything [`PetriNet::remove_component`] took out of the net.
///
/// Cascaded arcs are listed in removal order and were removed before the
/// component itself; reinserting in reverse order restores the exact layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub component: Component,
    pub index: usize,
    pub cascaded: Vec<RemovedArc>,
}

/// In-memory Petri net document
#[derive(Default)]
pub struct PetriNet {
    places: IndexMap<String, Place>,
    transitions: IndexMap<String, Transition>,
    arcs: IndexMap<String, Arc>,
    tokens: IndexMap<String, Token>,
    observers: Vec<(ObserverId, Box<dyn NetObserver>)>,
    next_observer: u64,
    version: u64,
}

impl fmt::Debug for PetriNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetriNet")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("arcs", &self.arcs)
            .field("tokens", &self.tokens)
            .field("observers", &self.observers.len())
            .field("version", &self.version)
            .finish()
    }
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- read-only views -------------------------------------------------

    pub fn places(&self) -> impl ExactSizeIterator<Item = &Place> + '_ {
        self.places.values()
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &Transition> + '_ {
        self.transitions.values()
    }

    /// All arcs, including an arc that is still being drawn
    pub fn arcs(&self) -> impl ExactSizeIterator<Item = &Arc> + '_ {
        self.arcs.values()
    }

    /// Arcs with two real endpoints
    pub fn committed_arcs(&self) -> impl Iterator<Item = &Arc> + '_ {
        self.arcs.values().filter(|arc| !arc.is_draft())
    }

    pub fn tokens(&self) -> impl ExactSizeIterator<Item = &Token> + '_ {
        self.tokens.values()
    }

    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.get(id)
    }

    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.get(id)
    }

    pub fn arc(&self, id: &str) -> Option<&Arc> {
        self.arcs.get(id)
    }

    pub fn token(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn connectable(&self, r: &ConnectableRef) -> Option<Connectable<'_>> {
        match r.kind {
            ConnectableKind::Place => self.places.get(&r.id).map(Connectable::Place),
            ConnectableKind::Transition => {
                self.transitions.get(&r.id).map(Connectable::Transition)
            }
        }
    }

    pub fn contains(&self, r: &ComponentRef) -> bool {
        self.index_of(r).is_some()
    }

    /// Insertion-order position of a component within its kind
    pub fn index_of(&self, r: &ComponentRef) -> Option<usize> {
        match r.kind {
            ComponentKind::Place => self.places.get_index_of(&r.id),
            ComponentKind::Transition => self.transitions.get_index_of(&r.id),
            ComponentKind::Arc => self.arcs.get_index_of(&r.id),
        }
    }

    /// Owned copy of a component
    pub fn component(&self, r: &ComponentRef) -> Option<Component> {
        match r.kind {
            ComponentKind::Place => self.places.get(&r.id).cloned().map(Component::Place),
            ComponentKind::Transition => self
                .transitions
                .get(&r.id)
                .cloned()
                .map(Component::Transition),
            ComponentKind::Arc => self.arcs.get(&r.id).cloned().map(Component::Arc),
        }
    }

    /// Identifiers of every arc (draft included) with the connectable as an endpoint
    pub fn incident_arcs(&self, connectable: &ConnectableRef) -> Vec<String> {
        self.arcs
            .values()
            .filter(|arc| arc.touches(connectable))
            .map(|arc| arc.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.transitions.is_empty() && self.arcs.is_empty()
    }

    // ---- structure -------------------------------------------------------

    /// Insert a component at the end of its kind's ordering
    pub fn add_component(&mut self, component: impl Into<Component>) -> Result<(), NetError> {
        let component = component.into();
        let index = self.len_of(component.kind());
        self.insert_component_at(component, index)
    }

    /// Insert a component at a given position within its kind's ordering.
    ///
    /// Indices past the end are clamped. Arcs must be bound to a real target;
    /// draft arcs go through [`PetriNet::insert_draft`]. Nothing changes on
    /// error.
    pub fn insert_component_at(
        &mut self,
        component: impl Into<Component>,
        index: usize,
    ) -> Result<(), NetError> {
        let component = component.into();
        let kind = component.kind();

        if self.contains(&component.component_ref()) {
            return Err(NetError::duplicate(kind, component.id()));
        }
        if let Component::Arc(arc) = &component {
            self.validate_arc(arc)?;
        }

        let index = index.min(self.len_of(kind));
        debug!(kind = %kind, id = component.id(), index, "insert component");

        match component {
            Component::Place(place) => {
                self.places.shift_insert(index, place.id.clone(), place);
            }
            Component::Transition(transition) => {
                self.transitions
                    .shift_insert(index, transition.id.clone(), transition);
            }
            Component::Arc(arc) => {
                self.arcs.shift_insert(index, arc.id.clone(), arc);
            }
        }
        Ok(())
    }

    /// Remove a component; removing a place or transition also removes every
    /// arc incident to it.
    pub fn remove_component(&mut self, r: &ComponentRef) -> Result<Removal, NetError> {
        if !self.contains(r) {
            return Err(NetError::not_found(r.kind, &r.id));
        }

        let mut cascaded = Vec::new();
        if let Some(connectable) = r.as_connectable() {
            for arc_id in self.incident_arcs(&connectable) {
                if let Some((index, _, arc)) = self.arcs.shift_remove_full(&arc_id) {
                    cascaded.push(RemovedArc { arc, index });
                }
            }
        }

        let (index, component) = match r.kind {
            ComponentKind::Place => self
                .places
                .shift_remove_full(&r.id)
                .map(|(i, _, p)| (i, Component::Place(p))),
            ComponentKind::Transition => self
                .transitions
                .shift_remove_full(&r.id)
                .map(|(i, _, t)| (i, Component::Transition(t))),
            ComponentKind::Arc => self
                .arcs
                .shift_remove_full(&r.id)
                .map(|(i, _, a)| (i, Component::Arc(a))),
        }
        .ok_or_else(|| NetError::not_found(r.kind, &r.id))?;

        debug!(component = %r, cascaded = cascaded.len(), "removed component");

        Ok(Removal {
            component,
            index,
            cascaded,
        })
    }

    fn len_of(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Place => self.places.len(),
            ComponentKind::Transition => self.transitions.len(),
            ComponentKind::Arc => self.arcs.len(),
        }
    }

    fn validate_arc(&self, arc: &Arc) -> Result<(), NetError> {
        let ArcTarget::Connectable(target_ref) = &arc.target else {
            return Err(NetError::UncommittedArc {
                arc: arc.id.clone(),
            });
        };
        let source = self.arc_source(arc)?;
        let target = self
            .connectable(target_ref)
            .ok_or_else(|| NetError::DanglingEndpoint {
                arc: arc.id.clone(),
                endpoint: target_ref.to_string(),
            })?;
        check_kinds(&arc.id, source.kind(), target.kind())
    }

    fn arc_source(&self, arc: &Arc) -> Result<Connectable<'_>, NetError> {
        self.connectable(&arc.source)
            .ok_or_else(|| NetError::DanglingEndpoint {
                arc: arc.id.clone(),
                endpoint: arc.source.to_string(),
            })
    }

    /// Append an arc whose target is still a free point.
    ///
    /// Only the source is checked. The draft is visible through
    /// [`PetriNet::arcs`] but not [`PetriNet::committed_arcs`], and becomes a
    /// committed arc through [`PetriNet::bind_arc_target`].
    pub fn insert_draft(&mut self, arc: Arc) -> Result<(), NetError> {
        if !arc.is_draft() {
            return self.add_component(arc);
        }
        if self.arcs.contains_key(&arc.id) {
            return Err(NetError::duplicate(ComponentKind::Arc, &arc.id));
        }
        self.arc_source(&arc)?;

        debug!(arc = %arc.id, "insert draft arc");
        self.arcs.insert(arc.id.clone(), arc);
        Ok(())
    }

    /// Move the free end of a draft arc
    pub fn set_draft_target(&mut self, arc_id: &str, at: Point) -> Result<(), NetError> {
        let arc = self
            .arcs
            .get_mut(arc_id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, arc_id))?;
        arc.target = ArcTarget::Temporary(at);
        Ok(())
    }

    /// Bind an arc to a real target, renaming it to `final_id`.
    ///
    /// The arc keeps its position in the arc ordering. Fails without changing
    /// anything if the target is missing, has the same kind as the source, or
    /// `final_id` is taken by another arc. Returns the arc's index.
    pub fn bind_arc_target(
        &mut self,
        arc_id: &str,
        final_id: &str,
        target: ConnectableRef,
    ) -> Result<usize, NetError> {
        let arc = self
            .arcs
            .get(arc_id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, arc_id))?;

        let target_kind = self
            .connectable(&target)
            .map(|c| c.kind())
            .ok_or_else(|| NetError::DanglingEndpoint {
                arc: arc_id.to_string(),
                endpoint: target.to_string(),
            })?;
        check_kinds(final_id, arc.source.kind, target_kind)?;

        if final_id != arc_id && self.arcs.contains_key(final_id) {
            return Err(NetError::duplicate(ComponentKind::Arc, final_id));
        }

        let (index, _, mut arc) = self
            .arcs
            .shift_remove_full(arc_id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, arc_id))?;
        arc.id = final_id.to_string();
        arc.target = ArcTarget::Connectable(target);
        self.arcs.shift_insert(index, arc.id.clone(), arc);

        Ok(index)
    }

    // ---- fields ----------------------------------------------------------

    /// Set a connectable's position, returning the previous one
    pub fn set_position(&mut self, r: &ConnectableRef, position: Point) -> Result<Point, NetError> {
        let previous = match r.kind {
            ConnectableKind::Place => self.places.get_mut(&r.id).map(|p| {
                let old = p.position();
                p.set_position(position);
                old
            }),
            ConnectableKind::Transition => self.transitions.get_mut(&r.id).map(|t| {
                let old = t.position();
                t.set_position(position);
                old
            }),
        };
        previous.ok_or_else(|| NetError::not_found(r.kind.into(), &r.id))
    }

    /// Set a connectable's display name, returning the previous one
    pub fn set_name(&mut self, r: &ConnectableRef, name: &str) -> Result<String, NetError> {
        let slot = match r.kind {
            ConnectableKind::Place => self.places.get_mut(&r.id).map(|p| &mut p.name),
            ConnectableKind::Transition => self.transitions.get_mut(&r.id).map(|t| &mut t.name),
        };
        let slot = slot.ok_or_else(|| NetError::not_found(r.kind.into(), &r.id))?;
        Ok(std::mem::replace(slot, name.to_string()))
    }

    /// Set (or clear, with `None`) a place's count for one token class.
    /// Returns the previous entry.
    pub fn set_marking(
        &mut self,
        place_id: &str,
        token_id: &str,
        count: Option<u32>,
    ) -> Result<Option<u32>, NetError> {
        if count.is_some() && !self.tokens.contains_key(token_id) {
            return Err(NetError::TokenNotFound(token_id.to_string()));
        }
        let place = self
            .places
            .get_mut(place_id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Place, place_id))?;

        Ok(match count {
            Some(count) => place.marking.insert(token_id.to_string(), count),
            None => place.marking.shift_remove(token_id),
        })
    }

    /// Set (or clear, with `None`) an arc's weight expression for one token
    /// class. Returns the previous entry.
    pub fn set_arc_weight(
        &mut self,
        arc_id: &str,
        token_id: &str,
        expression: Option<&str>,
    ) -> Result<Option<String>, NetError> {
        if expression.is_some() && !self.tokens.contains_key(token_id) {
            return Err(NetError::TokenNotFound(token_id.to_string()));
        }
        let arc = self
            .arcs
            .get_mut(arc_id)
            .ok_or_else(|| NetError::not_found(ComponentKind::Arc, arc_id))?;

        Ok(match expression {
            Some(expression) => arc
                .weights
                .insert(token_id.to_string(), expression.to_string()),
            None => arc.weights.shift_remove(token_id),
        })
    }

    // ---- tokens ----------------------------------------------------------

    pub fn add_token(&mut self, token: Token) -> Result<(), NetError> {
        validate_token_id(&token.id)?;
        if self.tokens.contains_key(&token.id) {
            return Err(NetError::DuplicateIdentifier {
                kind: IdentifierKind::Token,
                id: token.id,
            });
        }
        debug!(token = %token.id, "add token");
        self.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    /// Remove a token class along with every marking and weight keyed by it
    pub fn remove_token(&mut self, id: &str) -> Result<Token, NetError> {
        let token = self
            .tokens
            .shift_remove(id)
            .ok_or_else(|| NetError::TokenNotFound(id.to_string()))?;

        for place in self.places.values_mut() {
            place.marking.shift_remove(id);
        }
        for arc in self.arcs.values_mut() {
            arc.weights.shift_remove(id);
        }
        debug!(token = %id, "removed token");
        Ok(token)
    }

    /// Update a token's attributes and, if `new_id` differs, rename it.
    ///
    /// A rename migrates every place marking and arc weight keyed by the old
    /// identifier to the new one, keeping entry order.
    pub fn update_token(
        &mut self,
        current_id: &str,
        new_id: &str,
        attributes: TokenAttributes,
    ) -> Result<(), NetError> {
        if !self.tokens.contains_key(current_id) {
            return Err(NetError::TokenNotFound(current_id.to_string()));
        }

        if new_id != current_id {
            validate_token_id(new_id)?;
            if self.tokens.contains_key(new_id) {
                return Err(NetError::DuplicateIdentifier {
                    kind: IdentifierKind::Token,
                    id: new_id.to_string(),
                });
            }

            rename_key(&mut self.tokens, current_id, new_id);
            for place in self.places.values_mut() {
                rename_key(&mut place.marking, current_id, new_id);
            }
            for arc in self.arcs.values_mut() {
                rename_key(&mut arc.weights, current_id, new_id);
            }
            info!(from = %current_id, to = %new_id, "renamed token");
        }

        if let Some(token) = self.tokens.get_mut(new_id) {
            token.id = new_id.to_string();
            token.set_attributes(attributes);
        }
        Ok(())
    }

    /// Replace the token set with `desired`, all or nothing.
    ///
    /// Tokens whose identifier already exists are updated in place, unseen
    /// identifiers are inserted, and existing tokens absent from `desired` are
    /// removed (with their markings and weights). If any step fails the prior
    /// token state is restored and the error returned.
    pub fn update_or_replace_tokens(&mut self, desired: Vec<Token>) -> Result<(), NetError> {
        let snapshot = self.token_state();

        match self.apply_token_set(desired) {
            Ok(()) => {
                info!(tokens = self.tokens.len(), "token set replaced");
                Ok(())
            }
            Err(e) => {
                self.restore_token_state(snapshot);
                Err(e)
            }
        }
    }

    fn apply_token_set(&mut self, desired: Vec<Token>) -> Result<(), NetError> {
        let mut seen = std::collections::HashSet::new();
        for token in &desired {
            validate_token_id(&token.id)?;
            if !seen.insert(token.id.as_str()) {
                return Err(NetError::DuplicateIdentifier {
                    kind: IdentifierKind::Token,
                    id: token.id.clone(),
                });
            }
        }

        let stale: Vec<String> = self
            .tokens
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.remove_token(&id)?;
        }

        for token in desired {
            match self.tokens.get_mut(&token.id) {
                Some(existing) => existing.set_attributes(token.attributes()),
                None => self.add_token(token)?,
            }
        }
        Ok(())
    }

    /// Snapshot of every token and everything keyed by token identifier.
    ///
    /// Draft arcs are left out; their weights are not part of the document.
    pub fn token_state(&self) -> TokenState {
        TokenState {
            tokens: self.tokens.values().cloned().collect(),
            markings: self
                .places
                .values()
                .map(|p| (p.id.clone(), p.marking.clone()))
                .collect(),
            weights: self
                .committed_arcs()
                .map(|a| (a.id.clone(), a.weights.clone()))
                .collect(),
        }
    }

    /// Restore a [`TokenState`] snapshot.
    ///
    /// Places and arcs named in the snapshot but no longer in the net are
    /// skipped; components absent from the snapshot keep their current maps.
    pub fn restore_token_state(&mut self, state: TokenState) {
        self.tokens = state
            .tokens
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        for (place_id, marking) in state.markings {
            if let Some(place) = self.places.get_mut(&place_id) {
                place.marking = marking;
            }
        }
        for (arc_id, weights) in state.weights {
            if let Some(arc) = self.arcs.get_mut(&arc_id) {
                arc.weights = weights;
            }
        }
    }

    // ---- observers -------------------------------------------------------

    pub fn add_observer(&mut self, observer: impl NetObserver + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Tell every observer the model changed and bump [`PetriNet::version`]
    pub fn notify_observers(&mut self) {
        self.version += 1;
        for (_, observer) in &mut self.observers {
            observer.model_changed();
        }
    }

    /// Number of notifications sent so far
    pub fn version(&self) -> u64 {
        self.version
    }
}

fn check_kinds(
    arc_id: &str,
    source: ConnectableKind,
    target: ConnectableKind,
) -> Result<(), NetError> {
    if source == target {
        return Err(NetError::StructuralViolation {
            arc: arc_id.to_string(),
            source_kind: source,
            target_kind: target,
        });
    }
    Ok(())
}

fn validate_token_id(id: &str) -> Result<(), NetError> {
    if id.trim().is_empty() {
        return Err(NetError::InvalidToken("token identifier is blank".to_string()));
    }
    Ok(())
}

/// Move a map entry to a new key without changing its position
fn rename_key<V>(map: &mut IndexMap<String, V>, from: &str, to: &str) {
    if let Some((index, _, value)) = map.shift_remove_full(from) {
        map.shift_insert(index, to.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Color;
    use std::cell::Cell;
    use std::rc::Rc;

    fn net_with_pair() -> PetriNet {
        let mut net = PetriNet::new();
        net.add_component(Place::new("P0", Point::new(0.0, 0.0))).unwrap();
        net.add_component(Transition::new("T0", Point::new(100.0, 0.0)))
            .unwrap();
        net
    }

    #[test]
    fn test_same_id_allowed_across_kinds() {
        let mut net = PetriNet::new();
        net.add_component(Place::new("X", Point::default())).unwrap();
        net.add_component(Transition::new("X", Point::default())).unwrap();
        assert_eq!(net.places().len(), 1);
        assert_eq!(net.transitions().len(), 1);
    }

    #[test]
    fn test_insert_at_index_preserves_order() {
        let mut net = PetriNet::new();
        net.add_component(Place::new("A", Point::default())).unwrap();
        net.add_component(Place::new("C", Point::default())).unwrap();
        net.insert_component_at(Place::new("B", Point::default()), 1)
            .unwrap();
        // Clamped
        net.insert_component_at(Place::new("D", Point::default()), 99)
            .unwrap();

        let ids: Vec<_> = net.places().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_arc_to_missing_endpoint_rejected() {
        let mut net = net_with_pair();
        let arc = Arc::new("a", ConnectableRef::place("P0"), ConnectableRef::transition("T9"));
        assert!(matches!(
            net.add_component(arc),
            Err(NetError::DanglingEndpoint { .. })
        ));
        assert_eq!(net.arcs().len(), 0);
    }

    #[test]
    fn test_draft_arc_only_enters_through_insert_draft() {
        let mut net = net_with_pair();
        let draft = Arc::draft("d", ConnectableRef::place("P0"), Point::new(5.0, 5.0));

        assert_eq!(
            net.add_component(draft.clone()),
            Err(NetError::UncommittedArc {
                arc: "d".to_string()
            })
        );
        assert!(matches!(
            net.insert_component_at(draft.clone(), 0),
            Err(NetError::UncommittedArc { .. })
        ));
        assert_eq!(net.arcs().len(), 0);

        net.insert_draft(draft).unwrap();
        assert_eq!(net.arcs().len(), 1);
        assert_eq!(net.committed_arcs().count(), 0);
    }

    #[test]
    fn test_insert_draft_checks_source() {
        let mut net = net_with_pair();
        let err = net
            .insert_draft(Arc::draft("d", ConnectableRef::place("nope"), Point::default()))
            .unwrap_err();
        assert!(matches!(err, NetError::DanglingEndpoint { .. }));
        assert_eq!(net.arcs().len(), 0);
    }

    #[test]
    fn test_token_state_skips_draft_arcs() {
        let mut net = net_with_pair();
        net.add_token(Token::new("Default", true, 0, Color::BLACK)).unwrap();
        net.insert_draft(Arc::draft("d", ConnectableRef::place("P0"), Point::default()))
            .unwrap();
        net.set_arc_weight("d", "Default", Some("1")).unwrap();

        let state = net.token_state();
        assert!(!state.weights.contains_key("d"));
    }

    #[test]
    fn test_bind_arc_target_keeps_slot() {
        let mut net = net_with_pair();
        net.add_component(Place::new("P1", Point::default())).unwrap();
        net.add_component(Arc::new(
            "P1 TO T0",
            ConnectableRef::place("P1"),
            ConnectableRef::transition("T0"),
        ))
        .unwrap();
        net.insert_draft(Arc::draft("draft", ConnectableRef::place("P0"), Point::default()))
            .unwrap();

        let index = net
            .bind_arc_target("draft", "P0 TO T0", ConnectableRef::transition("T0"))
            .unwrap();
        assert_eq!(index, 1);
        let ids: Vec<_> = net.arcs().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["P1 TO T0", "P0 TO T0"]);
        assert!(net.arcs().all(|a| !a.is_draft()));
    }

    #[test]
    fn test_bind_arc_target_same_kind_leaves_draft() {
        let mut net = net_with_pair();
        net.add_component(Place::new("P1", Point::default())).unwrap();
        net.insert_draft(Arc::draft("d", ConnectableRef::place("P0"), Point::default()))
            .unwrap();

        let err = net
            .bind_arc_target("d", "P0 TO P1", ConnectableRef::place("P1"))
            .unwrap_err();
        assert!(matches!(err, NetError::StructuralViolation { .. }));
        assert!(net.arc("d").unwrap().is_draft());
    }

    #[test]
    fn test_marking_requires_known_token() {
        let mut net = net_with_pair();
        assert_eq!(
            net.set_marking("P0", "Default", Some(3)),
            Err(NetError::TokenNotFound("Default".to_string()))
        );

        net.add_token(Token::new("Default", true, 0, Color::BLACK)).unwrap();
        assert_eq!(net.set_marking("P0", "Default", Some(3)), Ok(None));
        assert_eq!(net.set_marking("P0", "Default", None), Ok(Some(3)));
        assert_eq!(net.place("P0").unwrap().tokens_of("Default"), 0);
    }

    #[test]
    fn test_rename_token_migrates_references() {
        let mut net = net_with_pair();
        net.add_token(Token::new("Default", true, 0, Color::BLACK)).unwrap();
        net.add_token(Token::new("Red", true, 0, Color::rgb(255, 0, 0))).unwrap();
        net.add_component(
            Arc::new("a", ConnectableRef::place("P0"), ConnectableRef::transition("T0"))
                .with_weight("Default", "1")
                .with_weight("Red", "2"),
        )
        .unwrap();
        net.set_marking("P0", "Red", Some(4)).unwrap();

        let attrs = net.token("Red").unwrap().attributes();
        net.update_token("Red", "Crimson", attrs).unwrap();

        assert!(net.token("Red").is_none());
        assert_eq!(net.token("Crimson").unwrap().id, "Crimson");
        assert_eq!(net.place("P0").unwrap().tokens_of("Crimson"), 4);
        let weights: Vec<_> = net.arc("a").unwrap().weights.keys().cloned().collect();
        assert_eq!(weights, ["Default", "Crimson"]);
        // Token order kept
        let ids: Vec<_> = net.tokens().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["Default", "Crimson"]);
    }

    #[test]
    fn test_rename_token_onto_existing_fails() {
        let mut net = PetriNet::new();
        net.add_token(Token::new("A", true, 0, Color::BLACK)).unwrap();
        net.add_token(Token::new("B", true, 0, Color::BLACK)).unwrap();
        let attrs = net.token("A").unwrap().attributes();
        assert!(matches!(
            net.update_token("A", "B", attrs),
            Err(NetError::DuplicateIdentifier { .. })
        ));
        assert!(net.token("A").is_some());
    }

    #[test]
    fn test_observers_notified_and_removable() {
        let mut net = PetriNet::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let id = net.add_observer(move || counter.set(counter.get() + 1));

        net.notify_observers();
        net.notify_observers();
        assert_eq!(calls.get(), 2);
        assert_eq!(net.version(), 2);

        assert!(net.remove_observer(id));
        net.notify_observers();
        assert_eq!(calls.get(), 2);
        assert!(!net.remove_observer(id));
    }
}
