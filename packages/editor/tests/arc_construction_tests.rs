//! Arc drawing protocol through the controller

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use pipe_editor::{ArcDraftState, EditorError, PetriNetController};
use pipe_net::{
    Arc, ArcTarget, Color, ConnectableRef, NetError, PetriNet, Place, Point, Token, Transition,
};

fn controller() -> PetriNetController {
    let mut net = PetriNet::new();
    net.add_component(Place::new("P0", Point::new(0.0, 0.0))).unwrap();
    net.add_component(Place::new("P1", Point::new(0.0, 100.0))).unwrap();
    net.add_component(Transition::new("T0", Point::new(100.0, 50.0)))
        .unwrap();
    PetriNetController::new(net)
}

fn arc_ids(c: &PetriNetController) -> BTreeSet<String> {
    c.net().arcs().map(|a| a.id.clone()).collect()
}

#[test]
fn test_cancel_leaves_no_trace() {
    let mut c = controller();
    let arcs_before = arc_ids(&c);
    let levels_before = c.history().undo_levels();

    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    assert_eq!(c.net().arcs().len(), 1, "draft is visible while drawn");
    c.add_arc_point(40.0, 40.0).unwrap();
    c.cancel_arc_creation().unwrap();

    assert_eq!(arc_ids(&c), arcs_before);
    assert_eq!(c.history().undo_levels(), levels_before);
    assert_eq!(c.arc_state(), &ArcDraftState::Idle);
}

#[test]
fn test_finish_commits_one_arc_and_one_transaction() {
    let mut c = controller();
    let levels_before = c.history().undo_levels();

    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    c.add_arc_point(70.0, 30.0).unwrap();
    assert!(c.is_applicable_end_point(&ConnectableRef::transition("T0")));
    let id = c
        .finish_creating_arc(ConnectableRef::transition("T0"))
        .unwrap();

    assert_eq!(id, "P0 TO T0");
    assert_eq!(c.net().arcs().len(), 1);
    let arc = c.net().arc(&id).unwrap();
    assert_eq!(arc.source, ConnectableRef::place("P0"));
    assert_eq!(
        arc.target,
        ArcTarget::Connectable(ConnectableRef::transition("T0"))
    );
    assert_eq!(c.net().arcs().filter(|a| a.is_draft()).count(), 0);
    assert_eq!(c.history().undo_levels(), levels_before + 1);
    assert_eq!(c.history().undo_description(), Some("Create arc"));
    assert!(!c.is_currently_creating_arc());
}

#[test]
fn test_transition_to_place_arc() {
    let mut c = controller();
    c.start_creating_arc(ConnectableRef::transition("T0")).unwrap();
    assert!(!c.is_applicable_end_point(&ConnectableRef::transition("T0")));
    let id = c.finish_creating_arc(ConnectableRef::place("P1")).unwrap();
    assert_eq!(id, "T0 TO P1");
}

#[test]
fn test_committed_arc_undo_and_redo() {
    let mut c = controller();
    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    c.finish_creating_arc(ConnectableRef::transition("T0"))
        .unwrap();

    assert!(c.undo().unwrap());
    assert_eq!(c.net().arcs().len(), 0);

    assert!(c.redo().unwrap());
    assert!(c.net().arc("P0 TO T0").is_some());
}

#[test]
fn test_same_kind_target_rejected_at_commit() {
    let mut c = controller();
    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();

    assert!(!c.is_applicable_end_point(&ConnectableRef::place("P1")));
    let err = c
        .finish_creating_arc(ConnectableRef::place("P1"))
        .unwrap_err();

    assert!(matches!(
        err,
        EditorError::Net(NetError::StructuralViolation { .. })
    ));
    assert!(c.is_currently_creating_arc());
    assert_eq!(c.history().undo_levels(), 0);

    c.cancel_arc_creation().unwrap();
    assert_eq!(c.net().arcs().len(), 0);
}

#[test]
fn test_parallel_arc_rejected() {
    let mut c = controller();
    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    c.finish_creating_arc(ConnectableRef::transition("T0"))
        .unwrap();

    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    let err = c
        .finish_creating_arc(ConnectableRef::transition("T0"))
        .unwrap_err();
    assert!(matches!(
        err,
        EditorError::Net(NetError::DuplicateIdentifier { .. })
    ));
    c.cancel_arc_creation().unwrap();
    assert_eq!(c.net().arcs().len(), 1);
}

#[test]
fn test_protocol_misuse_is_invalid_transition() {
    let mut c = controller();

    for result in [
        c.add_arc_point(1.0, 1.0),
        c.cancel_arc_creation(),
        c.finish_creating_arc(ConnectableRef::transition("T0"))
            .map(|_| ()),
    ] {
        assert!(matches!(result, Err(EditorError::InvalidTransition { .. })));
    }

    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    assert!(matches!(
        c.start_creating_arc(ConnectableRef::place("P1")),
        Err(EditorError::InvalidTransition { .. })
    ));
}

#[test]
fn test_add_arc_point_moves_draft_and_notifies() {
    let mut c = controller();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    c.add_observer(move || counter.set(counter.get() + 1));

    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    let after_start = calls.get();
    c.add_arc_point(12.0, 34.0).unwrap();

    assert_eq!(calls.get(), after_start + 1);
    let ArcDraftState::Drafting { arc_id, .. } = c.arc_state().clone() else {
        panic!("expected drafting state");
    };
    assert_eq!(
        c.net().arc(&arc_id).unwrap().target,
        ArcTarget::Temporary(Point::new(12.0, 34.0))
    );
}

#[test]
fn test_deleting_source_while_drafting_discards_draft() {
    let mut c = controller();
    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();

    c.delete(&ConnectableRef::place("P0").into()).unwrap();
    assert!(!c.is_currently_creating_arc());

    // Undo restores only the place, never the draft
    c.undo().unwrap();
    assert!(c.net().place("P0").is_some());
    assert_eq!(c.net().arcs().len(), 0);
}

#[test]
fn test_token_edits_while_drafting_undo_cleanly() {
    let mut c = controller();
    let arcs_of = |c: &PetriNetController| -> Vec<Arc> { c.net().arcs().cloned().collect() };
    let tokens_of = |c: &PetriNetController| -> Vec<Token> { c.net().tokens().cloned().collect() };

    c.start_creating_arc(ConnectableRef::place("P0")).unwrap();
    c.create_new_token("Default", true, Color::BLACK).unwrap();
    let ArcDraftState::Drafting { arc_id, .. } = c.arc_state().clone() else {
        panic!("token edits should not end the draft");
    };
    assert!(matches!(
        c.set_arc_weight(&arc_id, "Default", Some("1")),
        Err(EditorError::Net(NetError::UncommittedArc { .. }))
    ));

    let id = c
        .finish_creating_arc(ConnectableRef::transition("T0"))
        .unwrap();
    c.set_arc_weight(&id, "Default", Some("2")).unwrap();
    c.update_or_replace_tokens(vec![Token::new("Red", true, 1, Color::rgb(255, 0, 0))])
        .unwrap();

    let final_arcs = arcs_of(&c);
    let final_tokens = tokens_of(&c);
    assert!(final_arcs[0].weights.is_empty());

    while c.undo().unwrap() {}
    assert_eq!(c.net().arcs().len(), 0);
    assert_eq!(c.net().tokens().len(), 0);

    c.redo().unwrap();
    c.redo().unwrap();
    c.redo().unwrap();
    assert_eq!(
        c.net().arc(&id).unwrap().weights.get("Default").map(String::as_str),
        Some("2")
    );

    c.redo().unwrap();
    assert_eq!(arcs_of(&c), final_arcs);
    assert_eq!(tokens_of(&c), final_tokens);
}
