//! Tests for the editing Session and the command language

use dectree::application::services::{Outcome, Session};
use dectree::application::{ApplicationError, Command, Target};
use dectree::config::Settings;
use dectree::domain::{DomainError, NodeFields, NodeId, NodeKind};

fn run(session: &mut Session, line: &str) -> Outcome {
    session
        .execute_line(line)
        .unwrap_or_else(|e| panic!("'{}' failed: {}", line, e))
        .unwrap_or_else(|| panic!("'{}' produced no outcome", line))
}

fn created_id(outcome: Outcome) -> NodeId {
    match outcome {
        Outcome::Created { id, .. } => id,
        other => panic!("expected Created, got {:?}", other),
    }
}

// ============================================================
// Selection and add
// ============================================================

#[test]
fn given_no_selection_when_adding_then_creates_root_of_pending_kind() {
    let mut session = Session::default();

    let outcome = run(&mut session, "add");

    assert_eq!(
        outcome,
        Outcome::Created {
            id: NodeId::from("ID1"),
            kind: NodeKind::Decision,
            parent: None
        }
    );
}

#[test]
fn given_selection_when_adding_then_attaches_to_selected_node() {
    let mut session = Session::default();
    let chance = created_id(run(&mut session, "add chance"));
    run(&mut session, &format!("select {}", chance));
    run(&mut session, "kind end");

    let outcome = run(&mut session, "add");

    assert_eq!(
        outcome,
        Outcome::Created {
            id: NodeId::from("ID2"),
            kind: NodeKind::End,
            parent: Some(chance)
        }
    );
    assert_eq!(session.store().find("ID2").unwrap().level(), 2);
}

#[test]
fn given_root_selected_when_adding_then_creates_root() {
    let mut session = Session::default();
    let first = created_id(run(&mut session, "add chance as C"));
    run(&mut session, "select C");
    run(&mut session, "select root");

    run(&mut session, "add decision");

    assert_eq!(session.selection(), Some(&Target::Root));
    assert_eq!(session.store().roots().len(), 2);
    assert_eq!(session.store().find(first.as_str()).unwrap().child_count(), 0);
}

#[test]
fn given_explicit_parent_when_adding_then_overrides_selection() {
    let mut session = Session::default();
    run(&mut session, "add chance as A");
    run(&mut session, "add chance as B");
    run(&mut session, "select A");

    let outcome = run(&mut session, "add end under B as E");

    let b = session.alias("B").cloned();
    assert!(matches!(outcome, Outcome::Created { parent, .. } if parent == b));
}

#[test]
fn given_unknown_node_when_selecting_then_not_found() {
    let mut session = Session::default();

    let err = session.execute_line("select ghost").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NotFound(ref id)) if id.as_str() == "ghost"
    ));
    assert_eq!(session.selection(), None);
}

#[test]
fn given_end_node_when_adding_under_it_then_invalid_operation() {
    let mut session = Session::default();
    run(&mut session, "add chance as C");
    run(&mut session, "add end under C as E");

    let err = session.execute_line("add decision under E").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidOperation { .. })
    ));
}

#[test]
fn given_alias_shaped_like_next_id_when_adding_then_generator_skips_it() {
    let mut session = Session::default();
    run(&mut session, "add chance as ID2");

    let second = created_id(run(&mut session, "add chance"));
    let outcome = run(&mut session, "add end under ID2");

    assert_eq!(second.as_str(), "ID3");
    assert_eq!(
        outcome,
        Outcome::Created {
            id: NodeId::from("ID4"),
            kind: NodeKind::End,
            parent: Some(NodeId::from("ID1"))
        }
    );
    assert_eq!(session.store().find("ID3").unwrap().child_count(), 0);
}

#[test]
fn given_live_node_id_as_alias_when_adding_then_invalid_command() {
    let mut session = Session::default();
    run(&mut session, "add chance");
    run(&mut session, "add chance");

    let err = session.execute_line("add end under ID2 as ID1").unwrap_err();

    assert!(matches!(err, ApplicationError::InvalidCommand { .. }));
    assert_eq!(session.alias("ID1"), None);
    assert_eq!(session.store().len(), 2);
}

#[test]
fn given_root_keyword_as_alias_when_adding_then_invalid_command() {
    let mut session = Session::default();

    for line in ["add chance as root", "add chance as ROOT"] {
        let err = session.execute_line(line).unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidCommand { .. }), "{}", line);
    }
    assert!(session.store().is_empty());
}

// ============================================================
// set / find / ev
// ============================================================

#[test]
fn given_alias_when_setting_fields_then_node_updated() {
    let mut session = Session::default();
    run(&mut session, "add chance as C");
    run(&mut session, "add end under C as E");

    run(&mut session, r#"set E outcome="launch succeeds" payoff=200 probability=30"#);
    run(&mut session, r#"set C note="market test""#);

    let e = session.alias("E").unwrap().clone();
    assert_eq!(
        session.store().find(e.as_str()).unwrap().fields(),
        &NodeFields::End {
            outcome: "launch succeeds".into(),
            probability_percent: 30.0,
            payoff: 200.0
        }
    );
    assert_eq!(
        run(&mut session, "ev C"),
        Outcome::Value {
            id: "ID1".into(),
            value: 60.0
        }
    );
    assert_eq!(
        run(&mut session, "find C"),
        Outcome::Node("ID1 [chance] EV=60.00 \"market test\"".into())
    );
}

#[test]
fn given_unknown_reference_when_setting_then_not_found() {
    let mut session = Session::default();
    let err = session.execute_line("set X1 payoff=1").unwrap_err();
    assert!(matches!(err, ApplicationError::Domain(DomainError::NotFound(_))));
}

#[test]
fn given_unknown_reference_when_evaluating_then_zero() {
    let mut session = Session::default();
    assert_eq!(
        run(&mut session, "ev X1"),
        Outcome::Value {
            id: "X1".into(),
            value: 0.0
        }
    );
}

// ============================================================
// remove
// ============================================================

#[test]
fn given_selection_when_removing_without_argument_then_removes_selected_subtree() {
    let mut session = Session::default();
    run(&mut session, "add chance as C");
    run(&mut session, "add end under C as E");
    run(&mut session, "select C");

    let outcome = run(&mut session, "remove");

    assert_eq!(
        outcome,
        Outcome::Removed {
            target: Some("ID1".into()),
            count: 2
        }
    );
    assert!(session.store().is_empty());
    assert_eq!(session.selection(), None);
    assert!(session.alias("C").is_none());
    assert!(session.alias("E").is_none());
}

#[test]
fn given_nothing_selected_when_removing_then_noop() {
    let mut session = Session::default();
    run(&mut session, "add chance");

    let outcome = run(&mut session, "remove");

    assert_eq!(
        outcome,
        Outcome::Removed {
            target: None,
            count: 0
        }
    );
    assert_eq!(session.store().len(), 1);
}

#[test]
fn given_root_selected_when_removing_then_noop_and_selection_cleared() {
    let mut session = Session::default();
    run(&mut session, "add chance");
    run(&mut session, "select root");

    let outcome = run(&mut session, "remove");

    assert_eq!(
        outcome,
        Outcome::Removed {
            target: None,
            count: 0
        }
    );
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.selection(), None);
}

// ============================================================
// listings
// ============================================================

#[test]
fn given_tree_when_listing_then_indented_preorder() {
    let mut session = Session::default();
    run(&mut session, "add decision as D");
    run(&mut session, "add chance under D as C");
    run(&mut session, "add end under C");
    run(&mut session, "add end under root");

    let outcome = run(&mut session, "list");

    assert_eq!(
        outcome,
        Outcome::Listing(vec![
            "ID1 [decision]".into(),
            "  ID2 [chance] EV=0.00".into(),
            "    ID3 [end] p=0% payoff=0".into(),
            "ID4 [end] p=0% payoff=0".into(),
        ])
    );
}

#[test]
fn given_tree_when_rendering_then_shows_root_and_expected_values() {
    let mut session = Session::default();
    run(&mut session, "add chance as C");
    run(&mut session, "add end under C as E");
    run(&mut session, "set E payoff=100 probability=50");

    let Outcome::Tree(rendered) = run(&mut session, "tree") else {
        panic!("expected a tree");
    };

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "Root Node");
    assert!(lines[1].ends_with("ID1 [chance] EV=50.00"), "{}", lines[1]);
    assert!(lines[2].ends_with("ID2 [end] p=50% payoff=100"), "{}", lines[2]);
}

#[test]
fn given_precision_setting_when_rendering_then_uses_it() {
    let settings = Settings::from_toml("[display]\nprecision = 0\n[ids]\nprefix = \"N\"\n").unwrap();
    let mut session = Session::new(&settings);
    run(&mut session, "add chance");

    assert_eq!(run(&mut session, "find N1"), Outcome::Node("N1 [chance] EV=0".into()));
}

#[test]
fn given_commands_when_parsing_then_comments_are_skipped() {
    let mut session = Session::default();
    assert_eq!(session.execute_line("# just a comment").unwrap(), None);
    assert_eq!(Command::parse("help").unwrap(), Some(Command::Help));
    assert_eq!(run(&mut session, "help"), Outcome::Help);
}
