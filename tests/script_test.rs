//! Tests for running command scripts through the CLI layer

use dectree::application::services::{Outcome, Session};
use dectree::cli::commands::run_script;
use dectree::cli::CliError;
use dectree::domain::expected_value;
use dectree::exitcode;
use rstest::rstest;

const SCENARIO: &str = r#"
# expected value walk-through
add chance as C
add end under C as E1
set E1 outcome="high demand" payoff=200 probability=30
add end under C as E2
set E2 outcome="low demand" payoff=-50 probability=70
ev C
remove E1
ev C
"#;

#[test]
fn given_scenario_script_when_running_then_values_match() {
    let mut session = Session::default();
    let mut values = Vec::new();

    let executed = run_script(&mut session, SCENARIO, false, |outcome| {
        if let Outcome::Value { value, .. } = outcome {
            values.push(*value);
        }
    })
    .unwrap();

    assert_eq!(executed, 8);
    assert_eq!(values, vec![25.0, -35.0]);
    assert_eq!(expected_value(session.store(), "ID1"), -35.0);
}

#[test]
fn given_failing_line_when_running_then_stops_with_line_number() {
    let mut session = Session::default();
    let script = "add chance as C\nadd end under C as E\nadd end under E\nadd decision\n";

    let err = run_script(&mut session, script, false, |_| {}).unwrap_err();

    assert!(matches!(err, CliError::Script { line: 3, .. }));
    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert!(err.to_string().starts_with("line 3:"));
    // the line after the failure never ran
    assert_eq!(session.store().len(), 2);
}

#[test]
fn given_keep_going_when_running_then_continues_and_reports_failures() {
    let mut session = Session::default();
    let script = "add chance as C\nbogus\nset C payoff=oops\nadd decision\n";

    let err = run_script(&mut session, script, true, |_| {}).unwrap_err();

    assert!(matches!(err, CliError::ScriptFailures { failed: 2 }));
    assert_eq!(session.store().len(), 2);
}

#[rstest]
#[case("")]
#[case("\n\n# nothing here\n   \n")]
fn given_empty_script_when_running_then_nothing_executed(#[case] script: &str) {
    let mut session = Session::default();
    let executed = run_script(&mut session, script, false, |_| {}).unwrap();
    assert_eq!(executed, 0);
    assert!(session.store().is_empty());
}
