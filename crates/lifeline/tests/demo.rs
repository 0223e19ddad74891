use lifeline::demo::account_walkthrough;
use lifeline::{Action, Diagram, Marker};

#[test]
fn walkthrough_trace_is_balanced() {
    let trace = Diagram::build(account_walkthrough).unwrap();
    assert_eq!(trace.len(), 34);

    let calls = trace.iter().filter(|a| a.is_call()).count();
    let returns = trace.iter().filter(|a| a.is_return()).count();
    assert_eq!(calls, 11);
    assert_eq!(returns, calls);

    let mut open = Vec::new();
    for action in &trace {
        match action {
            Action::FragmentBegin { op_name, .. } => open.push(op_name.as_str()),
            Action::FragmentEnd { op_name } => assert_eq!(open.pop(), Some(op_name.as_str())),
            _ => {}
        }
    }
    assert!(open.is_empty());

    let branches = trace
        .markers()
        .iter()
        .filter(|m| matches!(m, Marker::Branch { .. }))
        .count();
    assert_eq!(branches, 4);
    assert_eq!(trace.markers().len(), 8);
}

#[test]
fn walkthrough_starts_with_opt_and_explicit_return() {
    let trace = Diagram::build(account_walkthrough).unwrap();
    let names: Vec<String> = trace.iter().take(8).map(ToString::to_string).collect();
    assert_eq!(
        names,
        vec![
            "opt begin",
            "call from foo to bar::func()",
            "implicit return",
            "call from foo to bar::func()",
            "call from bar to baz::func()",
            "implicit return",
            "return (a)",
            "opt end",
        ]
    );
}

#[cfg(feature = "render")]
#[test]
fn generate_plantuml_runs_an_isolated_session() {
    use lifeline::render::{PlantUmlOptions, generate_plantuml};

    let first = generate_plantuml(account_walkthrough, &PlantUmlOptions::default()).unwrap();
    let second = generate_plantuml(account_walkthrough, &PlantUmlOptions::default()).unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("@startuml\n"));
    assert!(first.ends_with("@enduml\n"));
}
