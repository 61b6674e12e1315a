use super::*;
use trc_parser::{ParseOptions, parse_source};

fn key_of_last_statement(source: &str) -> Option<String> {
    let file = parse_source("flow.trb", source, ParseOptions::default());
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    let last = *file.statements().last().expect("statement");
    reference_key(&file.arena, &file.source, last)
}

#[test]
fn mentions_matches_whole_names_only() {
    assert!(mentions("user", "user"));
    assert!(mentions("user.name", "user"));
    assert!(mentions("users[i]", "i"));
    assert!(!mentions("users[0]", "user"));
    assert!(!mentions("user_id", "user"));
    assert!(!mentions("other.user", "user"));
}

#[test]
fn mentions_instance_variables_after_a_dot() {
    assert!(mentions("@user", "@user"));
    assert!(!mentions("@users", "@user"));
    assert!(!mentions("user", "@user"));
}

#[test]
fn reference_keys_for_locals_and_ivars() {
    assert_eq!(key_of_last_statement("x = 1\nx\n").as_deref(), Some("x"));
    assert_eq!(key_of_last_statement("@name\n").as_deref(), Some("@name"));
    assert_eq!(key_of_last_statement("self\n").as_deref(), Some("self"));
}

#[test]
fn reference_keys_for_index_and_call_chains() {
    assert_eq!(
        key_of_last_statement("users = [1]\nusers[0]\n").as_deref(),
        Some("users[0]")
    );
    assert_eq!(
        key_of_last_statement("user = 1\nuser.name\n").as_deref(),
        Some("user.name")
    );
    assert_eq!(
        key_of_last_statement("user = 1\nuser&.name\n").as_deref(),
        Some("user&.name")
    );
    assert_eq!(
        key_of_last_statement("rows = [1]\ni = 0\nrows[i]\n").as_deref(),
        Some("rows[i]")
    );
}

#[test]
fn calls_with_arguments_have_no_key() {
    assert_eq!(key_of_last_statement("user = 1\nuser.fetch(1)\n"), None);
    assert_eq!(key_of_last_statement("1 + 2\n"), None);
}

#[test]
fn join_keeps_facts_both_sides_agree_on() {
    let mut left = FlowFacts::default();
    left.set("x".to_string(), TypeId::STRING);
    left.set("y".to_string(), TypeId::INTEGER);
    let mut right = FlowFacts::default();
    right.set("x".to_string(), TypeId::STRING);
    right.set("y".to_string(), TypeId::FLOAT);

    let joined = left.join(&right);
    assert_eq!(joined.get("x"), Some(TypeId::STRING));
    assert_eq!(joined.get("y"), None);
}

#[test]
fn kill_drops_every_fact_that_reads_the_variable() {
    let mut facts = FlowFacts::default();
    facts.set("user".to_string(), TypeId::STRING);
    facts.set("user.name".to_string(), TypeId::STRING);
    facts.set("users[0]".to_string(), TypeId::STRING);

    facts.kill("user");
    assert_eq!(facts.get("user"), None);
    assert_eq!(facts.get("user.name"), None);
    assert_eq!(facts.get("users[0]"), Some(TypeId::STRING));
}
