//! Testing utilities for the settings workspace
//!
//! Shared document fixtures, step builders and assertions.

#![allow(missing_docs)]

use settings_migration::{LambdaStep, MigrationEngine, MigrationStep, MoveKey};
use settings_tree::{ConfigPath, ConfigTree, DECLARATION};

/// Wrap element lines in a `<config>` root with the standard declaration
pub fn config_text(lines: &[&str]) -> String {
    let mut text = String::from(DECLARATION);
    text.push_str("\n<config>\n");
    for line in lines {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("</config>\n");
    text
}

pub fn parse(text: &str) -> ConfigTree {
    ConfigTree::parse(text).unwrap()
}

pub fn config(lines: &[&str]) -> ConfigTree {
    parse(&config_text(lines))
}

/// Canonical rendering of `text`
pub fn canonical(text: &str) -> String {
    parse(text).to_text()
}

pub fn path(s: &str) -> ConfigPath {
    s.parse().unwrap()
}

pub fn move_key(from: &str, to: &str) -> MoveKey {
    MoveKey::new(from, to).unwrap()
}

/// Lambda that multiplies the integer at `at` by `factor`
pub fn scale_lambda(at: &'static str, factor: i64) -> LambdaStep {
    LambdaStep::labeled(format!("scale {at} by {factor}"), move |helper, tree| {
        let value: i64 = helper.value(tree, at, 0);
        helper.set_value(tree, at, value * factor)
    })
}

/// Lambda that adds `delta` to the integer at `at`
pub fn offset_lambda(at: &'static str, delta: i64) -> LambdaStep {
    LambdaStep::labeled(format!("offset {at} by {delta}"), move |helper, tree| {
        let value: i64 = helper.value(tree, at, 0);
        helper.set_value(tree, at, value + delta)
    })
}

/// Engine with one move per `(version, from, to)` entry, in order
pub fn move_engine(moves: &[(u32, &str, &str)]) -> MigrationEngine {
    let mut engine = MigrationEngine::new();
    for &(version, from, to) in moves {
        engine.register(version, move_key(from, to)).unwrap();
    }
    engine
}

pub fn engine_with<S>(steps: Vec<(u32, S)>) -> MigrationEngine
where
    S: MigrationStep + 'static,
{
    let mut engine = MigrationEngine::new();
    for (version, step) in steps {
        engine.register(version, step).unwrap();
    }
    engine
}

/// Migrate `before` to `target` and compare with `after` in canonical form
pub fn assert_migrates(engine: &MigrationEngine, before: &str, target: u32, after: &str) {
    let mut tree = parse(before);
    engine.migrate(&mut tree, target).unwrap();
    pretty_assertions::assert_eq!(tree.to_text(), canonical(after));
}

/// Compare a tree with expected text in canonical form
pub fn assert_document(tree: &ConfigTree, expected: &str) {
    pretty_assertions::assert_eq!(tree.to_text(), canonical(expected));
}
