pub mod command;
pub mod controls;
pub mod path;
pub mod request;

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Fixture source text compiled into the binary, so `verify` audits exactly
/// what was built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureSource {
  /// Short key used by the catalog ("command", "path", ...).
  pub name: &'static str,
  /// Path relative to the crate root, for diagnostics.
  pub path: &'static str,
  pub text: &'static str,
}

pub const SOURCES: &[FixtureSource] = &[
  FixtureSource {
    name: "command",
    path: "src/fixtures/command.rs",
    text: include_str!("command.rs"),
  },
  FixtureSource {
    name: "path",
    path: "src/fixtures/path.rs",
    text: include_str!("path.rs"),
  },
  FixtureSource {
    name: "controls",
    path: "src/fixtures/controls.rs",
    text: include_str!("controls.rs"),
  },
];

static REGISTRY: Lazy<HashMap<&'static str, &'static FixtureSource>> = Lazy::new(|| {
  let m: HashMap<_, _> = SOURCES.iter().map(|s| (s.name, s)).collect();
  tracing::debug!("fixture registry initialised ({} sources)", m.len());
  m
});

/// Look up an embedded fixture by name (case-insensitive).
pub fn source(name: &str) -> Option<&'static FixtureSource> {
  let key = name.to_ascii_lowercase();
  REGISTRY.get(key.as_str()).copied()
}

#[test]
fn every_source_is_registered_and_non_empty() {
  for s in SOURCES {
    let found = source(s.name).expect("registered");
    assert_eq!(found.path, s.path);
    assert!(found.text.contains("fn "), "{} looks empty", s.path);
  }
  assert_eq!(source("COMMAND").map(|s| s.name), Some("command"));
  assert!(source("sql").is_none());
}
