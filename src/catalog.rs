use crate::audit::labels::Cap;
use crate::audit::{Finding, audit_source};
use crate::errors::FixtureResult;
use crate::fixtures::FixtureSource;
use console::{StyledObject, style};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Coloured for the console. Width and alignment still apply.
    pub fn styled(self) -> StyledObject<Severity> {
        match self {
            Severity::High => style(self).red().bold(),
            Severity::Medium => style(self).yellow().bold(),
            Severity::Low => style(self).cyan().bold(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    CommandInjection,
    PathTraversal,
}

impl Rule {
    /// Stable rule identifier, as a scanner would report it.
    pub fn id(self) -> &'static str {
        match self {
            Rule::CommandInjection => "command-injection",
            Rule::PathTraversal => "path-traversal",
        }
    }

    pub(crate) fn for_cap(cap: Cap) -> Self {
        if cap.contains(Cap::SHELL) {
            Rule::CommandInjection
        } else {
            Rule::PathTraversal
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.id())
    }
}

/// What an audit of a fixture function must report.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Expect {
    /// Exactly this many sink sites.
    Flagged { sites: usize },
    /// Negative control: nothing.
    Clean,
}

impl Expect {
    pub fn sites(self) -> usize {
        match self {
            Expect::Flagged { sites } => sites,
            Expect::Clean => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    /// Unique identifier (kebab-case).
    pub id: &'static str,
    /// Key into `fixtures::SOURCES`.
    pub fixture: &'static str,
    /// Function the sinks live in.
    pub function: &'static str,
    pub rule: Rule,
    pub severity: Severity,
    pub expect: Expect,
    /// Human-readable explanation.
    pub description: &'static str,
}

pub const EXPECTATIONS: &[Expectation] = &[
    Expectation {
        id: "cmd-ping-shell-concat",
        fixture: "command",
        function: "ping_host",
        rule: Rule::CommandInjection,
        severity: Severity::High,
        expect: Expect::Flagged { sites: 1 },
        description: "host concatenated into a `sh -c` ping line",
    },
    Expectation {
        id: "cmd-convert-direct-arg",
        fixture: "command",
        function: "process_file",
        rule: Rule::CommandInjection,
        severity: Severity::High,
        expect: Expect::Flagged { sites: 1 },
        description: "filename passed straight to the convert program",
    },
    Expectation {
        id: "cmd-shell-wrap",
        fixture: "command",
        function: "execute_command",
        rule: Rule::CommandInjection,
        severity: Severity::High,
        expect: Expect::Flagged { sites: 1 },
        description: "arbitrary input run via `sh -c`",
    },
    Expectation {
        id: "cmd-backup-shell-concat",
        fixture: "command",
        function: "backup_file",
        rule: Rule::CommandInjection,
        severity: Severity::High,
        expect: Expect::Flagged { sites: 1 },
        description: "filename concatenated into a `tar` shell line",
    },
    Expectation {
        id: "path-get-concat-and-raw",
        fixture: "path",
        function: "do_get",
        rule: Rule::PathTraversal,
        severity: Severity::High,
        expect: Expect::Flagged { sites: 2 },
        description: "`file` appended to the data dir, `path` opened as is",
    },
    Expectation {
        id: "path-static-join",
        fixture: "path",
        function: "serve_static",
        rule: Rule::PathTraversal,
        severity: Severity::High,
        expect: Expect::Flagged { sites: 1 },
        description: "`resource` joined onto the static dir (absolute paths replace it)",
    },
    Expectation {
        id: "control-ping-allow-list",
        fixture: "controls",
        function: "ping_host",
        rule: Rule::CommandInjection,
        severity: Severity::High,
        expect: Expect::Clean,
        description: "allow-listed host, argument array, no shell",
    },
    Expectation {
        id: "control-get-confined",
        fixture: "controls",
        function: "do_get",
        rule: Rule::PathTraversal,
        severity: Severity::High,
        expect: Expect::Clean,
        description: "canonicalised and prefix-checked against the data dir",
    },
];

/// Expectations for one fixture (case-insensitive). Unknown fixtures yield
/// an **empty** `Vec`.
pub fn load(fixture: &str) -> Vec<Expectation> {
    EXPECTATIONS
        .iter()
        .filter(|e| e.fixture.eq_ignore_ascii_case(fixture))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub id: String,
    pub fixture: String,
    pub function: String,
    pub rule: Rule,
    pub expected: usize,
    pub found: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
    /// Findings no `Flagged` expectation accounts for.
    pub unexpected: Vec<Finding>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.unexpected.is_empty() && self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count() + self.unexpected.len()
    }
}

/// Audit each source and hold the result against the catalog.
pub fn verify(sources: &[FixtureSource]) -> FixtureResult<Report> {
    let mut report = Report::default();

    for source in sources {
        let findings = audit_source(source.path, source.text)?;
        let expectations = load(source.name);

        for e in &expectations {
            let found = findings
                .iter()
                .filter(|f| f.function == e.function && f.rule == e.rule)
                .count();
            let expected = e.expect.sites();
            if found != expected {
                tracing::warn!(id = e.id, expected, found, "expectation not met");
            }
            report.outcomes.push(Outcome {
                id: e.id.to_owned(),
                fixture: e.fixture.to_owned(),
                function: e.function.to_owned(),
                rule: e.rule,
                expected,
                found,
                passed: found == expected,
            });
        }

        report.unexpected.extend(findings.into_iter().filter(|f| {
            !expectations.iter().any(|e| {
                matches!(e.expect, Expect::Flagged { .. })
                    && f.function == e.function
                    && f.rule == e.rule
            })
        }));
    }

    Ok(report)
}

#[test]
fn load_is_case_insensitive_and_empty_for_unknown() {
    let command = load("command");
    assert_eq!(command.len(), 4);
    assert!(command.iter().all(|e| e.rule == Rule::CommandInjection));
    assert_eq!(load("COMMAND"), command);
    assert!(load("sql").is_empty());
}

#[test]
fn severity_and_rule_respect_column_width() {
    assert_eq!(format!("{:8}|", Severity::High), "HIGH    |");
    assert_eq!(format!("{:>6}|", Severity::Low), "   LOW|");
    assert_eq!(format!("{:18}|", Rule::PathTraversal), "path-traversal    |");
}

#[test]
fn expectation_ids_are_unique() {
    let mut ids: Vec<_> = EXPECTATIONS.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), EXPECTATIONS.len());
}

#[test]
fn every_expectation_points_at_an_embedded_fixture() {
    for e in EXPECTATIONS {
        let source = crate::fixtures::source(e.fixture).expect("fixture exists");
        assert!(
            source.text.contains(&format!("fn {}(", e.function)),
            "{} has no fn {}",
            source.path,
            e.function
        );
    }
}

#[test]
fn embedded_fixtures_match_the_catalog() {
    let report = verify(crate::fixtures::SOURCES).unwrap();

    assert_eq!(report.outcomes.len(), EXPECTATIONS.len());
    for o in &report.outcomes {
        assert!(o.passed, "{}: expected {} found {}", o.id, o.expected, o.found);
    }
    assert!(report.unexpected.is_empty(), "unexpected: {:?}", report.unexpected);
    assert!(report.passed());
}

#[test]
fn ping_chaining_scenario_is_flagged() {
    let source = crate::fixtures::source("command").unwrap();
    let findings = audit_source(source.path, source.text).unwrap();

    let ping: Vec<_> = findings.iter().filter(|f| f.function == "ping_host").collect();
    assert_eq!(ping.len(), 1);
    assert_eq!(ping[0].rule, Rule::CommandInjection);
    assert_eq!(ping[0].severity, Severity::High);
}

#[test]
fn both_file_access_sites_in_do_get_are_flagged() {
    let source = crate::fixtures::source("path").unwrap();
    let findings = audit_source(source.path, source.text).unwrap();

    let sites: Vec<_> = findings.iter().filter(|f| f.function == "do_get").collect();
    assert_eq!(sites.len(), 2);
    assert!(sites.iter().all(|f| f.sink == "File::open" && f.rule == Rule::PathTraversal));
    assert_ne!(sites[0].line, sites[1].line);
}

#[test]
fn sanitising_the_sink_silences_the_rule() {
    let vulnerable = r#"
        fn ping_host(host: &str) {
            let line = format!("ping -c 4 {host}");
            Command::new("sh").arg("-c").arg(&line).spawn();
        }
    "#;
    let sanitised = r#"
        fn ping_host(host: &str) {
            let host = validate_host(host);
            Command::new("ping").arg("-c").arg("4").arg(&host).spawn();
        }
    "#;
    assert_eq!(audit_source("v.rs", vulnerable).unwrap().len(), 1);
    assert!(audit_source("s.rs", sanitised).unwrap().is_empty());
}

#[test]
fn a_missing_sink_fails_verification() {
    let stripped = FixtureSource {
        name: "path",
        path: "stripped.rs",
        text: "fn do_get(request: &Request) {} fn serve_static(request: &Request) {}",
    };
    let report = verify(&[stripped]).unwrap();

    assert!(!report.passed());
    assert_eq!(report.failures(), 2);
}

#[test]
fn report_serialises_to_toml() {
    let report = verify(crate::fixtures::SOURCES).unwrap();
    let text = toml::to_string(&report).unwrap();
    assert!(text.contains("[[outcomes]]"));
    assert!(text.contains("rule = \"path-traversal\""));
}
