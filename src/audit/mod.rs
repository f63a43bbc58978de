pub mod labels;

use crate::catalog::{Rule, Severity};
use crate::errors::{FixtureError, FixtureResult};
use labels::{Cap, DataLabel, classify};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator};

thread_local! {
    static PARSER: RefCell<tree_sitter::Parser> = RefCell::new(tree_sitter::Parser::new());
}

const FUNCTION_QUERY: &str = "(function_item
    name: (identifier) @name
    parameters: (parameters) @params
    body: (block) @body) @function";

/// One unsanitised parameter-to-sink flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub source: String,
    pub function: String,
    pub line: usize,
    pub col: usize,
    pub rule: Rule,
    pub severity: Severity,
    pub sink: String,
}

/// Taint state per binding name. Parameters start with every capability.
type TaintMap = HashMap<String, Cap>;

enum Event<'t> {
    /// `pattern` takes the taint of `value`.
    Bind { pattern: Node<'t>, value: Node<'t> },
    Call(Node<'t>),
}

/// Parse `text` as Rust and report every call to a sink whose arguments
/// still carry the sink's capability.
pub fn audit_source(label: &str, text: &str) -> FixtureResult<Vec<Finding>> {
    tracing::debug!("Auditing: {label}");
    let bytes = text.as_bytes();
    let ts_lang = Language::from(tree_sitter_rust::LANGUAGE);

    let tree = PARSER.with(|cell| {
        let mut parser = cell.borrow_mut();
        parser.set_language(&ts_lang)?;
        parser
            .parse(bytes, None)
            .ok_or_else(|| FixtureError::Other("tree-sitter failed".into()))
    })?;

    let query = Query::new(&ts_lang, FUNCTION_QUERY)?;
    let index_of = |name: &str| {
        query
            .capture_index_for_name(name)
            .ok_or_else(|| FixtureError::Other(format!("missing capture @{name}")))
    };
    let (name_ix, params_ix, body_ix) = (index_of("name")?, index_of("params")?, index_of("body")?);

    let mut functions = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), bytes);
    while let Some(m) = matches.next() {
        let node = |ix: u32| m.captures.iter().find(|c| c.index == ix).map(|c| c.node);
        if let (Some(name), Some(params), Some(body)) = (node(name_ix), node(params_ix), node(body_ix)) {
            functions.push((name, params, body));
        }
    }

    let mut out = Vec::new();
    for (name, params, body) in functions {
        let function = text_of(name, bytes);
        audit_function(label, function, params, body, bytes, &mut out);
    }
    tracing::debug!("{label}: {} finding(s)", out.len());
    Ok(out)
}

fn audit_function(
    label: &str,
    function: &str,
    params: Node<'_>,
    body: Node<'_>,
    bytes: &[u8],
    out: &mut Vec<Finding>,
) {
    let mut taint = TaintMap::new();
    for param in named_children(params) {
        if param.kind() != "parameter" {
            continue;
        }
        if let Some(pattern) = param.child_by_field_name("pattern") {
            for ident in bindings(pattern, bytes) {
                taint.insert(ident.to_owned(), Cap::all());
            }
        }
    }
    if taint.is_empty() {
        return;
    }

    let mut events = Vec::new();
    collect_events(body, &mut events);
    // bindings land where their pattern is complete, sinks fire where they start
    events.sort_by_key(|(pos, _)| *pos);

    for (_, event) in events {
        match event {
            Event::Bind { pattern, value } => {
                let cap = expr_taint(value, bytes, &taint, false);
                for ident in bindings(pattern, bytes) {
                    taint.insert(ident.to_owned(), cap);
                }
            }
            Event::Call(call) => {
                let Some(callee) = call.child_by_field_name("function").and_then(|f| callee_text(f, bytes)) else {
                    continue;
                };
                let Some(DataLabel::Sink(required)) = classify(callee) else {
                    continue;
                };
                let Some(args) = call.child_by_field_name("arguments") else {
                    continue;
                };
                if !expr_taint(args, bytes, &taint, false).intersects(required) {
                    continue;
                }
                let point = call.start_position();
                out.push(Finding {
                    source: label.to_owned(),
                    function: function.to_owned(),
                    line: point.row + 1,
                    col: point.column + 1,
                    rule: Rule::for_cap(required),
                    severity: Severity::High,
                    sink: callee.to_owned(),
                });
            }
        }
    }
}

fn collect_events<'t>(node: Node<'t>, events: &mut Vec<(usize, Event<'t>)>) {
    for child in named_children(node) {
        let pattern = child.child_by_field_name("pattern");
        let value = child.child_by_field_name("value");
        match (child.kind(), pattern, value) {
            // nested items are audited on their own
            ("function_item", ..) => continue,
            ("let_declaration" | "let_condition", Some(pattern), Some(value)) => {
                events.push((child.end_byte(), Event::Bind { pattern, value }));
            }
            ("for_expression", Some(pattern), Some(value)) => {
                events.push((value.end_byte(), Event::Bind { pattern, value }));
            }
            ("match_expression", _, Some(scrutinee)) => {
                let arms = child.child_by_field_name("body").map(named_children).unwrap_or_default();
                for arm in arms {
                    if let Some(pattern) = arm.child_by_field_name("pattern") {
                        events.push((pattern.end_byte(), Event::Bind { pattern, value: scrutinee }));
                    }
                }
            }
            ("call_expression", ..) => events.push((child.start_byte(), Event::Call(child))),
            _ => {}
        }
        collect_events(child, events);
    }
}

/// Capabilities an expression still carries: the union over every tainted
/// binding it mentions. A sanitizer call strips its capability from its own
/// result only, never from sibling operands.
fn expr_taint(node: Node<'_>, bytes: &[u8], taint: &TaintMap, in_macro: bool) -> Cap {
    let lookup = |name: &str| taint.get(name).copied().unwrap_or(Cap::empty());

    match node.kind() {
        "identifier" if in_macro && follows_field_dot(node, bytes) => return Cap::empty(),
        "identifier" => return lookup(text_of(node, bytes)),
        "string_literal" if in_macro => {
            return format_placeholders(text_of(node, bytes))
                .into_iter()
                .fold(Cap::empty(), |acc, name| acc | lookup(name));
        }
        // a block evaluates to its tail expression
        "block" => {
            return block_tail(node, bytes)
                .map_or(Cap::empty(), |tail| expr_taint(tail, bytes, taint, in_macro));
        }
        "match_expression" => {
            let arms = node.child_by_field_name("body").map(named_children).unwrap_or_default();
            return arms
                .into_iter()
                .filter_map(|arm| arm.child_by_field_name("value"))
                .fold(Cap::empty(), |acc, v| acc | expr_taint(v, bytes, taint, in_macro));
        }
        "if_expression" => {
            return ["consequence", "alternative"]
                .into_iter()
                .filter_map(|field| node.child_by_field_name(field))
                .fold(Cap::empty(), |acc, branch| acc | expr_taint(branch, bytes, taint, in_macro));
        }
        _ => {}
    }

    let in_macro = in_macro || node.kind() == "token_tree";
    let carried = named_children(node)
        .into_iter()
        .fold(Cap::empty(), |acc, child| acc | expr_taint(child, bytes, taint, in_macro));

    match sanitizer_cap(node, bytes) {
        Some(cap) => carried - cap,
        None => carried,
    }
}

fn sanitizer_cap(node: Node<'_>, bytes: &[u8]) -> Option<Cap> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = node.child_by_field_name("function").and_then(|f| callee_text(f, bytes))?;
    match classify(callee)? {
        DataLabel::Sanitizer(cap) => Some(cap),
        DataLabel::Sink(_) => None,
    }
}

/// Tail expression of a block, if it has one. A trailing `;` discards it.
fn block_tail<'t>(block: Node<'t>, bytes: &[u8]) -> Option<Node<'t>> {
    let last = named_children(block)
        .into_iter()
        .rev()
        .find(|n| !n.kind().ends_with("comment"))?;
    match last.kind() {
        "expression_statement" if bytes.get(last.end_byte().wrapping_sub(1)) == Some(&b';') => None,
        "expression_statement" => last.named_child(0),
        "let_declaration" | "empty_statement" | "macro_definition" => None,
        kind if kind.ends_with("_item") => None,
        _ => Some(last),
    }
}

/// `x.name` inside a token tree: `name` is a field, not a binding. `a..name`
/// is a range and still counts.
fn follows_field_dot(node: Node<'_>, bytes: &[u8]) -> bool {
    let mut before = bytes[..node.start_byte()]
        .iter()
        .rev()
        .skip_while(|b| b.is_ascii_whitespace());
    before.next() == Some(&b'.') && before.next() != Some(&b'.')
}

/// `Command::new`, `validate_host`, or the method name of `x.arg(..)`.
fn callee_text<'a>(function: Node<'_>, bytes: &'a [u8]) -> Option<&'a str> {
    match function.kind() {
        "identifier" | "scoped_identifier" => Some(text_of(function, bytes)),
        "field_expression" => function.child_by_field_name("field").map(|f| text_of(f, bytes)),
        "generic_function" => function
            .child_by_field_name("function")
            .and_then(|f| callee_text(f, bytes)),
        _ => None,
    }
}

/// Named placeholders in a format string: `{host}`, `{host:?}`. Escaped
/// braces and positional `{}` are skipped.
fn format_placeholders(lit: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = lit;
    while let Some(open) = rest.find('{') {
        rest = &rest[open + 1..];
        if let Some(after) = rest.strip_prefix('{') {
            rest = after;
            continue;
        }
        let end = rest.find(['}', ':']).unwrap_or(rest.len());
        let name = rest[..end].trim();
        let is_ident = name.starts_with(|c: char| c.is_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if is_ident {
            out.push(name);
        }
        rest = &rest[end..];
    }
    out
}

/// Names a pattern binds. Variant and struct paths (`Some`, `Ok`) and match
/// guards are not bindings.
fn bindings<'a>(pattern: Node<'_>, bytes: &'a [u8]) -> Vec<&'a str> {
    if pattern.kind() == "identifier" {
        return vec![text_of(pattern, bytes)];
    }
    let skip = match pattern.kind() {
        "tuple_struct_pattern" | "struct_pattern" => pattern.child_by_field_name("type"),
        "match_pattern" => pattern.child_by_field_name("condition"),
        _ => None,
    };
    named_children(pattern)
        .into_iter()
        .filter(|child| Some(*child) != skip)
        .flat_map(|child| bindings(child, bytes))
        .collect()
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn text_of<'a>(node: Node<'_>, bytes: &'a [u8]) -> &'a str {
    node.utf8_text(bytes).unwrap_or_default()
}

#[test]
fn format_placeholders_picks_named_arguments() {
    assert_eq!(format_placeholders("\"ping -c {} {host}\""), vec!["host"]);
    assert_eq!(format_placeholders("\"{cmd:?} {{literal}} {0}\""), vec!["cmd"]);
    assert!(format_placeholders("\"no braces\"").is_empty());
}

#[test]
fn flags_parameter_reaching_shell() {
    let src = r#"
        fn run(cmd: &str) {
            Command::new("sh").arg("-c").arg(cmd).spawn();
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();

    assert_eq!(findings.len(), 1);
    let f = &findings[0];
    assert_eq!(f.function, "run");
    assert_eq!(f.rule, Rule::CommandInjection);
    assert_eq!(f.sink, "arg");
    assert_eq!(f.line, 3);
}

#[test]
fn taint_flows_through_let_and_inline_format_args() {
    let src = r#"
        fn ping(host: &str) {
            let target = host;
            let line = format!("ping -c 4 {target}");
            Command::new("sh").arg("-c").arg(&line).spawn();
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].line, 5);
}

#[test]
fn sanitizer_only_strips_its_own_capability() {
    let src = r#"
        fn both(host: &str) {
            let host = validate_host(host);
            Command::new("ping").arg(&host).spawn();
            File::open(&host);
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, Rule::PathTraversal);
    assert_eq!(findings[0].sink, "File::open");
}

#[test]
fn rebinding_after_the_sink_does_not_clean_it() {
    let src = r#"
        fn late(p: &str) {
            File::open(p);
            let p = confine_to_base(base, p);
            File::open(p);
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].line, 3);
}

#[test]
fn constants_and_fields_are_not_tainted() {
    let src = r#"
        fn fixed(&self, name: &str) {
            Command::new(&self.shell).arg("-c").arg("uptime").spawn();
            File::open(format!("{}{}", self.base, "index.html"));
        }
    "#;
    assert!(audit_source("inline.rs", src).unwrap().is_empty());
}

#[test]
fn canonicalising_only_the_base_keeps_the_join_tainted() {
    let src = r#"
        fn serve(name: &str) {
            File::open(Path::new("/srv").canonicalize().unwrap().join(name));
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule, Rule::PathTraversal);

    let confined = r#"
        fn serve(name: &str) {
            File::open(Path::new("/srv").join(name).canonicalize().unwrap());
        }
    "#;
    assert!(audit_source("inline.rs", confined).unwrap().is_empty());
}

#[test]
fn if_let_and_while_let_bindings_carry_taint() {
    let src = r#"
        fn do_get(request: &Request) {
            if let Some(f) = request.param("file") {
                File::open(f);
            }
        }

        fn drain(mut names: Vec<String>) {
            while let Some(n) = names.pop() {
                File::open(&n);
            }
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();
    let functions: Vec<_> = findings.iter().map(|f| f.function.as_str()).collect();
    assert_eq!(functions, vec!["do_get", "drain"]);
}

#[test]
fn match_arm_bindings_take_the_scrutinee_taint() {
    let src = r#"
        fn pick(cmd: Option<&str>) {
            match cmd {
                Some(c) if !c.is_empty() => {
                    Command::new(c).spawn();
                }
                _ => {}
            }
        }
    "#;
    let findings = audit_source("inline.rs", src).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].sink, "Command::new");
}

#[test]
fn match_on_a_sanitizer_with_a_diverging_arm_stays_clean() {
    let src = r#"
        fn confined(base: &Path, name: &str) {
            let resolved = match confine_to_base(base, name) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, name, "rejected");
                    return;
                }
            };
            File::open(&resolved);
        }
    "#;
    assert!(audit_source("inline.rs", src).unwrap().is_empty());
}

#[test]
fn for_loop_pattern_carries_taint() {
    let src = r#"
        fn each(names: &[String]) {
            for n in names {
                File::open(n);
            }
        }
    "#;
    assert_eq!(audit_source("inline.rs", src).unwrap().len(), 1);
}

#[test]
fn field_names_in_macros_are_not_bindings() {
    let field = r#"
        fn show(&self, host: &str) {
            Command::new(format!("{}", self.host)).spawn();
        }
    "#;
    assert!(audit_source("inline.rs", field).unwrap().is_empty());

    let binding = r#"
        fn show(&self, host: &str) {
            Command::new(format!("{}", host)).spawn();
        }
    "#;
    assert_eq!(audit_source("inline.rs", binding).unwrap().len(), 1);
}
