use bitflags::bitflags;

bitflags! {
    /// What a value can still do harm to. Sinks require a capability,
    /// sanitizers strip one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cap: u8 {
        const SHELL     = 0b0000_0001;
        const FILE_PATH = 0b0000_0010;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLabel {
    Sanitizer(Cap),
    Sink(Cap),
}

/// If a callee's text equals (or ends with, on a `::`/`.` boundary) one of
/// the `matchers`, the call gets `label`.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub matchers: &'static [&'static str],
    pub label: DataLabel,
}

pub static RULES: &[LabelRule] = &[
    // ───────── Sanitizers ──────────
    LabelRule {
        matchers: &["validate_host", "shell_escape::unix::escape", "sanitize_shell"],
        label: DataLabel::Sanitizer(Cap::SHELL),
    },
    LabelRule {
        matchers: &["canonicalize", "confine_to_base"],
        label: DataLabel::Sanitizer(Cap::FILE_PATH),
    },
    // ─────────── Sinks ─────────────
    LabelRule {
        matchers: &["command::new", "arg", "args"],
        label: DataLabel::Sink(Cap::SHELL),
    },
    LabelRule {
        matchers: &["file::open", "file::create", "fs::read", "fs::read_to_string", "open"],
        label: DataLabel::Sink(Cap::FILE_PATH),
    },
];

/// Classify a callee (`Command::new`, `std::fs::read`, `arg`, ...).
pub fn classify(text: &str) -> Option<DataLabel> {
    let head = text.split(['(', '<']).next().unwrap_or("");
    let text_lc = head.trim().to_ascii_lowercase();

    for rule in RULES {
        for raw in rule.matchers {
            let m = raw.to_ascii_lowercase();

            if text_lc.ends_with(&m) {
                let start = text_lc.len() - m.len();
                let ok = start == 0 || matches!(text_lc.as_bytes()[start - 1], b'.' | b':');
                if ok {
                    return Some(rule.label);
                }
            }
        }
    }
    None
}

#[test]
fn classify_respects_segment_boundaries() {
    assert_eq!(classify("Command::new"), Some(DataLabel::Sink(Cap::SHELL)));
    assert_eq!(classify("std::process::Command::new"), Some(DataLabel::Sink(Cap::SHELL)));
    assert_eq!(classify("arg"), Some(DataLabel::Sink(Cap::SHELL)));
    assert_eq!(classify("std::fs::read_to_string"), Some(DataLabel::Sink(Cap::FILE_PATH)));
    assert_eq!(classify("File::open"), Some(DataLabel::Sink(Cap::FILE_PATH)));

    assert_eq!(classify("Path::new"), None);
    assert_eq!(classify("my_arg"), None);
    assert_eq!(classify("read_to_end"), None);
}

#[test]
fn classify_finds_sanitizers() {
    assert_eq!(classify("validate_host"), Some(DataLabel::Sanitizer(Cap::SHELL)));
    assert_eq!(classify("canonicalize"), Some(DataLabel::Sanitizer(Cap::FILE_PATH)));
    assert_eq!(classify("controls::confine_to_base"), Some(DataLabel::Sanitizer(Cap::FILE_PATH)));
}
