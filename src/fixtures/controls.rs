// Negative controls: the same entry points as `command.rs` and `path.rs`
// with the missing controls put back. Audits must stay silent here.

use crate::errors::{FixtureError, FixtureResult};
use crate::fixtures::request::{Request, Response};
use crate::utils::config::FixtureConfig;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

/// Longest DNS name; also plenty for an IPv6 literal.
const MAX_HOST_LEN: usize = 253;

/// Allow-list check for a ping target: hostname, IPv4 or IPv6 literal.
pub fn validate_host(host: &str) -> FixtureResult<String> {
    let ok = !host.is_empty()
        && host.len() <= MAX_HOST_LEN
        && !host.starts_with('-')
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b':'));

    if ok {
        Ok(host.to_owned())
    } else {
        Err(FixtureError::Rejected(format!("invalid host {host:?}")))
    }
}

/// Resolve `name` under `base` and refuse anything that lands outside it.
pub fn confine_to_base(base: &Path, name: &str) -> FixtureResult<PathBuf> {
    let root = base.canonicalize()?;
    let candidate = root.join(name).canonicalize()?;
    if candidate.starts_with(&root) {
        Ok(candidate)
    } else {
        Err(FixtureError::Rejected(format!(
            "{} escapes {}",
            candidate.display(),
            root.display()
        )))
    }
}

#[derive(Debug, Clone)]
pub struct SafeCommand {
    ping_count: u32,
}

impl SafeCommand {
    pub fn new(config: &FixtureConfig) -> Self {
        Self { ping_count: config.ping_count }
    }

    /// Validated host, fixed program, argument array, no shell.
    pub fn ping_host(&self, host: &str) -> FixtureResult<Child> {
        let host = validate_host(host)?;
        Ok(Command::new("ping")
            .arg("-c")
            .arg(self.ping_count.to_string())
            .arg(&host)
            .spawn()?)
    }
}

#[derive(Debug, Clone)]
pub struct SafePath {
    data_dir: PathBuf,
}

impl SafePath {
    pub fn new(config: &FixtureConfig) -> Self {
        Self { data_dir: PathBuf::from(&config.data_dir) }
    }

    /// Serves `file` only if it resolves inside the data directory. The
    /// unconfined `path` parameter is ignored.
    pub fn do_get(&self, request: &Request) -> Response {
        let filename = request.param("file").unwrap_or_default();
        let resolved = match confine_to_base(&self.data_dir, filename) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, filename, "request rejected");
                return Response::with_status(403);
            }
        };

        let mut body = Vec::new();
        match File::open(&resolved).and_then(|mut f| f.read_to_end(&mut body)) {
            Ok(_) => Response { status: 200, body },
            Err(e) => {
                tracing::error!(error = %e, "do_get failed");
                Response::with_status(404)
            }
        }
    }
}

#[test]
fn validate_host_rejects_chaining() {
    assert!(validate_host("8.8.8.8").is_ok());
    assert!(validate_host("example.com").is_ok());
    assert!(validate_host("::1").is_ok());

    for bad in ["8.8.8.8; rm -rf /", "$(id)", "a b", "-f", "", "host|cat"] {
        assert!(
            matches!(validate_host(bad), Err(FixtureError::Rejected(_))),
            "accepted {bad:?}"
        );
    }
}

#[test]
fn safe_ping_rejects_before_spawning() {
    let control = SafeCommand::new(&FixtureConfig::default());
    let err = control.ping_host("8.8.8.8; rm -rf /").unwrap_err();
    assert!(matches!(err, FixtureError::Rejected(_)));
}

#[test]
fn safe_do_get_refuses_traversal() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(root.path().join("secret.txt"), "top secret").unwrap();
    std::fs::write(data.join("report.txt"), "public").unwrap();

    let config = FixtureConfig {
        data_dir: data.to_string_lossy().into_owned(),
        ..FixtureConfig::default()
    };
    let control = SafePath::new(&config);

    let denied = control.do_get(&Request::from_query("file=../secret.txt&path=/etc/passwd"));
    assert_eq!(denied.status, 403);
    assert!(denied.body.is_empty());

    let served = control.do_get(&Request::from_query("file=report.txt&path=/etc/passwd"));
    assert_eq!(served.status, 200);
    assert_eq!(served.body, b"public");
}

#[test]
fn confine_to_base_rejects_absolute_names() {
    let root = tempfile::tempdir().unwrap();
    let err = confine_to_base(root.path(), "/etc").unwrap_err();
    assert!(matches!(err, FixtureError::Rejected(_)));
}
