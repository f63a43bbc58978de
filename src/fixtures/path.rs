// INTENTIONALLY VULNERABLE CODE - FOR SECURITY SCANNER TESTING ONLY
// Request parameters reach `File::open` with no canonicalisation and no
// prefix check. Do not "fix" them; see `controls.rs`.

use crate::fixtures::request::{Request, Response};
use crate::utils::config::FixtureConfig;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Path-traversal fixture.
///
/// I/O failures are logged and swallowed: the caller always gets a 200 and,
/// on failure, an empty body.
#[derive(Debug, Clone)]
pub struct VulnerablePath {
    data_dir: String,
    static_dir: String,
}

impl VulnerablePath {
    pub fn new(config: &FixtureConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            static_dir: config.static_dir.clone(),
        }
    }

    /// Serves `file` from the data directory, then `path` from anywhere.
    pub fn do_get(&self, request: &Request) -> Response {
        let filename = request.param("file").unwrap_or_default();
        let mut body = Vec::new();

        let outcome = (|| -> io::Result<()> {
            // VULNERABLE: base directory + raw parameter
            let mut file = File::open(format!("{}{}", self.data_dir, filename))?;
            file.read_to_end(&mut body)?;

            // VULNERABLE: raw parameter, no base directory at all
            let path = request.param("path").unwrap_or_default();
            let mut reader = BufReader::new(File::open(path)?);
            reader.read_to_end(&mut body)?;
            Ok(())
        })();

        match outcome {
            Ok(()) => Response { status: 200, body },
            Err(e) => {
                tracing::error!(error = %e, filename, "do_get failed");
                Response::default()
            }
        }
    }

    /// Serves `resource` from the static directory.
    pub fn serve_static(&self, request: &Request) -> Response {
        let resource = request.param("resource").unwrap_or_default();

        // VULNERABLE: `join` drops the base when `resource` is absolute
        let target = Path::new(&self.static_dir).join(resource);
        let mut body = Vec::new();
        match File::open(&target).and_then(|mut f| f.read_to_end(&mut body)) {
            Ok(_) => Response { status: 200, body },
            Err(e) => {
                tracing::error!(error = %e, target = %target.display(), "serve_static failed");
                Response::default()
            }
        }
    }
}

#[test]
fn do_get_escapes_data_dir_with_parent_segments() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(root.path().join("secret.txt"), "top secret\n").unwrap();
    std::fs::write(root.path().join("hosts"), "127.0.0.1 localhost\n").unwrap();

    let config = FixtureConfig {
        data_dir: format!("{}/", data.display()),
        ..FixtureConfig::default()
    };
    let fixture = VulnerablePath::new(&config);
    let request = Request::default()
        .with_param("file", "../secret.txt")
        .with_param("path", &root.path().join("hosts").to_string_lossy());

    let response = fixture.do_get(&request);

    assert_eq!(response.status, 200);
    assert_eq!(
        String::from_utf8(response.body).unwrap(),
        "top secret\n127.0.0.1 localhost\n"
    );
}

#[test]
fn do_get_swallows_missing_files() {
    let root = tempfile::tempdir().unwrap();
    let config = FixtureConfig {
        data_dir: format!("{}/", root.path().display()),
        ..FixtureConfig::default()
    };
    let fixture = VulnerablePath::new(&config);

    let response = fixture.do_get(&Request::from_query("file=nope.txt"));

    assert_eq!(response, Response::default());
}

#[test]
fn do_get_without_path_parameter_reports_nothing() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), "a").unwrap();
    let config = FixtureConfig {
        data_dir: format!("{}/", root.path().display()),
        ..FixtureConfig::default()
    };
    let fixture = VulnerablePath::new(&config);

    // second open fails on the empty path; the whole request is swallowed
    let response = fixture.do_get(&Request::from_query("file=a.txt"));

    assert!(response.body.is_empty());
}

#[test]
fn serve_static_absolute_resource_replaces_base() {
    let root = tempfile::tempdir().unwrap();
    let outside = root.path().join("outside.txt");
    std::fs::write(&outside, "escaped").unwrap();

    let config = FixtureConfig {
        static_dir: root.path().join("static").to_string_lossy().into_owned(),
        ..FixtureConfig::default()
    };
    let fixture = VulnerablePath::new(&config);
    let request = Request::default().with_param("resource", &outside.to_string_lossy());

    let response = fixture.serve_static(&request);

    assert_eq!(response.body, b"escaped");
}
