use crate::errors::FixtureResult;
use crate::fixtures::controls::SafePath;
use crate::fixtures::path::VulnerablePath;
use crate::fixtures::request::{Request, Response};
use crate::utils::config::FixtureConfig;
use std::io::{self, Write};

pub fn get(
    query: &str,
    params: &[(String, String)],
    control: bool,
    cfg: &FixtureConfig,
) -> FixtureResult<()> {
    let request = build(query, params);
    let response = if control {
        SafePath::new(cfg).do_get(&request)
    } else {
        VulnerablePath::new(cfg).do_get(&request)
    };
    respond(response)
}

pub fn serve_static(
    query: &str,
    params: &[(String, String)],
    cfg: &FixtureConfig,
) -> FixtureResult<()> {
    let request = build(query, params);
    respond(VulnerablePath::new(cfg).serve_static(&request))
}

fn build(query: &str, params: &[(String, String)]) -> Request {
    params
        .iter()
        .fold(Request::from_query(query), |req, (k, v)| req.with_param(k, v))
}

fn respond(response: Response) -> FixtureResult<()> {
    tracing::info!(status = response.status, bytes = response.body.len(), "response");
    let mut out = io::stdout().lock();
    out.write_all(&response.body)?;
    out.flush()?;
    Ok(())
}

#[test]
fn build_lets_params_override_the_query() {
    let req = build(
        "file=a.txt&path=x",
        &[("path".to_owned(), "/etc/hosts".to_owned())],
    );
    assert_eq!(req.param("file"), Some("a.txt"));
    assert_eq!(req.param("path"), Some("/etc/hosts"));
}
