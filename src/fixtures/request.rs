use std::collections::HashMap;

/// Query-string request handed to the path fixtures.
///
/// Only the first value of a repeated parameter is kept, the way a servlet's
/// `getParameter` behaves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
  query: HashMap<String, String>,
}

impl Request {
  /// Decode an `application/x-www-form-urlencoded` query string. A leading
  /// `?` is tolerated.
  pub fn from_query(raw: &str) -> Self {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut query = HashMap::new();
    for (k, v) in url::form_urlencoded::parse(raw.as_bytes()) {
      query.entry(k.into_owned()).or_insert_with(|| v.into_owned());
    }
    Self { query }
  }

  pub fn with_param(mut self, name: &str, value: &str) -> Self {
    self.query.insert(name.to_owned(), value.to_owned());
    self
  }

  pub fn param(&self, name: &str) -> Option<&str> {
    self.query.get(name).map(String::as_str)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
  pub status: u16,
  pub body: Vec<u8>,
}

impl Default for Response {
  fn default() -> Self {
    Self { status: 200, body: Vec::new() }
  }
}

impl Response {
  pub fn with_status(status: u16) -> Self {
    Self { status, body: Vec::new() }
  }
}

#[test]
fn from_query_decodes_traversal_payloads() {
  let req = Request::from_query("?file=..%2F..%2Fetc%2Fpasswd&path=/etc/hosts");
  assert_eq!(req.param("file"), Some("../../etc/passwd"));
  assert_eq!(req.param("path"), Some("/etc/hosts"));
  assert_eq!(req.param("missing"), None);
}

#[test]
fn from_query_keeps_first_repeated_value() {
  let req = Request::from_query("file=a.txt&file=b.txt&host=8.8.8.8+%3B+id");
  assert_eq!(req.param("file"), Some("a.txt"));
  assert_eq!(req.param("host"), Some("8.8.8.8 ; id"));
}

#[test]
fn with_param_overrides() {
  let req = Request::from_query("file=a").with_param("file", "b");
  assert_eq!(req.param("file"), Some("b"));
}
