use thiserror::Error;

pub type FixtureResult<T, E = FixtureError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FixtureError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("input rejected: {0}")]
  Rejected(String),

  #[error("tree-sitter error: {0}")]
  TreeSitter(#[from] tree_sitter::LanguageError),

  #[error("query error: {0}")]
  Query(#[from] tree_sitter::QueryError),

  #[error("config error: {0}")]
  TomlDe(#[from] toml::de::Error),

  #[error("serialisation error: {0}")]
  TomlSer(#[from] toml::ser::Error),

  #[error("other: {0}")]
  Other(String),
}

impl From<&str> for FixtureError {
  fn from(msg: &str) -> Self {
    FixtureError::Other(msg.to_owned())
  }
}
