use crate::errors::FixtureResult;
use console::style;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

static DEFAULT_CONFIG_TOML: &str = include_str!("../../default-nyx-fixtures.conf");

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Console,
    Toml,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FixtureConfig {
    /// Shell used by the command fixtures for `-c` invocations.
    pub shell: String,

    /// Echo requests sent by `ping_host`.
    pub ping_count: u32,

    /// Program `process_file` hands the filename to.
    pub convert_program: String,

    /// Output argument passed after the filename.
    pub convert_output: String,

    /// Archive written by `backup_file`.
    pub backup_archive: String,

    /// Base directory `do_get` concatenates the `file` parameter onto.
    /// Kept as a string: the fixture concatenates, it does not join.
    pub data_dir: String,

    /// Base directory `serve_static` joins the `resource` parameter onto.
    pub static_dir: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".into(),
            ping_count: 4,
            convert_program: "convert".into(),
            convert_output: "output.png".into(),
            backup_archive: "backup.tar.gz".into(),
            data_dir: "/var/data/".into(),
            static_dir: "/app/static".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// The default output format for `verify`.
    pub default_format: OutputFormat,

    /// Suppress config notes and the closing timing line.
    pub quiet: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub fixtures: FixtureConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn load(config_dir: &Path) -> FixtureResult<Self> {
        let mut config = Config::default();

        let default_config_path = config_dir.join("nyx-fixtures.conf");
        if !default_config_path.exists() {
            create_example_config(config_dir)?;
        }

        let user_config_path = config_dir.join("nyx-fixtures.local");
        if user_config_path.exists() {
            let user_config_content = fs::read_to_string(&user_config_path)?;
            let user_config: Config = toml::from_str(&user_config_content)?;

            config = merge_configs(config, user_config);

            if !config.output.quiet {
                eprintln!(
                    "{}: Loaded user config from: {}\n",
                    style("note").green().bold(),
                    style(user_config_path.display())
                        .underlined()
                        .white()
                        .bold()
                );
            }
        } else {
            tracing::debug!(
                "Using default configuration, create {} to customize",
                user_config_path.display()
            );
        }

        Ok(config)
    }
}

fn create_example_config(config_dir: &Path) -> FixtureResult<()> {
    let example_path = config_dir.join("nyx-fixtures.conf");
    if !example_path.exists() {
        fs::write(&example_path, DEFAULT_CONFIG_TOML)?;
        tracing::debug!("Example config created at: {}", example_path.display());
    }
    Ok(())
}

/// Merge user config into default config. Every user field wins; blank
/// strings fall back to the default so a half-filled table cannot leave the
/// fixtures without a shell or base directory.
fn merge_configs(mut default: Config, user: Config) -> Config {
    // --- FixtureConfig ---
    let keep = |current: &mut String, new: String| {
        if !new.trim().is_empty() {
            *current = new;
        }
    };
    keep(&mut default.fixtures.shell, user.fixtures.shell);
    keep(&mut default.fixtures.convert_program, user.fixtures.convert_program);
    keep(&mut default.fixtures.convert_output, user.fixtures.convert_output);
    keep(&mut default.fixtures.backup_archive, user.fixtures.backup_archive);
    keep(&mut default.fixtures.data_dir, user.fixtures.data_dir);
    keep(&mut default.fixtures.static_dir, user.fixtures.static_dir);
    default.fixtures.ping_count = user.fixtures.ping_count;

    // --- OutputConfig ---
    default.output.default_format = user.output.default_format;
    default.output.quiet = user.output.quiet;

    default
}

#[test]
fn merge_configs_ignores_blank_strings() {
    let mut user_cfg = Config::default();
    user_cfg.fixtures.shell = "  ".into();
    user_cfg.fixtures.data_dir = "/srv/files/".into();
    user_cfg.fixtures.ping_count = 1;

    let merged = merge_configs(Config::default(), user_cfg);

    assert_eq!(merged.fixtures.shell, "/bin/sh");
    assert_eq!(merged.fixtures.data_dir, "/srv/files/");
    assert_eq!(merged.fixtures.ping_count, 1);
}

#[test]
fn bundled_example_config_parses_to_defaults() {
    let parsed: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
    assert_eq!(parsed.fixtures, FixtureConfig::default());
    assert_eq!(parsed.output.default_format, OutputFormat::Console);
}

#[test]
fn load_creates_example_and_reads_user_overrides() {
    let cfg_dir = tempfile::tempdir().unwrap();
    let cfg_path = cfg_dir.path();

    let user_toml = r#"
        [fixtures]
        data_dir = "/tmp/data/"
        ping_count = 2

        [output]
        quiet = true
        default_format = "toml"
    "#;
    fs::write(cfg_path.join("nyx-fixtures.local"), user_toml).unwrap();

    let cfg = Config::load(cfg_path).expect("Config::load should succeed");

    assert!(cfg_path.join("nyx-fixtures.conf").is_file());

    assert_eq!(cfg.fixtures.data_dir, "/tmp/data/");
    assert_eq!(cfg.fixtures.ping_count, 2);
    assert_eq!(cfg.fixtures.shell, "/bin/sh");
    assert!(cfg.output.quiet);
    assert_eq!(cfg.output.default_format, OutputFormat::Toml);
}
