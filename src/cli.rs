use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nyx-fixtures")]
#[command(about = "Intentionally vulnerable fixtures for exercising the nyx scanner")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ping a host through a concatenated shell line
    Ping {
        /// Host to ping (passed on unchecked)
        host: String,

        /// Use the allow-listed negative control instead
        #[arg(long)]
        control: bool,
    },

    /// Hand a filename to the convert program
    Convert {
        /// File to convert
        file: String,
    },

    /// Run a command through `sh -c`
    Exec {
        /// Command line
        cmd: String,
    },

    /// Archive a file through a `tar` shell line
    Backup {
        /// File to archive
        file: String,
    },

    /// Serve a request through the path fixture (`file` and `path` parameters)
    Get {
        /// Query string, e.g. `file=report.txt&path=/tmp/notes`
        #[arg(default_value = "")]
        query: String,

        /// Extra parameter as `name=value`, overriding the query string
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Use the confined negative control instead
        #[arg(long)]
        control: bool,
    },

    /// Serve a static resource (`resource` parameter)
    Static {
        /// Query string, e.g. `resource=css/site.css`
        #[arg(default_value = "")]
        query: String,

        /// Extra parameter as `name=value`, overriding the query string
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// List the catalog of expected findings
    Catalog {
        /// Show descriptions
        #[arg(short, long)]
        verbose: bool,
    },

    /// Audit the embedded fixtures against the catalog
    Verify {
        /// Output format: console or toml
        #[arg(short, long)]
        format: Option<String>,

        /// Only audit this fixture (command, path, controls)
        #[arg(long)]
        fixture: Option<String>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

#[test]
fn parse_param_splits_on_first_equals() {
    assert_eq!(
        parse_param("path=/tmp/a=b").unwrap(),
        ("path".to_owned(), "/tmp/a=b".to_owned())
    );
    assert!(parse_param("novalue").is_err());
}

#[test]
fn get_accepts_query_and_overrides() {
    let cli = Cli::try_parse_from([
        "nyx-fixtures",
        "get",
        "file=a.txt",
        "--param",
        "path=/etc/hosts",
        "--control",
    ])
    .unwrap();

    match cli.command {
        Commands::Get { query, params, control } => {
            assert_eq!(query, "file=a.txt");
            assert_eq!(params, vec![("path".to_owned(), "/etc/hosts".to_owned())]);
            assert!(control);
        }
        _ => panic!("parsed the wrong subcommand"),
    }
}
