use crate::catalog::{Report, verify};
use crate::errors::{FixtureError, FixtureResult};
use crate::fixtures::{self, SOURCES};
use crate::utils::config::{Config, OutputFormat};
use console::style;

/// Entry point called by the CLI.
pub fn handle(format: Option<&str>, fixture: Option<&str>, config: &Config) -> FixtureResult<()> {
    let format = match format {
        None => config.output.default_format,
        Some("console") => OutputFormat::Console,
        Some("toml") => OutputFormat::Toml,
        Some(other) => return Err(FixtureError::Other(format!("unknown format '{other}'"))),
    };

    let report = match fixture {
        None => verify(SOURCES)?,
        Some(name) => {
            let source = fixtures::source(name)
                .ok_or_else(|| FixtureError::Other(format!("unknown fixture '{name}'")))?;
            verify(std::slice::from_ref(source))?
        }
    };
    match format {
        OutputFormat::Console => print_console(&report),
        OutputFormat::Toml => print!("{}", toml::to_string(&report)?),
    }

    if report.passed() {
        Ok(())
    } else {
        Err(FixtureError::Other(format!(
            "{} expectation(s) failed",
            report.failures()
        )))
    }
}

fn print_console(report: &Report) {
    for o in &report.outcomes {
        let verdict = if o.passed {
            style("PASS").green().bold()
        } else {
            style("FAIL").red().bold()
        };
        println!(
            "[{}]  {}  {}::{}  expected {} found {}",
            verdict,
            style(&o.id).bold(),
            o.fixture,
            o.function,
            o.expected,
            o.found,
        );
    }

    for f in &report.unexpected {
        println!(
            "[{}]  {}:{}:{}  {} in {} via {}",
            style("UNEXPECTED").yellow().bold(),
            style(&f.source).blue().underlined(),
            f.line,
            f.col,
            f.rule,
            f.function,
            f.sink,
        );
    }
}
