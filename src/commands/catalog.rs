use crate::catalog::{EXPECTATIONS, Expect};
use crate::errors::FixtureResult;
use console::style;

pub fn handle(verbose: bool) -> FixtureResult<()> {
    println!("{}", style("Expected findings").blue().bold().underlined());

    for e in EXPECTATIONS {
        let expect = match e.expect {
            Expect::Flagged { sites } => format!("{sites} site(s)"),
            Expect::Clean => style("clean").dim().to_string(),
        };
        println!(
            "  {:28} {:9} {:18} {}::{}  {}",
            style(e.id).white().bold(),
            e.severity.styled(),
            e.rule,
            e.fixture,
            e.function,
            expect,
        );
        if verbose {
            println!("    {}", style(e.description).dim());
        }
    }
    Ok(())
}
