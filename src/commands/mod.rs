pub mod catalog;
pub mod request;
pub mod run;
pub mod verify;

use crate::cli::Commands;
use crate::errors::FixtureResult;
use crate::utils::config::Config;

pub fn handle_command(command: Commands, config: &Config) -> FixtureResult<()> {
    match command {
        Commands::Ping { host, control } => run::ping(&host, control, &config.fixtures),
        Commands::Convert { file } => run::convert(&file, &config.fixtures),
        Commands::Exec { cmd } => run::exec(&cmd, &config.fixtures),
        Commands::Backup { file } => run::backup(&file, &config.fixtures),
        Commands::Get { query, params, control } => {
            request::get(&query, &params, control, &config.fixtures)
        }
        Commands::Static { query, params } => {
            request::serve_static(&query, &params, &config.fixtures)
        }
        Commands::Catalog { verbose } => catalog::handle(verbose),
        Commands::Verify { format, fixture } => {
            verify::handle(format.as_deref(), fixture.as_deref(), config)
        }
    }
}
