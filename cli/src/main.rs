mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, interfaces, key, scan};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose)?;
    print::banner(commands.no_banner);

    match commands.command {
        Commands::Scan(args) => {
            print::header("scanning link-local networks");
            scan::scan(args).await
        }
        Commands::Interfaces => {
            print::header("link-local interfaces");
            interfaces::interfaces()
        }
        Commands::Key(args) => {
            print::header("local key pair");
            key::key(args).await
        }
    }
}
