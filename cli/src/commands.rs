pub mod interfaces;
pub mod key;
pub mod scan;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use linkr_common::config::{
    Config, DEFAULT_DIAGNOSTIC_COMMAND, DEFAULT_PASSWORD, DEFAULT_SESSION_PORT, DEFAULT_USERNAME,
};
use linkr_common::scan::Credentials;

#[derive(Parser)]
#[command(name = "linkr")]
#[command(version, about = "Finds an instrument on a link-local network and reads its status.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Skip the start-up banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the first instrument answering on a link-local interface
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// List interfaces holding a link-local address
    #[command(alias = "i")]
    Interfaces,
    /// Create the local key pair if needed and print its public half
    #[command(alias = "k")]
    Key(KeyArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Account used by password authentication
    #[arg(short, long, env = "LINKR_USERNAME", default_value = DEFAULT_USERNAME)]
    pub username: String,

    /// Password used when the local key is not accepted
    #[arg(short, long, env = "LINKR_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,

    /// Remote session port
    #[arg(long, default_value_t = DEFAULT_SESSION_PORT)]
    pub port: u16,

    /// Diagnostic command run on the instrument
    #[arg(short, long, default_value = DEFAULT_DIAGNOSTIC_COMMAND)]
    pub command: String,

    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args)]
pub struct KeyArgs {
    /// Private key path [default: ~/.ssh/id_rsa]
    #[arg(short, long)]
    pub key: Option<PathBuf>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl ScanArgs {
    pub fn into_config(self) -> Config {
        let mut config = self.key.into_config();
        config.credentials = Credentials::new(self.username, self.password);
        config.session_port = self.port;
        config.diagnostic_command = self.command;
        config
    }
}

impl KeyArgs {
    pub fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(key) = self.key {
            config.key_path = key;
        }
        config
    }
}
