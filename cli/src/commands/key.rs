use std::process::ExitCode;

use tracing::info;

use linkr_core::ports::{KeyProvisioner, KeyStatus};
use linkr_core::system::SshKeygen;

use crate::commands::KeyArgs;
use crate::mprint;
use crate::terminal::print;

/// Prints the public key so it can be enrolled on an instrument.
pub async fn key(args: KeyArgs) -> anyhow::Result<ExitCode> {
    let config = args.into_config();
    let keygen = SshKeygen::new(&config.tools.keygen, config.key_path.clone());

    match keygen.ensure_key_pair().await? {
        KeyStatus::Existing => info!("Using key pair at {}", config.key_path.display()),
        KeyStatus::Generated => info!("Created key pair at {}", config.key_path.display()),
    }

    let public_key: String = keygen.public_key().await?;
    mprint!();
    print::print(&public_key);
    Ok(ExitCode::SUCCESS)
}
