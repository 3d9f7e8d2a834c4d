//! Command-line interface.

pub mod logging;
pub mod run;

use clap::Parser;

/// vault-env - inject secrets into a command's environment and supervise it.
#[derive(Parser, Debug)]
#[command(
    name = "vault-env",
    about = "Inject secrets into a command's environment and supervise it",
    version,
    after_help = "Configuration is read from VAULT_* environment variables."
)]
pub struct Cli {
    /// Command and arguments to run
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Run the entrypoint and return the exit status to mirror.
///
/// In replace mode this only returns on failure.
pub fn execute(cli: Cli) -> crate::error::Result<i32> {
    run::execute(&cli.command)
}
