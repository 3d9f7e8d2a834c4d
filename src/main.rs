//! vault-env - inject secrets into a command's environment and supervise it.

use clap::Parser;
use tracing::{error, error_span};

use vault_env::cli::{execute, logging, Cli};

fn main() {
    let cli = Cli::parse();

    logging::init();
    let span = error_span!("vault-env", app = "vault-env");
    let _guard = span.enter();

    match execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
