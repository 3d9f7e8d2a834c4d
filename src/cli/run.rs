//! Launch sequence.
//!
//! Resolve the binary, inject secrets into a sanitized environment, then
//! either exec into the command or supervise it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::environ::SanitizedEnviron;
use crate::core::inject::{InjectorConfig, SecretInjector};
use crate::core::lease::{DaemonSecretRenewer, TimerWatcherFactory};
use crate::core::policy::SanitizePolicy;
use crate::core::store::LocalStore;
use crate::core::supervisor::{self, Supervisor};
use crate::error::{ConfigError, ProcessError, Result};

/// Run `command` with secrets injected.
pub fn execute(command: &[String]) -> Result<i32> {
    let program = command.first().ok_or(ConfigError::NoCommand)?;
    let binary = resolve_binary(program)?;

    let config = Config::from_env()?;

    let mut policy = SanitizePolicy::new();
    policy.passthrough(&config.passthrough);

    let store = LocalStore::connect(&config.secrets_file, &config.credentials)?.with_config(
        InjectorConfig {
            daemon_mode: config.daemon,
            ignore_missing_secrets: config.ignore_missing_secrets,
        },
    );

    if config.daemon {
        run_daemon(&config, &policy, store, &binary, command)
    } else {
        let environ = prepare_environ(&config, &policy, &store)?;
        delay(&config);
        info!(entrypoint = ?command, "spawning process");

        match supervisor::replace(&binary, command, &environ)? {}
    }
}

fn run_daemon(
    config: &Config,
    policy: &SanitizePolicy,
    store: LocalStore,
    binary: &Path,
    command: &[String],
) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ProcessError::Runtime)?;

    let supervisor = Supervisor::new();
    let handle = runtime.handle().clone();
    let renewer = DaemonSecretRenewer::new(
        Arc::new(TimerWatcherFactory::new(handle.clone())),
        supervisor.requests(),
        supervisor.exit_watch(),
        handle,
    );
    let store = store.with_renewer(Box::new(renewer));

    let environ = prepare_environ(config, policy, &store)?;
    delay(config);
    info!(entrypoint = ?command, "spawning process");
    info!("in daemon mode...");

    runtime.block_on(supervisor.run(binary, &command[1..], &environ))
}

/// Build the child environment from the config snapshot.
///
/// Runs both injection passes and, if requested, revokes the injector's
/// token. A revocation failure is logged and ignored.
///
/// # Errors
///
/// Returns the injector's error if either injection pass fails.
pub fn prepare_environ<'a>(
    config: &Config,
    policy: &'a SanitizePolicy,
    injector: &dyn SecretInjector,
) -> Result<SanitizedEnviron<'a>> {
    let mut environ = SanitizedEnviron::new(policy, config.login);

    injector.inject_secrets(&config.environ, &mut |name, value| environ.append(name, value))?;
    for (name, value) in &config.raw {
        environ.append_raw(name, value);
    }

    if let Some(paths) = &config.from_path {
        injector.inject_secrets_from_path(paths, &mut |name, value| environ.append(name, value))?;
    }

    if config.revoke_token {
        // Revocation may be denied by policy.
        if let Err(e) = injector.revoke_token() {
            warn!(error = %e, "failed to revoke token");
        }
    }

    Ok(environ)
}

fn delay(config: &Config) {
    if let Some(delay) = config.delay {
        info!("sleeping for {}...", humantime::format_duration(delay));
        std::thread::sleep(delay);
    }
}

/// Resolve `program` the way the launcher does.
pub fn resolve_binary(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|source| {
        ConfigError::BinaryNotFound {
            binary: program.to_string(),
            source,
        }
        .into()
    })
}
