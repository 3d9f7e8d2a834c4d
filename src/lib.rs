//! vault-env - inject leased secrets into a process and supervise it.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Entrypoint orchestration and logging setup
//! └── core/             # Core library components
//!     ├── config        # Environment-driven configuration
//!     ├── policy        # Per-variable visibility rules
//!     ├── environ       # Sanitized child environment
//!     ├── inject        # SecretInjector / SecretRenewer traits
//!     ├── store/        # Local JSON secret store
//!     ├── lease/        # Lease watcher state machine
//!     │   └── timer     # Clock-driven lease event streams
//!     └── supervisor/   # Replace (exec) and daemon (spawn + relay) modes
//!         ├── relay     # Signal relay loop
//!         └── replace   # Process image replacement
//! ```
//!
//! # Launch modes
//!
//! - **Replace** (default): exec into the command with only the sanitized
//!   environment.
//! - **Daemon** (`VAULT_ENV_DAEMON=true`): spawn the command, relay every
//!   signal to it, terminate it when a watched lease dies, and exit with its
//!   status.

pub mod cli;
pub mod core;
pub mod error;
