//! Core library components.
//!
//! This module contains the supervision logic: environment sanitization,
//! secret injection seams, lease watching, and child process control.

pub mod config;
pub mod constants;
pub mod environ;
pub mod inject;
pub mod lease;
pub mod policy;
pub mod secret;
pub mod store;
pub mod supervisor;
