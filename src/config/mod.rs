// src/config/mod.rs

//! Configuration loading and validation for gitvisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load and save the config file (`loader.rs`).
//! - Validate it into a ready-to-use [`ConfigFile`] (`validate.rs`).
//! - Collect a first configuration interactively (`prompt.rs`).

pub mod loader;
pub mod model;
pub mod prompt;
pub mod validate;

pub use loader::{
    TOKEN_ENV, load_and_validate, load_from_path, resolve_config_path, save,
};
pub use model::{CommandSpec, ConfigFile, RawConfigFile, RepositorySection, SupervisorSection};
pub use validate::{MAX_DURATION, parse_duration, parse_poll_interval};
