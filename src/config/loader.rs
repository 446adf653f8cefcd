// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable that overrides `[repository].token`.
pub const TOKEN_ENV: &str = "GITVISOR_TOKEN";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load, apply the token environment override, and validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let mut raw_config = load_from_path(&path)?;
    apply_env_overrides(&mut raw_config);
    ConfigFile::try_from(raw_config)
}

/// Write `config` as TOML, creating parent directories when needed.
pub fn save(path: impl AsRef<Path>, config: &RawConfigFile) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = toml::to_string(config)?;
    fs::write(path, contents)?;
    info!(path = %path.display(), "configuration saved");
    Ok(())
}

fn apply_env_overrides(config: &mut RawConfigFile) {
    apply_token_override(config, std::env::var(TOKEN_ENV).ok());
}

/// A non-empty token from the environment replaces the one in the file.
fn apply_token_override(config: &mut RawConfigFile, token: Option<String>) {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        config.repository.token = Some(token);
    }
}

/// Resolve a possibly relative config path against the root directory.
pub fn resolve_config_path(root: &Path, config: &Path) -> PathBuf {
    if config.is_absolute() {
        config.to_path_buf()
    } else {
        root.join(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{RepositorySection, SupervisorSection};
    use crate::types::Reference;

    fn raw_with_token(token: Option<&str>) -> RawConfigFile {
        RawConfigFile {
            commands: Vec::new(),
            repository: RepositorySection {
                url: "https://h/o/r".to_string(),
                token: token.map(str::to_string),
                path: PathBuf::from("checkout"),
                reference: Reference::default(),
            },
            supervisor: SupervisorSection::default(),
        }
    }

    #[test]
    fn env_token_replaces_file_token() {
        let mut raw = raw_with_token(Some("file"));
        apply_token_override(&mut raw, Some("env".to_string()));
        assert_eq!(raw.repository.token.as_deref(), Some("env"));

        let mut raw = raw_with_token(None);
        apply_token_override(&mut raw, Some("env".to_string()));
        assert_eq!(raw.repository.token.as_deref(), Some("env"));
    }

    #[test]
    fn empty_or_missing_env_token_keeps_file_token() {
        let mut raw = raw_with_token(Some("file"));
        apply_token_override(&mut raw, Some(String::new()));
        assert_eq!(raw.repository.token.as_deref(), Some("file"));

        apply_token_override(&mut raw, None);
        assert_eq!(raw.repository.token.as_deref(), Some("file"));
    }
}
