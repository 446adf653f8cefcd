// tests/config_env_override.rs
//
// Kept in its own test binary: these tests mutate the process environment,
// which nothing else in this binary reads concurrently.

use std::error::Error;
use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use gitvisor::config::{TOKEN_ENV, load_and_validate};

type TestResult = Result<(), Box<dyn Error>>;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn config_with_file_token() -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
commands = ["make run"]

[repository]
url = "https://github.com/owner/app"
token = "file"
path = "app"
"#
    )?;
    Ok(file)
}

fn with_token_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: every test in this binary takes ENV_LOCK before touching the
    // environment, and no other thread reads it meanwhile.
    unsafe {
        match value {
            Some(v) => std::env::set_var(TOKEN_ENV, v),
            None => std::env::remove_var(TOKEN_ENV),
        }
    }
    let out = f();
    unsafe { std::env::remove_var(TOKEN_ENV) };
    out
}

#[test]
fn env_token_overrides_file_token() -> TestResult {
    let file = config_with_file_token()?;
    let cfg = with_token_env(Some("env"), || load_and_validate(file.path()))?;
    assert_eq!(cfg.token.as_deref(), Some("env"));
    Ok(())
}

#[test]
fn empty_env_token_keeps_file_token() -> TestResult {
    let file = config_with_file_token()?;
    let cfg = with_token_env(Some(""), || load_and_validate(file.path()))?;
    assert_eq!(cfg.token.as_deref(), Some("file"));
    Ok(())
}

#[test]
fn unset_env_token_keeps_file_token() -> TestResult {
    let file = config_with_file_token()?;
    let cfg = with_token_env(None, || load_and_validate(file.path()))?;
    assert_eq!(cfg.token.as_deref(), Some("file"));
    Ok(())
}
