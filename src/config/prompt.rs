// src/config/prompt.rs

//! First-run interactive setup.
//!
//! When no config file exists the operator is asked for the handful of values
//! a minimal configuration needs. Everything else takes its default.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::model::{CommandSpec, RawConfigFile, RepositorySection, SupervisorSection};
use crate::errors::{GitvisorError, Result};
use crate::types::Reference;

/// Ask for token, URL, local path, reference and commands.
///
/// Commands are entered on one line separated by commas.
pub fn collect<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<RawConfigFile> {
    let token = ask(&mut input, &mut output, "Access token (leave empty for none): ")?;
    let url = ask(
        &mut input,
        &mut output,
        "Repository URL (e.g. https://github.com/owner/name): ",
    )?;
    let path = ask(&mut input, &mut output, "Local checkout path: ")?;
    let reference = ask(&mut input, &mut output, "Reference to watch [HEAD]: ")?;
    let commands = ask(
        &mut input,
        &mut output,
        "Commands to run, separated by commas: ",
    )?;

    let commands: Vec<CommandSpec> = commands
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| CommandSpec::Line(c.to_string()))
        .collect();

    Ok(RawConfigFile {
        commands,
        repository: RepositorySection {
            url,
            token: Some(token).filter(|t| !t.is_empty()),
            path: PathBuf::from(path),
            reference: if reference.is_empty() {
                Reference::default()
            } else {
                Reference::new(reference)
            },
        },
        supervisor: SupervisorSection::default(),
    })
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    output.write_all(question.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(GitvisorError::ConfigError(
            "input closed during interactive setup".to_string(),
        ));
    }
    Ok(line.trim().to_string())
}
