// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{
    path::{Path, PathBuf},
    process::exit,
};

use clap::{error::ErrorKind, Parser};
use env_logger::Env;

pub fn initialize_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .init();
}

/// Exit code for an error of command line parsing.
pub fn usage_exit_code(error: &clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Parses the command line, or exits with the usage.
pub fn parse_arguments<T: Parser>() -> T {
    T::try_parse().unwrap_or_else(|error| {
        let _ = error.print();

        exit(usage_exit_code(&error))
    })
}

fn to_absolute(path: &Path, argument: &str) -> Result<PathBuf, String> {
    std::path::absolute(path)
        .map_err(|error| format!(r#"The path "{argument}" is invalid: {error}"#))
}

pub fn is_source_directory(argument: &str) -> Result<PathBuf, String> {
    let path = Path::new(argument);

    if path.is_dir() {
        to_absolute(path, argument)
    } else {
        Err(format!(r#"The directory "{argument}" is not found."#))
    }
}

pub fn is_destination_directory_or_not_found(argument: &str) -> Result<PathBuf, String> {
    let path = Path::new(argument);

    if path.is_dir() || !path.exists() {
        to_absolute(path, argument)
    } else {
        Err(format!(
            r#"The destination "{argument}" exists and is not a directory."#
        ))
    }
}
