// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Lookup and execution of external commands.

use std::{
    ffi::{OsStr, OsString},
    process::{Command, ExitStatus},
};

use thiserror::Error;
use which::which;

/// Error about running an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command {command} is not found: {error}")]
    CommandNotFound {
        command: String,
        error: which::Error,
    },

    #[error("Command {command} is failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("Command {command} cannot be executed: {error}")]
    CommandCannotExecuted {
        command: String,
        error: std::io::Error,
    },
}

impl CommandError {
    /// Exit code of the failed command, when it exited with a non-zero code.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::CommandFailed { status, .. } => {
                status.code().filter(|&code| code != 0)
            }
            _ => None,
        }
    }
}

pub fn get_command(command: &str) -> Result<Command, CommandError> {
    let command_path = which(command);

    match command_path {
        Ok(command_path) => Ok(Command::new(command_path)),

        Err(error) => Err(CommandError::CommandNotFound {
            command: command.to_string(),
            error,
        }),
    }
}

pub fn run_command(command: &mut Command, command_name: &str) -> Result<(), CommandError> {
    let result = command.status();

    match result {
        Ok(exit_status) => {
            if exit_status.success() {
                Ok(())
            } else {
                Err(CommandError::CommandFailed {
                    command: command_name.to_string(),
                    status: exit_status,
                })
            }
        }
        Err(error) => Err(CommandError::CommandCannotExecuted {
            command: command_name.to_string(),
            error,
        }),
    }
}

/// Joins a command line for logging.
pub fn format_command_line<S: AsRef<OsStr>>(command_name: &str, arguments: &[S]) -> String {
    let mut line = OsString::from(command_name);

    for argument in arguments {
        line.push(" ");
        line.push(argument);
    }

    line.to_string_lossy().into_owned()
}
