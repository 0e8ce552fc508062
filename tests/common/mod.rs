// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use mirror_audio_tools::{
    stream_info::AudioStreamParams,
    tree_mirror::{
        mirror_tree, CommandTemplate, ExtensionFilter, MirrorError, MirrorJob, ProcessedFile,
        SkipPolicy,
    },
};
use tempfile::{tempdir, TempDir};
use walkdir::WalkDir;

// $1: source, $2: destination, $3: log file, $4: the invocation that fails (0 is never).
const COPY_SCRIPT: &str = r#"printf '%s\n' "$1" >> "$3"
[ $(( $(wc -l < "$3") )) -ne "$4" ] || exit 7
cp "$1" "$2""#;

/// Copies a file instead of transforming it, and records every invocation.
pub struct CopyTemplate {
    log_file: PathBuf,
    fail_at: usize,
}

impl CopyTemplate {
    pub fn new(log_file: &Path) -> Self {
        CopyTemplate {
            log_file: log_file.to_path_buf(),
            fail_at: 0,
        }
    }

    pub fn failing_at(log_file: &Path, fail_at: usize) -> Self {
        CopyTemplate {
            log_file: log_file.to_path_buf(),
            fail_at,
        }
    }
}

impl CommandTemplate for CopyTemplate {
    fn command_name(&self) -> &str {
        "sh"
    }

    fn build_arguments(
        &self,
        source_file: &Path,
        destination_file: &Path,
        _: &AudioStreamParams,
    ) -> Vec<OsString> {
        vec![
            "-c".into(),
            COPY_SCRIPT.into(),
            "copy".into(),
            source_file.into(),
            destination_file.into(),
            self.log_file.as_path().into(),
            self.fail_at.to_string().into(),
        ]
    }
}

/// Creates files with their relative paths as the contents.
pub fn prepare_tree(relative_paths: &[&str]) -> Result<TempDir> {
    let directory = tempdir()?;

    write_files(directory.path(), relative_paths)?;

    Ok(directory)
}

pub fn write_files(directory: &Path, relative_paths: &[&str]) -> Result<()> {
    for relative_path in relative_paths {
        let path = directory.join(relative_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, relative_path)?;
    }

    Ok(())
}

/// Relative paths of all files in `directory`, sorted.
pub fn list_files(directory: &Path) -> Vec<PathBuf> {
    if !directory.exists() {
        return Vec::new();
    }

    let mut files: Vec<_> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().strip_prefix(directory).unwrap().to_path_buf())
        .collect();

    files.sort();

    files
}

/// Source files passed to the command, in order.
pub fn read_invocations(log_file: &Path) -> Vec<PathBuf> {
    fs::read_to_string(log_file)
        .map(|log| log.lines().map(PathBuf::from).collect())
        .unwrap_or_default()
}

pub fn run(
    source_directory: &Path,
    destination_directory: &Path,
    filter: &ExtensionFilter,
    skip_policy: &dyn SkipPolicy,
    template: &CopyTemplate,
) -> Result<Vec<ProcessedFile>, MirrorError> {
    mirror_tree(&MirrorJob {
        source_directory,
        destination_directory,
        filter,
        skip_policy,
        template,
    })
}
