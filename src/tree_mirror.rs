// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! This module mirrors a source directory tree into a destination directory.
//!
//! Each matching media file is transformed by an external command into the same relative
//! path under the destination directory. The first failed command aborts the whole run.

use std::{
    ffi::OsString,
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::{
    command::{self, CommandError},
    stream_info::{self, AudioStreamParams},
};

/// Error of mirroring.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("The source `{0}` is not a directory.")]
    SourceNotDirectory(PathBuf),

    #[error("{0} is not in the source directory.")]
    OutsideSourceDirectory(PathBuf),

    #[error("The directory `{0}` cannot be created: {1}")]
    DirectoryCannotBeCreated(PathBuf, io::Error),

    #[error("Transforming {source_file} is failed: {error}")]
    TransformFailed {
        source_file: PathBuf,
        error: CommandError,
    },
}

impl MirrorError {
    /// Process exit code for this error.
    ///
    /// A failed transform command passes its own exit code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            MirrorError::TransformFailed { error, .. } => error.exit_code().unwrap_or(1),
            _ => 1,
        }
    }
}

/// Extensions of the files to be processed.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
    case_sensitive: bool,
}

impl ExtensionFilter {
    pub fn case_sensitive(extensions: &[&str]) -> Self {
        ExtensionFilter {
            extensions: extensions.iter().map(|&extension| extension.to_owned()).collect(),
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(extensions: &[&str]) -> Self {
        ExtensionFilter {
            extensions: extensions.iter().map(|&extension| extension.to_owned()).collect(),
            case_sensitive: false,
        }
    }

    pub fn matches<P: AsRef<Path>>(&self, file: P) -> bool {
        let Some(file_extension) = file.as_ref().extension() else {
            return false;
        };

        self.extensions.iter().any(|extension| {
            if self.case_sensitive {
                file_extension == extension.as_str()
            } else {
                file_extension.eq_ignore_ascii_case(extension)
            }
        })
    }
}

/// Decides whether a file is skipped, by its destination path.
#[cfg_attr(test, mockall::automock)]
pub trait SkipPolicy {
    fn should_skip(&self, destination_file: &Path) -> bool;
}

/// Every file is processed, overwriting the existing destination.
pub struct AlwaysProcess;

impl SkipPolicy for AlwaysProcess {
    fn should_skip(&self, _: &Path) -> bool {
        false
    }
}

/// Files whose destination already exists are skipped.
pub struct SkipExisting;

impl SkipPolicy for SkipExisting {
    fn should_skip(&self, destination_file: &Path) -> bool {
        destination_file.exists()
    }
}

/// Builds the external command that transforms one file.
pub trait CommandTemplate {
    fn command_name(&self) -> &str;

    fn build_arguments(
        &self,
        source_file: &Path,
        destination_file: &Path,
        params: &AudioStreamParams,
    ) -> Vec<OsString>;
}

/// A media file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub source: PathBuf,

    /// The path relative to the source directory.
    pub relative: PathBuf,

    pub destination: PathBuf,
}

impl MediaFile {
    pub fn new(
        source_file: &Path,
        source_directory: &Path,
        destination_directory: &Path,
    ) -> Result<Self, MirrorError> {
        let relative = source_file
            .strip_prefix(source_directory)
            .map_err(|_| MirrorError::OutsideSourceDirectory(source_file.to_path_buf()))?;

        Ok(MediaFile {
            source: source_file.to_path_buf(),
            relative: relative.to_path_buf(),
            destination: destination_directory.join(relative),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Skipped,
    Succeeded,
}

/// Result of a file in mirror_tree.
#[derive(Debug)]
pub struct ProcessedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: FileOutcome,
}

/// What mirror_tree does.
pub struct MirrorJob<'a> {
    pub source_directory: &'a Path,
    pub destination_directory: &'a Path,
    pub filter: &'a ExtensionFilter,
    pub skip_policy: &'a dyn SkipPolicy,
    pub template: &'a dyn CommandTemplate,
}

#[cfg_attr(test, mockall::automock)]
trait MirrorRunner {
    fn find_media_files(&self, source_directory: &Path, filter: &ExtensionFilter) -> Vec<PathBuf>;

    fn create_directory(&self, path: &Path) -> io::Result<()>;

    fn probe(&self, source_file: &Path) -> AudioStreamParams;

    fn run(&self, command_name: &str, arguments: &[OsString]) -> Result<(), CommandError>;
}

struct ProcessRunner;

impl MirrorRunner for ProcessRunner {
    fn find_media_files(&self, source_directory: &Path, filter: &ExtensionFilter) -> Vec<PathBuf> {
        find_media_files(source_directory, filter)
    }

    fn create_directory(&self, path: &Path) -> io::Result<()> {
        create_dir_all(path)
    }

    fn probe(&self, source_file: &Path) -> AudioStreamParams {
        stream_info::probe(source_file)
    }

    fn run(&self, command_name: &str, arguments: &[OsString]) -> Result<(), CommandError> {
        let mut external_command = command::get_command(command_name)?;

        command::run_command(external_command.args(arguments), command_name)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Finds the files matching `filter` under `source_directory`, recursively.
///
/// Hidden files and directories are not visited. Unreadable entries are ignored.
pub fn find_media_files(source_directory: &Path, filter: &ExtensionFilter) -> Vec<PathBuf> {
    WalkDir::new(source_directory)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file() && filter.matches(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn process_file<T: MirrorRunner>(
    job: &MirrorJob,
    media_file: &MediaFile,
    runner: &T,
) -> Result<FileOutcome, MirrorError> {
    if job.skip_policy.should_skip(&media_file.destination) {
        info!("Skipping: {}", media_file.destination.display());

        return Ok(FileOutcome::Skipped);
    }

    info!("Processing: {}", media_file.source.display());
    info!("     Relative: {}", media_file.relative.display());
    info!("     Output:   {}", media_file.destination.display());

    if let Some(destination_directory) = media_file.destination.parent() {
        runner
            .create_directory(destination_directory)
            .map_err(|error| {
                MirrorError::DirectoryCannotBeCreated(destination_directory.to_path_buf(), error)
            })?;
    }

    let params = runner.probe(&media_file.source);
    info!("     Codec: {}, Bitrate: {}", params.codec, params.bitrate);

    let command_name = job.template.command_name();
    let arguments =
        job.template
            .build_arguments(&media_file.source, &media_file.destination, &params);
    info!(
        "     Running: {}",
        command::format_command_line(command_name, &arguments)
    );

    runner
        .run(command_name, &arguments)
        .map_err(|error| MirrorError::TransformFailed {
            source_file: media_file.source.clone(),
            error,
        })?;

    info!("Done.");

    Ok(FileOutcome::Succeeded)
}

fn mirror_tree_on_runner<T: MirrorRunner>(
    job: &MirrorJob,
    runner: T,
) -> Result<Vec<ProcessedFile>, MirrorError> {
    let source_files = runner.find_media_files(job.source_directory, job.filter);

    debug!(
        "{} files are found in {:?}",
        source_files.len(),
        job.source_directory
    );

    let mut processed_files = Vec::with_capacity(source_files.len());

    for source_file in source_files {
        let media_file =
            MediaFile::new(&source_file, job.source_directory, job.destination_directory)?;
        let outcome = process_file(job, &media_file, &runner)?;

        processed_files.push(ProcessedFile {
            source: media_file.source,
            destination: media_file.destination,
            outcome,
        });
    }

    Ok(processed_files)
}

/// Transforms every matching file in the source directory into the destination directory.
///
/// Files are processed one by one in the order of the file system. The run stops at the
/// first failure; files already written stay in the destination directory.
pub fn mirror_tree(job: &MirrorJob) -> Result<Vec<ProcessedFile>, MirrorError> {
    if !job.source_directory.is_dir() {
        return Err(MirrorError::SourceNotDirectory(
            job.source_directory.to_path_buf(),
        ));
    }

    mirror_tree_on_runner(job, ProcessRunner)
}
