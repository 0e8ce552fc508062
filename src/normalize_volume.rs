// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! This module has the function that called by the main function of normalize-volume.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::Parser;
use log::info;

use crate::{
    stream_info::AudioStreamParams,
    tree_mirror::{
        mirror_tree, CommandTemplate, ExtensionFilter, MirrorError, MirrorJob, ProcessedFile,
        SkipExisting,
    },
    utilities,
};

/// The struct for setting.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Normalize the audio loudness of MPEG-TS and Matroska files in a directory tree \
                  with ffmpeg-normalize. Files already in the destination are skipped."
)]
pub struct Setting {
    #[arg(
        required = true,
        value_parser = utilities::is_source_directory,
        help = "A directory that has MPEG-TS or Matroska files."
    )]
    source_directory: PathBuf,

    #[arg(
        required = true,
        value_parser = utilities::is_destination_directory_or_not_found,
        help = "A directory that saving normalized files in the same structure."
    )]
    destination_directory: PathBuf,
}

/// `ffmpeg-normalize` with EBU R128 normalization that copies the video.
pub struct NormalizeTemplate;

impl CommandTemplate for NormalizeTemplate {
    fn command_name(&self) -> &str {
        "ffmpeg-normalize"
    }

    fn build_arguments(
        &self,
        source_file: &Path,
        destination_file: &Path,
        params: &AudioStreamParams,
    ) -> Vec<OsString> {
        vec![
            source_file.into(),
            "-c:a".into(),
            params.codec.as_str().into(),
            "-b:a".into(),
            params.bitrate.as_str().into(),
            "-c:v".into(),
            "copy".into(),
            "-o".into(),
            destination_file.into(),
            "--normalization-type".into(),
            "ebu".into(),
            "--dual-mono".into(),
        ]
    }
}

pub fn file_filter() -> ExtensionFilter {
    ExtensionFilter::case_insensitive(&["ts", "mkv"])
}

pub fn skip_policy() -> SkipExisting {
    SkipExisting
}

/// Normalizes the audio loudness of all media files in the source directory.
///
/// A file whose destination already exists is skipped, so an interrupted run can be resumed.
pub fn normalize_volume(setting: &Setting) -> Result<Vec<ProcessedFile>, MirrorError> {
    info!("Starting audio normalization with ffmpeg-normalize...");
    info!("Source: {}", setting.source_directory.display());
    info!("Destination: {}", setting.destination_directory.display());

    let filter = file_filter();

    let processed_files = mirror_tree(&MirrorJob {
        source_directory: &setting.source_directory,
        destination_directory: &setting.destination_directory,
        filter: &filter,
        skip_policy: &skip_policy(),
        template: &NormalizeTemplate,
    })?;

    info!("All files normalized successfully.");

    Ok(processed_files)
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsStr, fs};

    use tempfile::tempdir;

    use crate::tree_mirror::{FileOutcome, SkipPolicy};

    use super::*;

    #[test]
    fn build_ffmpeg_normalize_arguments() {
        let params = AudioStreamParams {
            codec: "ac3".to_owned(),
            bitrate: "384k".to_owned(),
        };

        let arguments = NormalizeTemplate.build_arguments(
            Path::new("/tv/movie.mkv"),
            Path::new("/normalized/movie.mkv"),
            &params,
        );

        assert_eq!("ffmpeg-normalize", NormalizeTemplate.command_name());
        assert_eq!(
            vec![
                "/tv/movie.mkv",
                "-c:a",
                "ac3",
                "-b:a",
                "384k",
                "-c:v",
                "copy",
                "-o",
                "/normalized/movie.mkv",
                "--normalization-type",
                "ebu",
                "--dual-mono",
            ],
            arguments
                .iter()
                .map(|argument| argument.to_str().unwrap())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn transport_streams_and_matroska_are_processed() {
        let filter = file_filter();

        assert!(filter.matches("episode.ts"));
        assert!(filter.matches("episode.TS"));
        assert!(filter.matches("movie.mkv"));
        assert!(filter.matches("movie.MKV"));
        assert!(!filter.matches("movie.mp4"));
    }

    #[test]
    fn existing_destination_is_skipped() {
        let destination = tempfile::NamedTempFile::new().unwrap();

        assert!(skip_policy().should_skip(destination.path()));
        assert!(!skip_policy().should_skip(&destination.path().with_extension("new")));
    }

    #[test]
    fn parse_command_line_with_multiplier() {
        let source_directory = tempdir().unwrap();
        let arguments = &[
            OsStr::new("command"),
            source_directory.path().as_os_str(),
            OsStr::new("destination"),
            OsStr::new("0.5"),
        ];

        let error = Setting::try_parse_from(arguments).unwrap_err();

        assert_eq!(1, utilities::usage_exit_code(&error));
    }

    #[test]
    fn parse_command_line_without_destination_directory() {
        let source_directory = tempdir().unwrap();
        let arguments = &[OsStr::new("command"), source_directory.path().as_os_str()];

        let error = Setting::try_parse_from(arguments).unwrap_err();

        assert_eq!(
            clap::error::ErrorKind::MissingRequiredArgument,
            error.kind()
        );
    }

    #[test]
    fn parse_command_line_with_file_as_destination() {
        let source_directory = tempdir().unwrap();
        let destination = tempfile::NamedTempFile::new().unwrap();
        let arguments = &[
            OsStr::new("command"),
            source_directory.path().as_os_str(),
            destination.path().as_os_str(),
        ];

        let error = Setting::try_parse_from(arguments).unwrap_err();

        assert_eq!(clap::error::ErrorKind::ValueValidation, error.kind());
    }

    #[test]
    fn help_exits_successfully() {
        let error = Setting::try_parse_from([OsStr::new("command"), OsStr::new("--help")])
            .unwrap_err();

        assert_eq!(0, utilities::usage_exit_code(&error));
    }

    #[test]
    fn already_normalized_files_are_skipped() {
        let source_directory = tempdir().unwrap();
        let destination_directory = tempdir().unwrap();

        fs::create_dir(source_directory.path().join("season1")).unwrap();
        fs::write(source_directory.path().join("season1/c.mkv"), b"").unwrap();
        fs::create_dir(destination_directory.path().join("season1")).unwrap();
        fs::write(destination_directory.path().join("season1/c.mkv"), b"done").unwrap();

        let setting = Setting {
            source_directory: source_directory.path().to_path_buf(),
            destination_directory: destination_directory.path().to_path_buf(),
        };

        let processed_files = normalize_volume(&setting).unwrap();

        assert_eq!(1, processed_files.len());
        assert_eq!(FileOutcome::Skipped, processed_files[0].outcome);
        assert_eq!(
            b"done".as_slice(),
            fs::read(destination_directory.path().join("season1/c.mkv")).unwrap()
        );
    }
}
