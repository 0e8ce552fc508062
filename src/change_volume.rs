// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! This module has the function that called by the main function of change-volume.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use clap::Parser;
use log::info;

use crate::{
    stream_info::AudioStreamParams,
    tree_mirror::{
        mirror_tree, AlwaysProcess, CommandTemplate, ExtensionFilter, MirrorError, MirrorJob,
        ProcessedFile,
    },
    utilities,
};

/// The struct for setting.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Change the audio volume of MPEG-TS files in a directory tree. The video is copied."
)]
pub struct Setting {
    #[arg(
        required = true,
        value_parser = utilities::is_source_directory,
        help = "A directory that has MPEG-TS files."
    )]
    source_directory: PathBuf,

    #[arg(
        required = true,
        value_parser = utilities::is_destination_directory_or_not_found,
        help = "A directory that saving converted files in the same structure."
    )]
    destination_directory: PathBuf,

    #[arg(
        required = true,
        allow_hyphen_values = true,
        help = "A multiplier for FFmpeg's volume filter, e.g. 0.5."
    )]
    volume_multiplier: String,
}

/// `ffmpeg` that copies the video and re-encodes the audio with the volume filter.
pub struct VolumeScaleTemplate {
    volume_multiplier: String,
}

impl VolumeScaleTemplate {
    pub fn new(volume_multiplier: &str) -> Self {
        VolumeScaleTemplate {
            volume_multiplier: volume_multiplier.to_owned(),
        }
    }
}

impl CommandTemplate for VolumeScaleTemplate {
    fn command_name(&self) -> &str {
        "ffmpeg"
    }

    fn build_arguments(
        &self,
        source_file: &Path,
        destination_file: &Path,
        params: &AudioStreamParams,
    ) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            source_file.into(),
            "-vcodec".into(),
            "copy".into(),
            "-acodec".into(),
            params.codec.as_str().into(),
            "-b:a".into(),
            params.bitrate.as_str().into(),
            "-af".into(),
            format!("volume={}", self.volume_multiplier).into(),
            destination_file.into(),
        ]
    }
}

pub fn file_filter() -> ExtensionFilter {
    ExtensionFilter::case_sensitive(&["ts"])
}

pub fn skip_policy() -> AlwaysProcess {
    AlwaysProcess
}

/// Changes the audio volume of all MPEG-TS files in the source directory.
///
/// Existing destination files are overwritten.
pub fn change_volume(setting: &Setting) -> Result<Vec<ProcessedFile>, MirrorError> {
    info!("Starting volume adjustment...");
    info!("Source: {}", setting.source_directory.display());
    info!("Destination: {}", setting.destination_directory.display());
    info!("Volume multiplier: {}", setting.volume_multiplier);

    let filter = file_filter();
    let template = VolumeScaleTemplate::new(&setting.volume_multiplier);

    let processed_files = mirror_tree(&MirrorJob {
        source_directory: &setting.source_directory,
        destination_directory: &setting.destination_directory,
        filter: &filter,
        skip_policy: &skip_policy(),
        template: &template,
    })?;

    info!("All files processed successfully.");

    Ok(processed_files)
}
