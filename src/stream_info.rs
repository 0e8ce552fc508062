// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Audio stream inspection with FFmpeg.
//!
//! FFmpeg prints stream information to the standard error when only an input is given.
//! The first `Audio:` line of that output tells the codec and the bitrate.

use std::{path::Path, process::Stdio, sync::LazyLock};

use log::debug;
use regex::Regex;

use crate::command;

const DEFAULT_CODEC: &str = "aac";
const DEFAULT_BITRATE: &str = "128k";

static CODEC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Audio:\s+([^\s,]+)").unwrap());
static BITRATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*kb/s").unwrap());

/// Codec and bitrate of an audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStreamParams {
    /// Codec name, e.g. `aac` or `mp2`.
    pub codec: String,

    /// Bitrate for FFmpeg, e.g. `192k`.
    pub bitrate: String,
}

impl Default for AudioStreamParams {
    fn default() -> Self {
        AudioStreamParams {
            codec: DEFAULT_CODEC.to_owned(),
            bitrate: DEFAULT_BITRATE.to_owned(),
        }
    }
}

/// Extracts the audio stream parameters from FFmpeg's diagnostic output.
///
/// Missing or unparsable fields fall back to `aac` and `128k`.
pub fn parse_audio_stream(diagnostic: &str) -> AudioStreamParams {
    let Some(audio_line) = diagnostic.lines().find(|line| line.contains("Audio:")) else {
        return AudioStreamParams::default();
    };

    let codec = CODEC_PATTERN
        .captures(audio_line)
        .map(|captures| captures[1].to_owned())
        .unwrap_or_else(|| DEFAULT_CODEC.to_owned());
    let bitrate = BITRATE_PATTERN
        .captures(audio_line)
        .map(|captures| format!("{}k", &captures[1]))
        .unwrap_or_else(|| DEFAULT_BITRATE.to_owned());

    AudioStreamParams { codec, bitrate }
}

/// Probes the audio stream of `media_file`.
///
/// This never fails. When FFmpeg is missing or its output cannot be read, the defaults are
/// returned.
pub fn probe(media_file: &Path) -> AudioStreamParams {
    const COMMAND_NAME: &str = "ffmpeg";

    let mut ffmpeg = match command::get_command(COMMAND_NAME) {
        Ok(ffmpeg) => ffmpeg,
        Err(error) => {
            debug!("Probing is skipped: {error}");

            return AudioStreamParams::default();
        }
    };

    // FFmpeg exits with an error because no output is given. The status is irrelevant.
    let output = ffmpeg
        .arg("-i")
        .arg(media_file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .output();

    match output {
        Ok(output) => parse_audio_stream(&String::from_utf8_lossy(&output.stderr)),
        Err(error) => {
            debug!("{COMMAND_NAME} cannot be executed for {media_file:?}: {error}");

            AudioStreamParams::default()
        }
    }
}
