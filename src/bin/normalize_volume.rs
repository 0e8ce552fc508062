// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::process::exit;

use log::error;

use mirror_audio_tools::{
    normalize_volume::{normalize_volume, Setting},
    tree_mirror::MirrorError,
    utilities,
};

fn main() {
    utilities::initialize_logging();

    let setting: Setting = utilities::parse_arguments();

    if let Err(error) = normalize_volume(&setting) {
        match &error {
            MirrorError::TransformFailed { source_file, error } => {
                error!(
                    "ffmpeg-normalize failed for: {}. Detail: {error}",
                    source_file.display()
                );
            }
            error => {
                error!("Normalization is failed. Detail: {error}");
            }
        }

        exit(error.exit_code());
    }
}
