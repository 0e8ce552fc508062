// SPDX-FileCopyrightText: 2024 Keita Kita <maoutwo@gmail.com>
//
// SPDX-License-Identifier: MIT

pub mod change_volume;
pub mod command;
pub mod normalize_volume;
pub mod stream_info;
pub mod tree_mirror;
pub mod utilities;
