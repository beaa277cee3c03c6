// SPDX-License-Identifier: GPL-3.0-only
pub mod controller;

pub use controller::{DataMode, DataSourceInfo, ModeController};
