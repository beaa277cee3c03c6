// SPDX-License-Identifier: GPL-3.0-only
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod mode;
pub mod registry;
pub mod remote;
pub mod snapshot;
pub mod sync;

#[cfg(test)]
mod test_helpers;
