// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for AEGIS CLI

pub mod asset;
pub mod config;
pub mod daemon;
pub mod recon;
pub mod report;
pub mod scan;

pub use self::asset::AssetCommand;
pub use self::config::ConfigCommand;
pub use self::daemon::DaemonCommand;
pub use self::recon::ReconCommand;
pub use self::report::ReportCommand;
pub use self::scan::ScanCommand;
