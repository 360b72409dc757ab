// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// LocalConvert — Core types, format classification, the conversion capability
// table, and error definitions shared across all crates.

pub mod capability;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod routes;
pub mod types;

pub use capability::ConversionCapabilityTable;
pub use config::EngineConfig;
pub use error::{ConvertError, ErrorKind};
pub use types::*;
