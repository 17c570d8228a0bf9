// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MultiContact — Core types, payload mapping and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod payload;
pub mod projection;
pub mod rejection;
pub mod types;

pub use config::PluginConfig;
pub use error::ContactsError;
pub use payload::ContactPayload;
pub use projection::{ContactField, Projection};
pub use rejection::{ErrorCode, Rejection, reject};
pub use types::*;
