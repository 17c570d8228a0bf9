// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for MultiContact.

use thiserror::Error;

/// Top-level error type for all MultiContact operations.
#[derive(Debug, Error)]
pub enum ContactsError {
    // -- Call validation --
    #[error("parameter `{0}` not provided")]
    MissingParameter(&'static str),

    #[error("invalid call arguments: {0}")]
    InvalidArguments(String),

    // -- Authorisation --
    #[error("permission to access contacts was not granted")]
    PermissionDenied,

    // -- Contact store --
    #[error("contact not found: {0}")]
    NotFound(String),

    #[error("contact store operation failed: {0}")]
    StoreFailure(String),

    // -- Picker --
    #[error("a contact picker is already open ({open} of {limit} sessions in use)")]
    PickerBusy { open: usize, limit: usize },

    #[error("contact picker closed without a selection")]
    PickerCancelled,

    #[error("contact picker failed: {0}")]
    PickerFailed(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("not implemented on {0}")]
    Unimplemented(String),

    #[error("unknown plugin method `{0}`")]
    UnknownMethod(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContactsError>;
