// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MultiContact — permission-gated contacts plugin.
//
// Wires the platform bridge to the operations the application layer calls:
// permission checks, store reads and writes, and the multi-select picker.
// Hosts either call the typed methods on `ContactsPlugin` or route raw
// plugin calls through `ContactsPlugin::handle`.

pub mod audit;
pub mod calls;
pub mod dispatcher;
pub mod logging;
pub mod permission;
pub mod picker;

pub use calls::{
    CreateContactOptions, DeleteContactOptions, GetContactOptions, GetContactsOptions,
    PickContactsOptions, PickResult,
};
pub use dispatcher::ContactsPlugin;
