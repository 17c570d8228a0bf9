// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native contacts capabilities.
//
// The plugin never talks to Contacts.framework or ContactsContract directly;
// it goes through these traits. Native completions (permission prompt,
// picker selection) are delivered through `Completion` and `PickerListener`
// so that the plugin side can suspend on them.

use std::sync::Arc;

use multicontact_core::error::Result;
use multicontact_core::{
    Contact, ContactId, NewContact, PermissionState, PickerOptions, PickerSessionId, Projection,
};
use tokio::sync::oneshot;

/// Unified bridge that groups the native contacts capabilities.
pub trait PlatformBridge:
    NativeContactsPermission + NativeContactStore + NativeContactPicker + Send + Sync
{
    /// Human-readable platform name (e.g. "iOS", "Android").
    fn platform_name(&self) -> &str;

    /// Whether this platform has a native contacts integration at all.
    /// The stub returns `false` and every plugin call is then rejected as
    /// unimplemented up front.
    fn supports_contacts(&self) -> bool {
        true
    }
}

/// One-shot completion handed to a native callback.
///
/// Consumed on first use, so a native callback that fires twice cannot
/// settle the waiting call twice.
#[derive(Debug)]
pub struct Completion<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Completion<T> {
    /// Create a completion and the receiver the caller awaits.
    pub fn channel() -> (Self, oneshot::Receiver<Result<T>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Settle the waiting call. A caller that has gone away is not an error.
    pub fn complete(self, result: Result<T>) {
        if self.tx.send(result).is_err() {
            tracing::debug!("completion dropped: caller no longer waiting");
        }
    }
}

/// Contacts authorisation.
pub trait NativeContactsPermission {
    /// Current OS authorisation, normalised to the three caller states.
    fn authorization_status(&self) -> Result<PermissionState>;

    /// Ask the OS for contacts access.
    ///
    /// `done` is completed with `Ok(())` once the user has answered,
    /// whatever the answer; callers re-read `authorization_status`.
    /// Returns `Err` only if the request could not be issued.
    fn request_access(&self, done: Completion<()>) -> Result<()>;
}

/// CRUD against the native contacts store.
pub trait NativeContactStore {
    /// Fetch one contact. `projection` lets the platform limit the keys it
    /// loads; the plugin still maps the result through the same projection.
    fn fetch_contact(&self, id: &ContactId, projection: &Projection) -> Result<Option<Contact>>;

    /// Fetch every contact, in store order.
    fn fetch_contacts(&self, projection: &Projection) -> Result<Vec<Contact>>;

    /// Insert a contact and return the identifier the store assigned.
    fn create_contact(&self, contact: &NewContact) -> Result<ContactId>;

    /// Delete a contact. `Ok(false)` means the store reported nothing deleted.
    fn delete_contact(&self, id: &ContactId) -> Result<bool>;
}

/// Terminal event delivered by a native picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    /// Single-selection picker variant fired with a full record.
    SelectedOne(Contact),
    /// Multi-selection picker variant fired with full records.
    SelectedMany(Vec<Contact>),
    /// The picker only returned identifiers; the plugin loads the records.
    SelectedIds(Vec<ContactId>),
    /// The user dismissed the picker.
    Cancelled,
    /// The picker could not complete.
    Failed(String),
}

/// Receiver of native picker events, implemented by the plugin.
pub trait PickerListener: Send + Sync {
    fn on_picker_event(&self, session: PickerSessionId, event: PickerEvent);
}

/// The OS contact picker UI.
pub trait NativeContactPicker {
    /// Present the picker for `session`. Exactly one terminal event for the
    /// session must later be delivered to `listener`.
    fn present_picker(
        &self,
        session: PickerSessionId,
        options: &PickerOptions,
        listener: Arc<dyn PickerListener>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicontact_core::ContactsError;

    #[tokio::test]
    async fn completion_delivers_once() {
        let (done, rx) = Completion::<u32>::channel();
        done.complete(Ok(7));
        assert_eq!(rx.await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn completion_carries_errors() {
        let (done, rx) = Completion::<()>::channel();
        done.complete(Err(ContactsError::Bridge("prompt failed".into())));
        assert!(matches!(rx.await.unwrap(), Err(ContactsError::Bridge(_))));
    }

    #[test]
    fn completing_after_caller_left_is_harmless() {
        let (done, rx) = Completion::<()>::channel();
        drop(rx);
        done.complete(Ok(()));
    }
}
