// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Picker delegate.
//
// Each `pickContacts` call registers a session and gets a oneshot receiver.
// The native picker reports back through `PickerListener`, which removes the
// session and sends its terminal event. A session is therefore settled at
// most once; anything arriving later finds no entry and is dropped with a
// warning. If the caller stops waiting, dropping `PendingPick` removes the
// session so it no longer counts against the limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use multicontact_bridge::{PickerEvent, PickerListener};
use multicontact_core::error::{ContactsError, Result};
use multicontact_core::{Contact, ContactId, PickerSessionId};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What the user selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerSelection {
    One(Contact),
    Many(Vec<Contact>),
    /// Identifiers only; records still have to be loaded from the store.
    Ids(Vec<ContactId>),
}

/// Registry of open picker sessions.
pub struct PickerDelegate {
    sessions: Mutex<HashMap<PickerSessionId, oneshot::Sender<PickerEvent>>>,
    limit: usize,
}

impl PickerDelegate {
    /// `limit` is the number of pickers allowed open at once (at least 1).
    pub fn new(limit: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            limit: limit.max(1),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<PickerSessionId, oneshot::Sender<PickerEvent>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new session, or fail as busy when the limit is reached.
    pub fn open(self: &Arc<Self>) -> Result<PendingPick> {
        let mut sessions = self.sessions();
        if sessions.len() >= self.limit {
            return Err(ContactsError::PickerBusy {
                open: sessions.len(),
                limit: self.limit,
            });
        }

        let session = PickerSessionId::new();
        let (tx, rx) = oneshot::channel();
        sessions.insert(session, tx);
        debug!(%session, open = sessions.len(), "picker session registered");

        Ok(PendingPick {
            session,
            rx,
            delegate: Arc::clone(self),
        })
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions().len()
    }

    fn forget(&self, session: PickerSessionId) {
        if self.sessions().remove(&session).is_some() {
            debug!(%session, "picker session abandoned by caller");
        }
    }
}

impl PickerListener for PickerDelegate {
    fn on_picker_event(&self, session: PickerSessionId, event: PickerEvent) {
        let Some(tx) = self.sessions().remove(&session) else {
            warn!(%session, ?event, "picker event for a settled or unknown session ignored");
            return;
        };
        if tx.send(event).is_err() {
            debug!(%session, "picker caller no longer waiting");
        }
    }
}

/// A registered session awaiting its terminal event.
pub struct PendingPick {
    session: PickerSessionId,
    rx: oneshot::Receiver<PickerEvent>,
    delegate: Arc<PickerDelegate>,
}

impl PendingPick {
    pub fn session(&self) -> PickerSessionId {
        self.session
    }

    /// Suspend until the picker settles. Cancellation and native failures
    /// come back as errors.
    pub async fn wait(mut self) -> Result<PickerSelection> {
        let event = (&mut self.rx).await.map_err(|_| {
            ContactsError::PickerFailed("picker closed without reporting a result".into())
        })?;

        match event {
            PickerEvent::SelectedOne(contact) => Ok(PickerSelection::One(contact)),
            PickerEvent::SelectedMany(contacts) => Ok(PickerSelection::Many(contacts)),
            PickerEvent::SelectedIds(ids) => Ok(PickerSelection::Ids(ids)),
            PickerEvent::Cancelled => Err(ContactsError::PickerCancelled),
            PickerEvent::Failed(reason) => Err(ContactsError::PickerFailed(reason)),
        }
    }
}

impl Drop for PendingPick {
    fn drop(&mut self) {
        self.delegate.forget(self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selection_settles_the_session() {
        let delegate = Arc::new(PickerDelegate::new(1));
        let pending = delegate.open().unwrap();
        let session = pending.session();

        delegate.on_picker_event(session, PickerEvent::SelectedIds(vec![ContactId::new("3")]));
        assert_eq!(delegate.open_sessions(), 0);
        assert_eq!(
            pending.wait().await.unwrap(),
            PickerSelection::Ids(vec![ContactId::new("3")])
        );
    }

    #[tokio::test]
    async fn cancellation_rejects() {
        let delegate = Arc::new(PickerDelegate::new(1));
        let pending = delegate.open().unwrap();
        delegate.on_picker_event(pending.session(), PickerEvent::Cancelled);
        assert!(matches!(pending.wait().await, Err(ContactsError::PickerCancelled)));
    }

    #[tokio::test]
    async fn failure_carries_native_reason() {
        let delegate = Arc::new(PickerDelegate::new(1));
        let pending = delegate.open().unwrap();
        delegate.on_picker_event(pending.session(), PickerEvent::Failed("no activity".into()));
        match pending.wait().await {
            Err(ContactsError::PickerFailed(reason)) => assert_eq!(reason, "no activity"),
            other => panic!("expected picker failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn later_events_are_ignored() {
        let delegate = Arc::new(PickerDelegate::new(1));
        let pending = delegate.open().unwrap();
        let session = pending.session();

        delegate.on_picker_event(session, PickerEvent::SelectedMany(Vec::new()));
        delegate.on_picker_event(session, PickerEvent::Cancelled);

        assert_eq!(pending.wait().await.unwrap(), PickerSelection::Many(Vec::new()));
    }

    #[test]
    fn limit_rejects_overlapping_sessions() {
        let delegate = Arc::new(PickerDelegate::new(1));
        let _first = delegate.open().unwrap();
        match delegate.open() {
            Err(ContactsError::PickerBusy { open, limit }) => assert_eq!((open, limit), (1, 1)),
            Err(other) => panic!("expected busy, got {other:?}"),
            Ok(_) => panic!("second session should not open"),
        }
    }

    #[test]
    fn dropping_the_waiter_frees_the_slot() {
        let delegate = Arc::new(PickerDelegate::new(1));
        let first = delegate.open().unwrap();
        drop(first);
        assert_eq!(delegate.open_sessions(), 0);
        assert!(delegate.open().is_ok());
    }

    #[test]
    fn zero_limit_still_allows_one() {
        let delegate = Arc::new(PickerDelegate::new(0));
        assert!(delegate.open().is_ok());
    }
}
