// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory bridge.
//
// Behaves like a native contacts store without any OS underneath: contacts
// live in a `Vec` (insertion order is store order), the permission prompt is
// answered from a scripted outcome, and the picker either answers
// immediately with a scripted event or stays open until the test fires an
// event. Every native call is counted so callers can assert how often the
// bridge was reached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use multicontact_core::error::{ContactsError, Result};
use multicontact_core::{
    Contact, ContactId, NewContact, PermissionState, PickerOptions, PickerSessionId, Projection,
};

use crate::traits::*;

/// What the in-memory picker does when presented.
#[derive(Debug, Clone, Default)]
pub enum PickerScript {
    /// Stay open until `MemoryBridge::fire_picker_event` is called.
    #[default]
    Hold,
    /// Deliver this event as soon as the picker is presented.
    Respond(PickerEvent),
}

struct MemoryState {
    status: PermissionState,
    status_after_prompt: PermissionState,
    contacts: Vec<Contact>,
    next_id: u64,
    fail_writes: bool,
    picker_script: PickerScript,
    open_pickers: Vec<(PickerSessionId, PickerOptions, Arc<dyn PickerListener>)>,
}

/// A self-contained contacts store for tests and desktop development.
pub struct MemoryBridge {
    state: Mutex<MemoryState>,
    permission_requests: AtomicUsize,
    store_calls: AtomicUsize,
    picker_presentations: AtomicUsize,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBridge {
    /// An empty store with access already granted.
    pub fn new() -> Self {
        Self::with_permission(PermissionState::Granted)
    }

    /// An empty store whose current authorisation is `status`. Answering
    /// the prompt grants access unless `answer_prompt_with` says otherwise.
    pub fn with_permission(status: PermissionState) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                status,
                status_after_prompt: PermissionState::Granted,
                contacts: Vec::new(),
                next_id: 1,
                fail_writes: false,
                picker_script: PickerScript::Hold,
                open_pickers: Vec::new(),
            }),
            permission_requests: AtomicUsize::new(0),
            store_calls: AtomicUsize::new(0),
            picker_presentations: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Authorisation the store reports after a permission prompt.
    pub fn answer_prompt_with(&self, status: PermissionState) {
        self.state().status_after_prompt = status;
    }

    pub fn set_permission(&self, status: PermissionState) {
        self.state().status = status;
    }

    /// Make `create_contact` fail as a rejected store write would.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn script_picker(&self, script: PickerScript) {
        self.state().picker_script = script;
    }

    /// Seed a contact, assigning an id when the record has none.
    pub fn insert(&self, mut contact: Contact) -> ContactId {
        let mut state = self.state();
        if contact.id.as_str().is_empty() {
            contact.id = ContactId::new(state.next_id.to_string());
            state.next_id += 1;
        }
        let id = contact.id.clone();
        state.contacts.push(contact);
        id
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.state().contacts.clone()
    }

    /// Number of times the OS permission prompt was requested.
    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    /// Number of store reads and writes performed.
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn picker_presentations(&self) -> usize {
        self.picker_presentations.load(Ordering::SeqCst)
    }

    /// Sessions whose picker is still on screen, oldest first.
    pub fn open_picker_sessions(&self) -> Vec<PickerSessionId> {
        self.state().open_pickers.iter().map(|(id, _, _)| *id).collect()
    }

    /// Options the most recent picker was presented with.
    pub fn last_picker_options(&self) -> Option<PickerOptions> {
        self.state().open_pickers.last().map(|(_, opts, _)| opts.clone())
    }

    /// Close the picker for `session` with `event`, as the OS delegate would.
    ///
    /// Returns `false` if no picker is open for that session.
    pub fn fire_picker_event(&self, session: PickerSessionId, event: PickerEvent) -> bool {
        let listener = {
            let mut state = self.state();
            let Some(pos) = state.open_pickers.iter().position(|(id, _, _)| *id == session)
            else {
                return false;
            };
            state.open_pickers.remove(pos).2
        };
        // Listener runs without the store lock held.
        listener.on_picker_event(session, event);
        true
    }

    fn count_store_call(&self) {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl PlatformBridge for MemoryBridge {
    fn platform_name(&self) -> &str {
        "memory"
    }
}

impl NativeContactsPermission for MemoryBridge {
    fn authorization_status(&self) -> Result<PermissionState> {
        Ok(self.state().status)
    }

    fn request_access(&self, done: Completion<()>) -> Result<()> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state();
            // Like the OS, only an undetermined status can change via prompt.
            if state.status == PermissionState::Prompt {
                state.status = state.status_after_prompt;
            }
        }
        done.complete(Ok(()));
        Ok(())
    }
}

impl NativeContactStore for MemoryBridge {
    fn fetch_contact(&self, id: &ContactId, _projection: &Projection) -> Result<Option<Contact>> {
        self.count_store_call();
        Ok(self.state().contacts.iter().find(|c| &c.id == id).cloned())
    }

    fn fetch_contacts(&self, _projection: &Projection) -> Result<Vec<Contact>> {
        self.count_store_call();
        Ok(self.state().contacts.clone())
    }

    fn create_contact(&self, contact: &NewContact) -> Result<ContactId> {
        self.count_store_call();
        if self.state().fail_writes {
            return Err(ContactsError::StoreFailure("memory store rejected the write".into()));
        }
        Ok(self.insert(contact.clone().into_contact(ContactId::default())))
    }

    fn delete_contact(&self, id: &ContactId) -> Result<bool> {
        self.count_store_call();
        let mut state = self.state();
        let before = state.contacts.len();
        state.contacts.retain(|c| &c.id != id);
        Ok(state.contacts.len() != before)
    }
}

impl NativeContactPicker for MemoryBridge {
    fn present_picker(
        &self,
        session: PickerSessionId,
        options: &PickerOptions,
        listener: Arc<dyn PickerListener>,
    ) -> Result<()> {
        self.picker_presentations.fetch_add(1, Ordering::SeqCst);
        let script = {
            let mut state = self.state();
            state
                .open_pickers
                .push((session, options.clone(), Arc::clone(&listener)));
            state.picker_script.clone()
        };

        if let PickerScript::Respond(event) = script {
            self.fire_picker_event(session, event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicontact_core::LabeledValue;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PickerSessionId, PickerEvent)>>);

    impl PickerListener for Recorder {
        fn on_picker_event(&self, session: PickerSessionId, event: PickerEvent) {
            self.0.lock().unwrap().push((session, event));
        }
    }

    #[test]
    fn store_keeps_insertion_order_and_assigns_ids() {
        let bridge = MemoryBridge::new();
        let a = bridge.insert(Contact::default());
        let b = bridge
            .create_contact(&NewContact {
                phones: vec![LabeledValue::new("1")],
                ..Default::default()
            })
            .unwrap();
        assert_ne!(a, b);

        let all = bridge.fetch_contacts(&Projection::all()).unwrap();
        assert_eq!(all.iter().map(|c| c.id.clone()).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(bridge.store_calls(), 2);
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let bridge = MemoryBridge::new();
        let id = bridge.insert(Contact::default());
        assert!(bridge.delete_contact(&id).unwrap());
        assert!(!bridge.delete_contact(&id).unwrap());
        assert!(bridge.fetch_contact(&id, &Projection::all()).unwrap().is_none());
    }

    #[test]
    fn failed_write_is_a_store_failure() {
        let bridge = MemoryBridge::new();
        bridge.fail_writes(true);
        assert!(matches!(
            bridge.create_contact(&NewContact::default()),
            Err(ContactsError::StoreFailure(_))
        ));
        assert!(bridge.contacts().is_empty());
    }

    #[tokio::test]
    async fn prompt_only_changes_undetermined_status() {
        let bridge = MemoryBridge::with_permission(PermissionState::Prompt);
        bridge.answer_prompt_with(PermissionState::Denied);
        let (done, rx) = Completion::channel();
        bridge.request_access(done).unwrap();
        rx.await.unwrap().unwrap();
        assert_eq!(bridge.authorization_status().unwrap(), PermissionState::Denied);

        bridge.answer_prompt_with(PermissionState::Granted);
        let (done, rx) = Completion::channel();
        bridge.request_access(done).unwrap();
        rx.await.unwrap().unwrap();
        assert_eq!(bridge.authorization_status().unwrap(), PermissionState::Denied);
        assert_eq!(bridge.permission_requests(), 2);
    }

    #[test]
    fn held_picker_waits_for_fired_event() {
        let bridge = MemoryBridge::new();
        let recorder = Arc::new(Recorder::default());
        let session = PickerSessionId::new();

        bridge
            .present_picker(session, &PickerOptions::default(), recorder.clone())
            .unwrap();
        assert_eq!(bridge.open_picker_sessions(), vec![session]);
        assert!(recorder.0.lock().unwrap().is_empty());

        assert!(bridge.fire_picker_event(session, PickerEvent::Cancelled));
        assert!(!bridge.fire_picker_event(session, PickerEvent::Cancelled));
        assert_eq!(*recorder.0.lock().unwrap(), vec![(session, PickerEvent::Cancelled)]);
        assert!(bridge.open_picker_sessions().is_empty());
    }

    #[test]
    fn scripted_picker_answers_immediately() {
        let bridge = MemoryBridge::new();
        bridge.script_picker(PickerScript::Respond(PickerEvent::Failed("no UI".into())));
        let recorder = Arc::new(Recorder::default());
        let session = PickerSessionId::new();

        bridge
            .present_picker(session, &PickerOptions::default(), recorder.clone())
            .unwrap();
        assert!(bridge.open_picker_sessions().is_empty());
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![(session, PickerEvent::Failed("no UI".into()))]
        );
    }
}
