// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatcher: the contacts operations exposed to the application.
//
// Every operation checks, in order: platform support, required parameters,
// then the permission gate. Only then is the native store or picker reached.
// `ContactsPlugin` is cheap to clone and safe to call from any task.

use std::sync::{Arc, Mutex, PoisonError};

use multicontact_bridge::{PickerListener, PlatformBridge, platform_bridge};
use multicontact_core::error::{ContactsError, Result};
use multicontact_core::{ContactId, ContactPayload, PermissionStatus, PluginConfig};
use tracing::{error, info, instrument, warn};

use crate::audit::{ALL_CONTACTS, AuditEntry, AuditLog, subject_hash};
use crate::calls::{
    CreateContactOptions, DeleteContactOptions, GetContactOptions, GetContactsOptions,
    PickContactsOptions, PickResult,
};
use crate::permission::PermissionGate;
use crate::picker::{PickerDelegate, PickerSelection};

struct Inner {
    bridge: Arc<dyn PlatformBridge>,
    gate: PermissionGate,
    picker: Arc<PickerDelegate>,
    config: PluginConfig,
    audit: Option<Mutex<AuditLog>>,
}

/// The contacts plugin.
#[derive(Clone)]
pub struct ContactsPlugin {
    inner: Arc<Inner>,
}

impl ContactsPlugin {
    /// Build the plugin on an explicit bridge.
    pub fn with_bridge(bridge: Arc<dyn PlatformBridge>, config: PluginConfig) -> Result<Self> {
        let config = config.normalised();

        let audit = if config.audit_enabled {
            let log = match &config.audit_path {
                Some(path) => AuditLog::open(path)?,
                None => AuditLog::open_in_memory()?,
            };
            Some(Mutex::new(log))
        } else {
            None
        };

        info!(
            platform = bridge.platform_name(),
            supported = bridge.supports_contacts(),
            audit = config.audit_enabled,
            "contacts plugin initialised"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                gate: PermissionGate::new(Arc::clone(&bridge)),
                picker: Arc::new(PickerDelegate::new(config.max_concurrent_pickers)),
                bridge,
                config,
                audit,
            }),
        })
    }

    /// Build the plugin on the bridge for the target operating system.
    pub fn for_current_platform(config: PluginConfig) -> Result<Self> {
        Self::with_bridge(platform_bridge(), config)
    }

    pub fn platform_name(&self) -> &str {
        self.inner.bridge.platform_name()
    }

    pub fn config(&self) -> &PluginConfig {
        &self.inner.config
    }

    /// Picker sessions currently awaiting a selection.
    pub fn open_picker_sessions(&self) -> usize {
        self.inner.picker.open_sessions()
    }

    /// Most recent audit entries, newest first. Empty when auditing is off.
    pub fn recent_audit_entries(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        match &self.inner.audit {
            Some(log) => log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recent_entries(limit),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn ensure_supported(&self) -> Result<()> {
        if self.inner.bridge.supports_contacts() {
            Ok(())
        } else {
            Err(ContactsError::Unimplemented(
                self.inner.bridge.platform_name().to_owned(),
            ))
        }
    }

    fn audit<T>(&self, action: &str, subject: &str, outcome: &Result<T>) {
        let Some(log) = &self.inner.audit else {
            return;
        };
        let details = outcome.as_ref().err().map(ToString::to_string);
        let log = log.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = log.record(action, subject, outcome.is_ok(), details.as_deref()) {
            error!(error = %e, action, "failed to record audit entry");
        }
    }

    // -- Permissions ---------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn check_permissions(&self) -> Result<PermissionStatus> {
        self.ensure_supported()?;
        Ok(PermissionStatus {
            contacts: self.inner.gate.check()?,
        })
    }

    #[instrument(skip(self))]
    pub async fn request_permissions(&self) -> Result<PermissionStatus> {
        self.ensure_supported()?;
        Ok(PermissionStatus {
            contacts: self.inner.gate.request().await?,
        })
    }

    // -- Store ---------------------------------------------------------------

    #[instrument(skip_all, fields(contact_id = ?options.contact_id))]
    pub async fn get_contact(&self, options: GetContactOptions) -> Result<ContactPayload> {
        self.ensure_supported()?;
        let id = options
            .contact_id
            .ok_or(ContactsError::MissingParameter("contactId"))?;
        let projection = options.projection.unwrap_or_default();
        let subject = subject_hash(&id);
        let bridge = &self.inner.bridge;

        let outcome = self
            .inner
            .gate
            .with_permission(move || async move {
                match bridge.fetch_contact(&id, &projection)? {
                    Some(contact) => Ok(ContactPayload::project(&contact, &projection)),
                    None => Err(ContactsError::NotFound(id.to_string())),
                }
            })
            .await;

        self.audit("get_contact", &subject, &outcome);
        outcome
    }

    #[instrument(skip_all)]
    pub async fn get_contacts(&self, options: GetContactsOptions) -> Result<Vec<ContactPayload>> {
        self.ensure_supported()?;
        let projection = options.projection.unwrap_or_default();
        let bridge = &self.inner.bridge;

        let outcome = self
            .inner
            .gate
            .with_permission(move || async move {
                let contacts = bridge.fetch_contacts(&projection)?;
                Ok(contacts
                    .iter()
                    .map(|c| ContactPayload::project(c, &projection))
                    .collect::<Vec<_>>())
            })
            .await;

        if let Ok(contacts) = &outcome {
            info!(count = contacts.len(), "contacts read");
        }
        self.audit("get_contacts", ALL_CONTACTS, &outcome);
        outcome
    }

    #[instrument(skip_all)]
    pub async fn create_contact(&self, options: CreateContactOptions) -> Result<ContactId> {
        self.ensure_supported()?;
        let contact = options.contact.unwrap_or_default();
        let bridge = &self.inner.bridge;

        let outcome = self
            .inner
            .gate
            .with_permission(move || async move { bridge.create_contact(&contact) })
            .await;

        match &outcome {
            Ok(id) => {
                info!(%id, "contact created");
                self.audit("create_contact", &subject_hash(id), &outcome);
            }
            Err(e) => {
                warn!(error = %e, "contact creation failed");
                self.audit("create_contact", ALL_CONTACTS, &outcome);
            }
        }
        outcome
    }

    #[instrument(skip_all, fields(contact_id = ?options.contact_id))]
    pub async fn delete_contact(&self, options: DeleteContactOptions) -> Result<()> {
        self.ensure_supported()?;
        let id = options
            .contact_id
            .ok_or(ContactsError::MissingParameter("contactId"))?;
        let subject = subject_hash(&id);
        let bridge = &self.inner.bridge;

        let outcome = self
            .inner
            .gate
            .with_permission(move || async move {
                if bridge.delete_contact(&id)? {
                    Ok(())
                } else {
                    Err(ContactsError::StoreFailure(format!(
                        "store reported nothing deleted for {id}"
                    )))
                }
            })
            .await;

        self.audit("delete_contact", &subject, &outcome);
        outcome
    }

    // -- Picker --------------------------------------------------------------

    /// Present the native picker and wait for the user.
    ///
    /// Resolves with one contact or several depending on which picker
    /// variant fired. Rejects with picker-busy when the configured number of
    /// pickers is already open, and with picker-cancelled when the user
    /// dismisses it. Bridges may present after `present_picker` returns, so a
    /// presentation failure arrives as a picker event like any other.
    #[instrument(skip_all)]
    pub async fn pick_contacts(&self, options: PickContactsOptions) -> Result<PickResult> {
        self.ensure_supported()?;
        let projection = options.projection.unwrap_or_default();
        let picker_options = self.inner.config.picker_options();
        let bridge = &self.inner.bridge;
        let picker = &self.inner.picker;

        let outcome = self
            .inner
            .gate
            .with_permission(move || async move {
                let pending = picker.open()?;
                let listener: Arc<dyn PickerListener> = Arc::clone(picker) as _;
                bridge.present_picker(pending.session(), &picker_options, listener)?;

                let result = match pending.wait().await? {
                    PickerSelection::One(contact) => PickResult::One {
                        contact: ContactPayload::project(&contact, &projection),
                    },
                    PickerSelection::Many(contacts) => PickResult::many(
                        contacts
                            .iter()
                            .map(|c| ContactPayload::project(c, &projection))
                            .collect(),
                    ),
                    PickerSelection::Ids(ids) => {
                        let mut contacts = Vec::with_capacity(ids.len());
                        for id in &ids {
                            match bridge.fetch_contact(id, &projection)? {
                                Some(contact) => {
                                    contacts.push(ContactPayload::project(&contact, &projection))
                                }
                                None => warn!(%id, "picked contact vanished from store, skipped"),
                            }
                        }
                        PickResult::many(contacts)
                    }
                };
                Ok(result)
            })
            .await;

        if let Err(e) = &outcome {
            info!(error = %e, "pick did not complete");
        }
        self.audit("pick_contacts", ALL_CONTACTS, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicontact_bridge::{MemoryBridge, PickerEvent, PickerScript};
    use multicontact_core::{
        Contact, ContactField, ContactName, LabeledValue, PermissionState, Projection,
    };

    fn plugin(bridge: &Arc<MemoryBridge>) -> ContactsPlugin {
        ContactsPlugin::with_bridge(Arc::clone(bridge) as _, PluginConfig::default()).unwrap()
    }

    fn audited(bridge: &Arc<MemoryBridge>) -> ContactsPlugin {
        let config = PluginConfig {
            audit_enabled: true,
            ..PluginConfig::default()
        };
        ContactsPlugin::with_bridge(Arc::clone(bridge) as _, config).unwrap()
    }

    fn named(given: &str) -> Contact {
        Contact {
            name: ContactName {
                given_name: Some(given.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn wait_for_picker(bridge: &MemoryBridge) {
        while bridge.open_picker_sessions().is_empty() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn prompt_is_requested_once_then_read_runs_once() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Prompt));
        bridge.insert(named("Grace"));

        let contacts = plugin(&bridge)
            .get_contacts(GetContactsOptions::default())
            .await
            .unwrap();

        assert_eq!(contacts.len(), 1);
        assert_eq!(bridge.permission_requests(), 1);
        assert_eq!(bridge.store_calls(), 1);
    }

    #[tokio::test]
    async fn declined_prompt_never_reaches_store() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Prompt));
        bridge.answer_prompt_with(PermissionState::Denied);

        let err = plugin(&bridge)
            .get_contacts(GetContactsOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ContactsError::PermissionDenied));
        assert_eq!(bridge.permission_requests(), 1);
        assert_eq!(bridge.store_calls(), 0);
    }

    #[tokio::test]
    async fn missing_contact_id_skips_gate() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Denied));
        let err = plugin(&bridge)
            .delete_contact(DeleteContactOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ContactsError::MissingParameter("contactId")));
        assert_eq!(bridge.permission_requests(), 0);
        assert_eq!(bridge.store_calls(), 0);
    }

    #[tokio::test]
    async fn empty_projection_returns_every_field() {
        let bridge = Arc::new(MemoryBridge::new());
        let id = bridge.insert(named("Alan"));

        let payload = plugin(&bridge)
            .get_contact(GetContactOptions {
                contact_id: Some(id.clone()),
                projection: Some(Projection::default()),
            })
            .await
            .unwrap();

        assert_eq!(payload.contact_id.as_deref(), Some(id.as_str()));
        assert_eq!(payload.given_name.as_deref(), Some("Alan"));
        assert_eq!(payload.phones, Some(Vec::new()));
        assert_eq!(payload.postal_addresses, Some(Vec::new()));
    }

    #[tokio::test]
    async fn failed_write_is_generic_failure() {
        let bridge = Arc::new(MemoryBridge::new());
        bridge.fail_writes(true);
        let err = plugin(&bridge)
            .create_contact(CreateContactOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContactsError::StoreFailure(_)));
    }

    #[tokio::test]
    async fn deleting_unknown_contact_fails() {
        let bridge = Arc::new(MemoryBridge::new());
        let err = plugin(&bridge)
            .delete_contact(DeleteContactOptions {
                contact_id: Some(ContactId::new("404")),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContactsError::StoreFailure(_)));
    }

    #[tokio::test]
    async fn overlapping_pick_is_busy_and_first_still_resolves() {
        let bridge = Arc::new(MemoryBridge::new());
        let plugin = plugin(&bridge);

        let first = tokio::spawn({
            let plugin = plugin.clone();
            async move { plugin.pick_contacts(PickContactsOptions::default()).await }
        });
        wait_for_picker(&bridge).await;

        let second = plugin.pick_contacts(PickContactsOptions::default()).await;
        assert!(matches!(second, Err(ContactsError::PickerBusy { open: 1, limit: 1 })));
        assert_eq!(bridge.picker_presentations(), 1);

        let session = bridge.open_picker_sessions()[0];
        let mut picked = named("Katherine");
        picked.id = ContactId::new("12");
        assert!(bridge.fire_picker_event(session, PickerEvent::SelectedMany(vec![picked])));

        match first.await.unwrap().unwrap() {
            PickResult::Many { message, contacts } => {
                assert_eq!(message, "OK");
                assert_eq!(contacts.len(), 1);
                assert_eq!(contacts[0].contact_id.as_deref(), Some("12"));
            }
            other => panic!("expected many, got {other:?}"),
        }
        assert_eq!(plugin.open_picker_sessions(), 0);
    }

    #[tokio::test]
    async fn cancelled_pick_rejects() {
        let bridge = Arc::new(MemoryBridge::new());
        bridge.script_picker(PickerScript::Respond(PickerEvent::Cancelled));

        let err = plugin(&bridge)
            .pick_contacts(PickContactsOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContactsError::PickerCancelled));
    }

    #[tokio::test]
    async fn picker_failure_rejects_with_reason() {
        let bridge = Arc::new(MemoryBridge::new());
        bridge.script_picker(PickerScript::Respond(PickerEvent::Failed(
            "no root view controller".into(),
        )));

        match plugin(&bridge).pick_contacts(PickContactsOptions::default()).await {
            Err(ContactsError::PickerFailed(reason)) => {
                assert_eq!(reason, "no root view controller")
            }
            other => panic!("expected picker failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_after_queued_presentation_rejects() {
        let bridge = Arc::new(MemoryBridge::new());
        let plugin = plugin(&bridge);

        let pick = tokio::spawn({
            let plugin = plugin.clone();
            async move { plugin.pick_contacts(PickContactsOptions::default()).await }
        });
        wait_for_picker(&bridge).await;

        let session = bridge.open_picker_sessions()[0];
        assert!(bridge.fire_picker_event(
            session,
            PickerEvent::Failed("must be called from the main thread".into())
        ));

        match pick.await.unwrap() {
            Err(ContactsError::PickerFailed(reason)) => {
                assert_eq!(reason, "must be called from the main thread")
            }
            other => panic!("expected picker failure, got {other:?}"),
        }
        assert_eq!(plugin.open_picker_sessions(), 0);
    }

    #[tokio::test]
    async fn picked_ids_are_loaded_with_projection() {
        let bridge = Arc::new(MemoryBridge::new());
        let mut with_phone = named("Edsger");
        with_phone.phones.push(LabeledValue::labeled("work", "+31 20"));
        let id = bridge.insert(with_phone);
        bridge.script_picker(PickerScript::Respond(PickerEvent::SelectedIds(vec![
            id.clone(),
            ContactId::new("gone"),
        ])));

        let result = plugin(&bridge)
            .pick_contacts(PickContactsOptions {
                projection: Some(Projection::of([ContactField::Phones])),
            })
            .await
            .unwrap();

        let expected = ContactPayload {
            phones: Some(vec!["+31 20".into()]),
            ..Default::default()
        };
        assert_eq!(result, PickResult::many(vec![expected]));
    }

    #[tokio::test]
    async fn picker_gets_configured_options() {
        let bridge = Arc::new(MemoryBridge::new());
        let config = PluginConfig {
            picker_title: "Invite friends".into(),
            selection_mode: multicontact_core::SelectionMode::Single,
            ..PluginConfig::default()
        };
        let plugin =
            ContactsPlugin::with_bridge(Arc::clone(&bridge) as _, config).unwrap();

        let pick = tokio::spawn({
            let plugin = plugin.clone();
            async move { plugin.pick_contacts(PickContactsOptions::default()).await }
        });
        wait_for_picker(&bridge).await;

        let options = bridge.last_picker_options().unwrap();
        assert_eq!(options.title, "Invite friends");
        assert_eq!(options.selection_mode, multicontact_core::SelectionMode::Single);

        let session = bridge.open_picker_sessions()[0];
        bridge.fire_picker_event(session, PickerEvent::Cancelled);
        assert!(pick.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn abandoned_pick_frees_its_session() {
        let bridge = Arc::new(MemoryBridge::new());
        let plugin = plugin(&bridge);

        let pick = tokio::spawn({
            let plugin = plugin.clone();
            async move { plugin.pick_contacts(PickContactsOptions::default()).await }
        });
        wait_for_picker(&bridge).await;
        assert_eq!(plugin.open_picker_sessions(), 1);

        pick.abort();
        assert!(pick.await.unwrap_err().is_cancelled());
        assert_eq!(plugin.open_picker_sessions(), 0);

        // The native picker is still up; its late answer is ignored.
        let session = bridge.open_picker_sessions()[0];
        assert!(bridge.fire_picker_event(session, PickerEvent::Cancelled));
    }

    #[tokio::test]
    async fn audit_records_hashed_subjects() {
        let bridge = Arc::new(MemoryBridge::new());
        let plugin = audited(&bridge);

        let id = plugin
            .create_contact(CreateContactOptions::default())
            .await
            .unwrap();
        plugin
            .delete_contact(DeleteContactOptions {
                contact_id: Some(id.clone()),
            })
            .await
            .unwrap();

        let entries = plugin.recent_audit_entries(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "delete_contact");
        assert_eq!(entries[1].action, "create_contact");
        assert!(entries.iter().all(|e| e.subject_hash == subject_hash(&id)));
        assert!(entries.iter().all(|e| e.success));
    }

    #[tokio::test]
    async fn audit_disabled_by_default() {
        let bridge = Arc::new(MemoryBridge::new());
        let plugin = plugin(&bridge);
        plugin.get_contacts(GetContactsOptions::default()).await.unwrap();
        assert!(plugin.recent_audit_entries(10).unwrap().is_empty());
    }

    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    #[tokio::test]
    async fn desktop_rejects_everything_as_unimplemented() {
        let plugin = ContactsPlugin::for_current_platform(PluginConfig::default()).unwrap();

        assert!(matches!(
            plugin.check_permissions().await,
            Err(ContactsError::Unimplemented(p)) if p == "desktop"
        ));
        assert!(matches!(
            plugin.request_permissions().await,
            Err(ContactsError::Unimplemented(_))
        ));
        assert!(matches!(
            plugin.get_contact(GetContactOptions::default()).await,
            Err(ContactsError::Unimplemented(_))
        ));
        assert!(matches!(
            plugin.pick_contacts(PickContactsOptions::default()).await,
            Err(ContactsError::Unimplemented(_))
        ));
    }
}
