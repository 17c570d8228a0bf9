// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/web/CI builds where no native contacts store exists.
//
// Every trait method returns `Unimplemented`; the real implementations live in
// the `ios` and `android` modules.

use std::sync::Arc;

use multicontact_core::error::{ContactsError, Result};
use multicontact_core::{
    Contact, ContactId, NewContact, PermissionState, PickerOptions, PickerSessionId, Projection,
};

use crate::traits::*;

/// No-op bridge returned on non-mobile platforms.
#[derive(Debug, Clone, Copy)]
pub struct StubBridge;

impl StubBridge {
    fn unimplemented(&self, operation: &str) -> ContactsError {
        tracing::warn!(operation, "contacts operation called on stub bridge");
        ContactsError::Unimplemented(self.platform_name().to_owned())
    }
}

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "desktop"
    }

    fn supports_contacts(&self) -> bool {
        false
    }
}

impl NativeContactsPermission for StubBridge {
    fn authorization_status(&self) -> Result<PermissionState> {
        Err(self.unimplemented("authorization_status"))
    }

    fn request_access(&self, _done: Completion<()>) -> Result<()> {
        Err(self.unimplemented("request_access"))
    }
}

impl NativeContactStore for StubBridge {
    fn fetch_contact(&self, _id: &ContactId, _projection: &Projection) -> Result<Option<Contact>> {
        Err(self.unimplemented("fetch_contact"))
    }

    fn fetch_contacts(&self, _projection: &Projection) -> Result<Vec<Contact>> {
        Err(self.unimplemented("fetch_contacts"))
    }

    fn create_contact(&self, _contact: &NewContact) -> Result<ContactId> {
        Err(self.unimplemented("create_contact"))
    }

    fn delete_contact(&self, _id: &ContactId) -> Result<bool> {
        Err(self.unimplemented("delete_contact"))
    }
}

impl NativeContactPicker for StubBridge {
    fn present_picker(
        &self,
        _session: PickerSessionId,
        _options: &PickerOptions,
        _listener: Arc<dyn PickerListener>,
    ) -> Result<()> {
        Err(self.unimplemented("present_picker"))
    }
}
