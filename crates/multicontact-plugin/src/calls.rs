// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON call surface.
//
// The host plugin runtime hands us a method name and a JSON argument object
// and expects a JSON result object or a `{ message, code }` rejection.

use multicontact_core::error::ContactsError;
use multicontact_core::{ContactId, ContactPayload, NewContact, Projection, Rejection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::dispatcher::ContactsPlugin;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetContactOptions {
    #[serde(default, deserialize_with = "string_id")]
    pub contact_id: Option<ContactId>,
    #[serde(default)]
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetContactsOptions {
    #[serde(default)]
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateContactOptions {
    /// Absent means an empty contact.
    #[serde(default)]
    pub contact: Option<NewContact>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContactOptions {
    #[serde(default, deserialize_with = "string_id")]
    pub contact_id: Option<ContactId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickContactsOptions {
    #[serde(default)]
    pub projection: Option<Projection>,
}

/// Resolution of `pickContacts`; the shape follows the picker variant that
/// fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PickResult {
    One { contact: ContactPayload },
    Many { message: String, contacts: Vec<ContactPayload> },
}

impl PickResult {
    pub fn many(contacts: Vec<ContactPayload>) -> Self {
        Self::Many {
            message: "OK".into(),
            contacts,
        }
    }
}

/// A `contactId` that is not a string counts as not provided.
fn string_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ContactId>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(ContactId::new(id)),
        _ => None,
    })
}

fn is_known(method: &str) -> bool {
    matches!(
        method,
        "checkPermissions"
            | "requestPermissions"
            | "getContact"
            | "getContacts"
            | "createContact"
            | "deleteContact"
            | "pickContacts"
    )
}

fn args<T: DeserializeOwned>(value: Value) -> Result<T, ContactsError> {
    let value = match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| ContactsError::InvalidArguments(e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ContactsError> {
    Ok(serde_json::to_value(value)?)
}

impl ContactsPlugin {
    /// Dispatch one call from the host runtime by method name.
    pub async fn handle(&self, method: &str, arguments: Value) -> Result<Value, Rejection> {
        debug!(method, "plugin call");
        self.dispatch(method, arguments).await.map_err(Rejection::from)
    }

    async fn dispatch(&self, method: &str, arguments: Value) -> Result<Value, ContactsError> {
        if is_known(method) {
            self.ensure_supported()?;
        }
        match method {
            "checkPermissions" => to_value(&self.check_permissions().await?),
            "requestPermissions" => to_value(&self.request_permissions().await?),
            "getContact" => {
                let contact = self.get_contact(args(arguments)?).await?;
                Ok(json!({ "contact": contact }))
            }
            "getContacts" => {
                let contacts = self.get_contacts(args(arguments)?).await?;
                Ok(json!({ "contacts": contacts }))
            }
            "createContact" => {
                let id = self.create_contact(args(arguments)?).await?;
                Ok(json!({ "contactId": id }))
            }
            "deleteContact" => {
                self.delete_contact(args(arguments)?).await?;
                Ok(json!({}))
            }
            "pickContacts" => to_value(&self.pick_contacts(args(arguments)?).await?),
            other => Err(ContactsError::UnknownMethod(other.to_owned())),
        }
    }
}
