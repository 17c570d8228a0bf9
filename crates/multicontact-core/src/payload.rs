// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contact payload mapper.
//
// Turns a native `Contact` into the flat object handed back to the
// application layer. Only projected fields are present; every value is a
// string or an array of strings, passed through exactly as the store
// provided it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::projection::{ContactField, Projection};
use crate::types::{Contact, LabeledValue};

/// Flat, projection-shaped view of a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_suffix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_addresses: Option<Vec<String>>,
}

impl ContactPayload {
    /// Map `contact` through `projection`.
    pub fn project(contact: &Contact, projection: &Projection) -> Self {
        let mut out = Self::default();

        for field in projection.fields() {
            match field {
                ContactField::ContactId => out.contact_id = Some(contact.id.to_string()),
                ContactField::Name => {
                    let name = &contact.name;
                    out.display_name = name.display();
                    out.given_name = name.given_name.clone();
                    out.middle_name = name.middle_name.clone();
                    out.family_name = name.family_name.clone();
                    out.name_prefix = name.name_prefix.clone();
                    out.name_suffix = name.name_suffix.clone();
                }
                ContactField::Organization => {
                    out.organization_name = contact.organization.organization_name.clone();
                    out.job_title = contact.organization.job_title.clone();
                }
                ContactField::Birthday => out.birthday = contact.birthday.map(|b| b.to_string()),
                ContactField::Note => out.note = contact.note.clone(),
                ContactField::Phones => out.phones = Some(values(&contact.phones)),
                ContactField::Emails => out.emails = Some(values(&contact.emails)),
                ContactField::Urls => out.urls = Some(values(&contact.urls)),
                ContactField::PostalAddresses => {
                    out.postal_addresses = Some(values(&contact.postal_addresses))
                }
            }
        }

        out
    }

    /// JSON object form, as resolved to the caller.
    pub fn to_json(&self) -> Value {
        // A struct of strings and string arrays always serialises.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn values(entries: &[LabeledValue]) -> Vec<String> {
    entries.iter().map(|e| e.value.clone()).collect()
}
