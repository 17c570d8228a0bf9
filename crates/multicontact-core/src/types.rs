// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the MultiContact plugin.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier assigned to a contact by the native store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl ContactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ContactId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for one presentation of the native contact picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickerSessionId(pub Uuid);

impl PickerSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PickerSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PickerSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contacts authorisation as seen by the caller.
///
/// Derived from the OS status on every call; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Not yet asked; requesting will show the system prompt.
    Prompt,
    /// Denied or restricted by the user or device policy.
    Denied,
    /// Access granted.
    Granted,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Denied => "denied",
            Self::Granted => "granted",
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result object of `checkPermissions` / `requestPermissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
    pub contacts: PermissionState,
}

/// A multi-valued contact entry (phone, email, URL, postal address).
///
/// Accepts either a bare string or `{ "label": ..., "value": ... }` on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LabeledValueRepr")]
pub struct LabeledValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
}

impl LabeledValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            label: None,
            value: value.into(),
        }
    }

    pub fn labeled(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            value: value.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabeledValueRepr {
    Plain(String),
    Labeled {
        #[serde(default)]
        label: Option<String>,
        value: String,
    },
}

impl From<LabeledValueRepr> for LabeledValue {
    fn from(repr: LabeledValueRepr) -> Self {
        match repr {
            LabeledValueRepr::Plain(value) => Self { label: None, value },
            LabeledValueRepr::Labeled { label, value } => Self { label, value },
        }
    }
}

/// Name parts of a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_suffix: Option<String>,
}

impl ContactName {
    /// The store-provided display name, or the non-empty parts joined with
    /// spaces when the store has none.
    pub fn display(&self) -> Option<String> {
        if let Some(display) = &self.display_name {
            return Some(display.clone());
        }
        let parts: Vec<&str> = [
            &self.name_prefix,
            &self.given_name,
            &self.middle_name,
            &self.family_name,
            &self.name_suffix,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display().is_none()
    }
}

/// Company and role of a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

/// A birthday; iOS and Android both allow the year to be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BirthdayRepr")]
pub struct Birthday {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub month: u32,
    pub day: u32,
}

/// Leap year used to validate year-less dates so that 29 February is accepted.
const YEARLESS_REFERENCE: i32 = 2000;

impl Birthday {
    /// Build a birthday, rejecting impossible calendar dates.
    pub fn new(year: Option<i32>, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year.unwrap_or(YEARLESS_REFERENCE), month, day)?;
        Some(Self { year, month, day })
    }
}

impl From<NaiveDate> for Birthday {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl std::fmt::Display for Birthday {
    /// `YYYY-MM-DD`, or `--MM-DD` (vCard style) without a year.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.year {
            Some(year) => write!(f, "{year:04}-{:02}-{:02}", self.month, self.day),
            None => write!(f, "--{:02}-{:02}", self.month, self.day),
        }
    }
}

impl std::str::FromStr for Birthday {
    type Err = String;

    /// Parse `YYYY-MM-DD` or the year-less `--MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid birthday: {s:?}");
        if let Some(rest) = s.strip_prefix("--") {
            let (month, day) = rest.split_once('-').ok_or_else(invalid)?;
            let month = month.parse().map_err(|_| invalid())?;
            let day = day.parse().map_err(|_| invalid())?;
            return Birthday::new(None, month, day).ok_or_else(invalid);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Birthday::from)
            .map_err(|_| invalid())
    }
}

#[derive(Deserialize)]
struct BirthdayRepr {
    #[serde(default)]
    year: Option<i32>,
    month: u32,
    day: u32,
}

impl TryFrom<BirthdayRepr> for Birthday {
    type Error = String;

    fn try_from(repr: BirthdayRepr) -> Result<Self, Self::Error> {
        Birthday::new(repr.year, repr.month, repr.day).ok_or_else(|| {
            format!(
                "invalid birthday: year {:?}, month {}, day {}",
                repr.year, repr.month, repr.day
            )
        })
    }
}

/// A contact record as read from the native store.
///
/// Held only for the duration of a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: ContactName,
    pub organization: Organization,
    pub birthday: Option<Birthday>,
    pub note: Option<String>,
    pub phones: Vec<LabeledValue>,
    pub emails: Vec<LabeledValue>,
    pub urls: Vec<LabeledValue>,
    pub postal_addresses: Vec<LabeledValue>,
}

/// The `contact` argument of `createContact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[serde(flatten)]
    pub name: ContactName,
    #[serde(flatten)]
    pub organization: Organization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<Birthday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub phones: Vec<LabeledValue>,
    #[serde(default)]
    pub emails: Vec<LabeledValue>,
    #[serde(default)]
    pub urls: Vec<LabeledValue>,
    #[serde(default)]
    pub postal_addresses: Vec<LabeledValue>,
}

impl NewContact {
    /// Materialise the record a store would hold once it assigns `id`.
    pub fn into_contact(self, id: ContactId) -> Contact {
        Contact {
            id,
            name: self.name,
            organization: self.organization,
            birthday: self.birthday,
            note: self.note,
            phones: self.phones,
            emails: self.emails,
            urls: self.urls,
            postal_addresses: self.postal_addresses,
        }
    }
}

/// How many contacts the native picker lets the user select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Single,
    #[default]
    Multiple,
}

/// Presentation options handed to the native picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub title: String,
    pub selection_mode: SelectionMode,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            title: "Select Contacts".into(),
            selection_mode: SelectionMode::Multiple,
        }
    }
}
