// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field projection requested by the caller.
//
// Wire form is an object of booleans (`{ "name": true, "phones": true }`).
// Once any key is `true`, only the `true` keys are requested. An object of
// nothing but `false` keys requests every field except those. Unknown keys
// and non-boolean values are ignored, and an absent or empty projection
// places no restriction on the output.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ContactsError, Result};

/// A projectable contact field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactField {
    ContactId,
    Name,
    Organization,
    Birthday,
    Note,
    Phones,
    Emails,
    Urls,
    PostalAddresses,
}

impl ContactField {
    pub const ALL: [ContactField; 9] = [
        ContactField::ContactId,
        ContactField::Name,
        ContactField::Organization,
        ContactField::Birthday,
        ContactField::Note,
        ContactField::Phones,
        ContactField::Emails,
        ContactField::Urls,
        ContactField::PostalAddresses,
    ];

    /// Key used in the projection object.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ContactId => "contactId",
            Self::Name => "name",
            Self::Organization => "organization",
            Self::Birthday => "birthday",
            Self::Note => "note",
            Self::Phones => "phones",
            Self::Emails => "emails",
            Self::Urls => "urls",
            Self::PostalAddresses => "postalAddresses",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// The set of fields a caller asked for.
///
/// `{ "phones": false, "emails": false }` keeps every field but phones and
/// emails; `false` keys only matter when no key is `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct Projection {
    fields: BTreeSet<ContactField>,
    excluded: BTreeSet<ContactField>,
}

impl Projection {
    /// No restriction: every field is included.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of(fields: impl IntoIterator<Item = ContactField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            excluded: BTreeSet::new(),
        }
    }

    /// Parse the optional `projection` argument of a call.
    ///
    /// `None` and JSON `null` mean "all fields"; anything other than an
    /// object is rejected.
    pub fn from_argument(arg: Option<&Value>) -> Result<Self> {
        match arg {
            None | Some(Value::Null) => Ok(Self::all()),
            Some(Value::Object(map)) => Ok(Self::from_flags(
                map.iter().map(|(k, v)| (k.as_str(), v.as_bool())),
            )),
            Some(other) => Err(ContactsError::InvalidArguments(format!(
                "`projection` must be an object, got {other}"
            ))),
        }
    }

    fn from_flags<'a>(flags: impl Iterator<Item = (&'a str, Option<bool>)>) -> Self {
        let mut fields = BTreeSet::new();
        let mut excluded = BTreeSet::new();
        for (key, flag) in flags {
            let Some(field) = ContactField::from_key(key) else {
                continue;
            };
            match flag {
                Some(true) => {
                    fields.insert(field);
                }
                Some(false) => {
                    excluded.insert(field);
                }
                None => {}
            }
        }
        if !fields.is_empty() {
            excluded.clear();
        }
        Self { fields, excluded }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.fields.is_empty() && self.excluded.is_empty()
    }

    pub fn includes(&self, field: ContactField) -> bool {
        if self.fields.is_empty() {
            !self.excluded.contains(&field)
        } else {
            self.fields.contains(&field)
        }
    }

    /// Fields the output will carry, in canonical order.
    pub fn fields(&self) -> Vec<ContactField> {
        ContactField::ALL
            .into_iter()
            .filter(|f| self.includes(*f))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for Projection {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::from_flags(map.iter().map(|(k, v)| (k.as_str(), v.as_bool())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_empty_projection_mean_all_fields() {
        assert!(Projection::from_argument(None).unwrap().is_unrestricted());
        assert!(Projection::from_argument(Some(&Value::Null)).unwrap().is_unrestricted());

        let empty = Projection::from_argument(Some(&json!({}))).unwrap();
        assert!(empty.is_unrestricted());
        assert_eq!(empty.fields().len(), ContactField::ALL.len());
    }

    #[test]
    fn only_true_flags_are_requested() {
        let p = Projection::from_argument(Some(&json!({
            "phones": true,
            "emails": false,
            "name": "yes",
            "favouriteColour": true
        })))
        .unwrap();

        assert_eq!(p.fields(), vec![ContactField::Phones]);
        assert!(!p.includes(ContactField::Emails));
        assert!(!p.includes(ContactField::Name));
    }

    #[test]
    fn false_only_flags_exclude_those_fields() {
        let p = Projection::from_argument(Some(&json!({ "phones": false, "emails": false })))
            .unwrap();
        assert!(!p.is_unrestricted());
        assert!(!p.includes(ContactField::Phones));
        assert!(!p.includes(ContactField::Emails));
        assert!(p.includes(ContactField::Name));
        assert_eq!(p.fields().len(), ContactField::ALL.len() - 2);
    }

    #[test]
    fn non_boolean_flags_are_ignored() {
        let p = Projection::from_argument(Some(&json!({ "phones": "no", "bogus": false })))
            .unwrap();
        assert!(p.is_unrestricted());
    }

    #[test]
    fn non_object_projection_is_invalid() {
        let err = Projection::from_argument(Some(&json!(["phones"]))).unwrap_err();
        assert!(matches!(err, ContactsError::InvalidArguments(_)));
    }

    #[test]
    fn deserializes_inside_call_arguments() {
        #[derive(Deserialize)]
        struct Args {
            projection: Projection,
        }
        let args: Args =
            serde_json::from_value(json!({ "projection": { "postalAddresses": true } })).unwrap();
        assert_eq!(args.projection, Projection::of([ContactField::PostalAddresses]));
    }

    #[test]
    fn keys_round_trip() {
        for field in ContactField::ALL {
            assert_eq!(ContactField::from_key(field.key()), Some(field));
        }
        assert_eq!(ContactField::from_key("image"), None);
    }
}
