// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-visible rejections.
//
// Every `ContactsError` is mapped to the message the application layer sees
// plus a stable code, so callers can branch without matching on message
// text. Messages for storage and bridge failures are deliberately generic;
// the detail goes to the log instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ContactsError;

/// Stable, machine-readable rejection code.
///
/// The wire form is `as_str`, for both serde and `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PermissionDenied,
    MissingParameter,
    InvalidArguments,
    NotFound,
    Failed,
    Unimplemented,
    PickerBusy,
    PickerCancelled,
    PickerFailed,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::PermissionDenied,
        ErrorCode::MissingParameter,
        ErrorCode::InvalidArguments,
        ErrorCode::NotFound,
        ErrorCode::Failed,
        ErrorCode::Unimplemented,
        ErrorCode::PickerBusy,
        ErrorCode::PickerCancelled,
        ErrorCode::PickerFailed,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::NotFound => "NOT_FOUND",
            Self::Failed => "FAILED",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::PickerBusy => "PICKER_BUSY",
            Self::PickerCancelled => "PICKER_CANCELLED",
            Self::PickerFailed => "PICKER_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code `{code}`")))
    }
}

/// A rejected call as delivered to the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub message: String,
    pub code: ErrorCode,
}

impl Rejection {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Rejection {}

/// Convert a `ContactsError` into the rejection the caller sees.
pub fn reject(err: &ContactsError) -> Rejection {
    match err {
        ContactsError::MissingParameter(name) => Rejection::new(
            ErrorCode::MissingParameter,
            format!("Parameter `{name}` not provided."),
        ),
        ContactsError::InvalidArguments(detail) => {
            Rejection::new(ErrorCode::InvalidArguments, format!("Invalid arguments: {detail}"))
        }
        ContactsError::PermissionDenied => Rejection::new(
            ErrorCode::PermissionDenied,
            "Permission is required to access contacts.",
        ),
        ContactsError::NotFound(_) => Rejection::new(ErrorCode::NotFound, "Contact not found."),
        ContactsError::PickerBusy { .. } => Rejection::new(
            ErrorCode::PickerBusy,
            "The contact picker is already open.",
        ),
        ContactsError::PickerCancelled => Rejection::new(
            ErrorCode::PickerCancelled,
            "User closed the picker without selecting items.",
        ),
        ContactsError::PickerFailed(detail) => Rejection::new(
            ErrorCode::PickerFailed,
            format!("The contact picker failed: {detail}"),
        ),
        ContactsError::Unimplemented(platform) => Rejection::new(
            ErrorCode::Unimplemented,
            format!("Not implemented on {platform}."),
        ),
        ContactsError::UnknownMethod(method) => Rejection::new(
            ErrorCode::Unimplemented,
            format!("Method `{method}` is not implemented."),
        ),

        // Store, bridge and persistence failures share one generic message.
        ContactsError::StoreFailure(_)
        | ContactsError::Database(_)
        | ContactsError::Io(_)
        | ContactsError::Serialization(_)
        | ContactsError::Bridge(_) => Rejection::new(ErrorCode::Failed, "Something went wrong."),
    }
}

impl From<ContactsError> for Rejection {
    fn from(err: ContactsError) -> Self {
        reject(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_original_messages() {
        assert_eq!(
            reject(&ContactsError::MissingParameter("contactId")).message,
            "Parameter `contactId` not provided."
        );
        assert_eq!(
            reject(&ContactsError::PermissionDenied).message,
            "Permission is required to access contacts."
        );
        assert_eq!(
            reject(&ContactsError::NotFound("x".into())).message,
            "Contact not found."
        );
        assert_eq!(
            reject(&ContactsError::StoreFailure("insert returned no id".into())).message,
            "Something went wrong."
        );
        assert_eq!(
            reject(&ContactsError::Unimplemented("web".into())).message,
            "Not implemented on web."
        );
    }

    #[test]
    fn not_found_is_distinct_from_generic_failure() {
        assert_eq!(reject(&ContactsError::NotFound("x".into())).code, ErrorCode::NotFound);
        assert_eq!(
            reject(&ContactsError::StoreFailure("x".into())).code,
            ErrorCode::Failed
        );
    }

    #[test]
    fn generic_failures_hide_detail() {
        let r = reject(&ContactsError::Bridge("JNI attach failed: -1".into()));
        assert_eq!(r.code, ErrorCode::Failed);
        assert!(!r.message.contains("JNI"));
    }

    #[test]
    fn serialises_code_as_screaming_snake_case() {
        let r: Rejection = ContactsError::PickerBusy { open: 1, limit: 1 }.into();
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({
                "message": "The contact picker is already open.",
                "code": "PICKER_BUSY"
            })
        );
        assert_eq!(r.to_string(), "[PICKER_BUSY] The contact picker is already open.");
    }

    #[test]
    fn wire_code_and_display_agree() {
        for code in ErrorCode::ALL {
            let wire = serde_json::to_value(code).unwrap();
            assert_eq!(wire, serde_json::Value::String(code.to_string()));
            assert_eq!(serde_json::from_value::<ErrorCode>(wire).unwrap(), code);
        }
        assert!(serde_json::from_str::<ErrorCode>("\"BOGUS\"").is_err());
    }
}
