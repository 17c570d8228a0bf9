// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Store access goes through the
// `ContactsContract` provider via `ContentResolver`; the picker is the
// system `ACTION_PICK` activity.
//
// ## Architecture notes
//
// Store reads and writes complete synchronously over JNI.
//
// The permission prompt and the picker report back through the host
// Activity (`onRequestPermissionsResult` / `onActivityResult`). The host must
// forward those to the `MultiContactBridge` native methods exported at the
// bottom of this file:
//
// ```java
// package org.hyperpolymath.multicontact;
// public final class MultiContactBridge {
//     public static native void onPermissionResult();
//     public static native void onContactsPicked(int requestCode, String[] contactIds);
//     public static native void onPickerCancelled(int requestCode);
//     public static native void onPickerFailed(int requestCode, String reason);
// }
// ```

#![cfg(target_os = "android")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jni::objects::{JClass, JObject, JObjectArray, JString, JValue};
use jni::sys::jint;
use jni::JNIEnv;

use multicontact_core::error::{ContactsError, Result};
use multicontact_core::{
    Birthday, Contact, ContactField, ContactId, LabeledValue, NewContact, PermissionState,
    PickerOptions, PickerSessionId, Projection, SelectionMode,
};

use crate::pending::PendingPickers;
use crate::traits::*;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const READ_CONTACTS: &str = "android.permission.READ_CONTACTS";
const WRITE_CONTACTS: &str = "android.permission.WRITE_CONTACTS";
/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: jint = 0;

/// Request code for the contacts permission prompt. The host Activity must
/// recognise it in `onRequestPermissionsResult`.
pub const REQUEST_CONTACTS_PERMISSION: i32 = 0x4D43; // "MC"
/// Picker request codes are `REQUEST_PICK_CONTACTS_BASE + n`, n < 256, so
/// they fit the 16 bits `ComponentActivity` allows.
pub const REQUEST_PICK_CONTACTS_BASE: i32 = 0x4D00;

/// SharedPreferences used to remember that the prompt was shown once, which
/// separates "never asked" from "permanently denied".
const PREFS_FILE: &str = "multicontact_state";
const PREFS_KEY_REQUESTED: &str = "multicontact_contacts_requested";

const CONTACTS_URI: &str = "content://com.android.contacts/contacts";
const RAW_CONTACTS_URI: &str = "content://com.android.contacts/raw_contacts";
const DATA_URI: &str = "content://com.android.contacts/data";

const MIME_NAME: &str = "vnd.android.cursor.item/name";
const MIME_PHONE: &str = "vnd.android.cursor.item/phone_v2";
const MIME_EMAIL: &str = "vnd.android.cursor.item/email_v2";
const MIME_WEBSITE: &str = "vnd.android.cursor.item/website";
const MIME_POSTAL: &str = "vnd.android.cursor.item/postal-address_v2";
const MIME_ORGANIZATION: &str = "vnd.android.cursor.item/organization";
const MIME_NOTE: &str = "vnd.android.cursor.item/note";
const MIME_EVENT: &str = "vnd.android.cursor.item/contact_event";

/// `CommonDataKinds.Event.TYPE_BIRTHDAY`.
const EVENT_TYPE_BIRTHDAY: &str = "3";
/// `BaseTypes.TYPE_CUSTOM`; the label column then carries the text.
const TYPE_CUSTOM: i32 = 0;
/// `Phone.TYPE_OTHER` / `Email.TYPE_OTHER`.
const PHONE_TYPE_OTHER: i32 = 7;
const EMAIL_TYPE_OTHER: i32 = 3;

/// Columns read from the Data table, in cursor order.
const DATA_COLUMNS: [&str; 8] = [
    "contact_id",
    "mimetype",
    "data1",
    "data2",
    "data3",
    "data4",
    "data5",
    "data6",
];

// ---------------------------------------------------------------------------
// Pending native callbacks
// ---------------------------------------------------------------------------

static PENDING_PERMISSION: Mutex<Vec<Completion<()>>> = Mutex::new(Vec::new());
static PENDING_PICKERS: PendingPickers = PendingPickers::new(REQUEST_PICK_CONTACTS_BASE);

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deliver_picker_event(request_code: i32, event: PickerEvent) {
    PENDING_PICKERS.deliver(request_code, event);
}

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// Obtain a [`JNIEnv`] handle from the global Android context, attaching the
/// current thread if needed.
fn jni_env() -> Result<JNIEnv<'static>> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { jni::JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| ContactsError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    vm.attach_current_thread_permanently()
        .map_err(|e| ContactsError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the current Android `Activity` as a [`JObject`].
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(ContactsError::Bridge(
            "Android context is null: native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Map any `jni::errors::Error` into `ContactsError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> ContactsError {
    ContactsError::Bridge(format!("{context}: {e}"))
}

fn jstring<'a>(env: &mut JNIEnv<'a>, s: &str) -> Result<JString<'a>> {
    env.new_string(s).map_err(|e| jni_err("new_string", e))
}

fn string_array<'a>(env: &mut JNIEnv<'a>, items: &[&str]) -> Result<JObjectArray<'a>> {
    let array = env
        .new_object_array(items.len() as i32, "java/lang/String", JObject::null())
        .map_err(|e| jni_err("new_object_array", e))?;
    for (i, item) in items.iter().enumerate() {
        let s = jstring(env, item)?;
        env.set_object_array_element(&array, i as i32, s)
            .map_err(|e| jni_err("set_object_array_element", e))?;
    }
    Ok(array)
}

fn parse_uri<'a>(env: &mut JNIEnv<'a>, uri: &str) -> Result<JObject<'a>> {
    let s = jstring(env, uri)?;
    env.call_static_method(
        "android/net/Uri",
        "parse",
        "(Ljava/lang/String;)Landroid/net/Uri;",
        &[JValue::Object(&s)],
    )
    .and_then(|v| v.l())
    .map_err(|e| jni_err("Uri.parse", e))
}

fn content_resolver<'a>(env: &mut JNIEnv<'a>, activity: &JObject) -> Result<JObject<'a>> {
    env.call_method(
        activity,
        "getContentResolver",
        "()Landroid/content/ContentResolver;",
        &[],
    )
    .and_then(|v| v.l())
    .map_err(|e| jni_err("getContentResolver", e))
}

/// Read a nullable Java string into a Rust `Option<String>`.
fn opt_string(env: &mut JNIEnv, obj: JObject) -> Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let js = JString::from(obj);
    let s: String = env
        .get_string(&js)
        .map_err(|e| jni_err("get_string", e))?
        .into();
    Ok(Some(s))
}

/// `ContentResolver.query` returning the cursor (possibly null).
fn query<'a>(
    env: &mut JNIEnv<'a>,
    resolver: &JObject,
    uri: &str,
    columns: &[&str],
    selection: Option<&str>,
    args: &[&str],
    sort: Option<&str>,
) -> Result<JObject<'a>> {
    let uri = parse_uri(env, uri)?;
    let columns = string_array(env, columns)?;
    let selection = match selection {
        Some(s) => JObject::from(jstring(env, s)?),
        None => JObject::null(),
    };
    let args = if args.is_empty() {
        JObject::null()
    } else {
        JObject::from(string_array(env, args)?)
    };
    let sort = match sort {
        Some(s) => JObject::from(jstring(env, s)?),
        None => JObject::null(),
    };

    env.call_method(
        resolver,
        "query",
        "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
        &[
            JValue::Object(&uri),
            JValue::Object(&columns),
            JValue::Object(&selection),
            JValue::Object(&args),
            JValue::Object(&sort),
        ],
    )
    .and_then(|v| v.l())
    .map_err(|e| jni_err("ContentResolver.query", e))
}

/// Iterate a cursor, reading `width` string columns per row, then close it.
fn read_rows(env: &mut JNIEnv, cursor: JObject, width: usize) -> Result<Vec<Vec<Option<String>>>> {
    if cursor.is_null() {
        return Err(ContactsError::StoreFailure("query returned no cursor".into()));
    }

    let mut rows = Vec::new();
    let result = (|| -> Result<()> {
        loop {
            let more = env
                .call_method(&cursor, "moveToNext", "()Z", &[])
                .and_then(|v| v.z())
                .map_err(|e| jni_err("Cursor.moveToNext", e))?;
            if !more {
                return Ok(());
            }
            let mut row = Vec::with_capacity(width);
            for col in 0..width {
                let value = env
                    .call_method(
                        &cursor,
                        "getString",
                        "(I)Ljava/lang/String;",
                        &[JValue::Int(col as i32)],
                    )
                    .and_then(|v| v.l())
                    .map_err(|e| jni_err("Cursor.getString", e))?;
                row.push(opt_string(env, value)?);
            }
            rows.push(row);
        }
    })();

    env.call_method(&cursor, "close", "()V", &[])
        .map_err(|e| jni_err("Cursor.close", e))?;
    result.map(|()| rows)
}

fn content_values<'a>(env: &mut JNIEnv<'a>) -> Result<JObject<'a>> {
    env.new_object("android/content/ContentValues", "()V", &[])
        .map_err(|e| jni_err("new ContentValues", e))
}

fn put_str(env: &mut JNIEnv, values: &JObject, key: &str, value: &str) -> Result<()> {
    let k = jstring(env, key)?;
    let v = jstring(env, value)?;
    env.call_method(
        values,
        "put",
        "(Ljava/lang/String;Ljava/lang/String;)V",
        &[JValue::Object(&k), JValue::Object(&v)],
    )
    .map(|_| ())
    .map_err(|e| jni_err("ContentValues.put(String)", e))
}

fn put_long(env: &mut JNIEnv, values: &JObject, key: &str, value: i64) -> Result<()> {
    let k = jstring(env, key)?;
    let boxed = env
        .call_static_method("java/lang/Long", "valueOf", "(J)Ljava/lang/Long;", &[JValue::Long(value)])
        .and_then(|v| v.l())
        .map_err(|e| jni_err("Long.valueOf", e))?;
    env.call_method(
        values,
        "put",
        "(Ljava/lang/String;Ljava/lang/Long;)V",
        &[JValue::Object(&k), JValue::Object(&boxed)],
    )
    .map(|_| ())
    .map_err(|e| jni_err("ContentValues.put(Long)", e))
}

fn put_int(env: &mut JNIEnv, values: &JObject, key: &str, value: i32) -> Result<()> {
    let k = jstring(env, key)?;
    let boxed = env
        .call_static_method(
            "java/lang/Integer",
            "valueOf",
            "(I)Ljava/lang/Integer;",
            &[JValue::Int(value)],
        )
        .and_then(|v| v.l())
        .map_err(|e| jni_err("Integer.valueOf", e))?;
    env.call_method(
        values,
        "put",
        "(Ljava/lang/String;Ljava/lang/Integer;)V",
        &[JValue::Object(&k), JValue::Object(&boxed)],
    )
    .map(|_| ())
    .map_err(|e| jni_err("ContentValues.put(Integer)", e))
}

fn put_null(env: &mut JNIEnv, values: &JObject, key: &str) -> Result<()> {
    let k = jstring(env, key)?;
    env.call_method(values, "putNull", "(Ljava/lang/String;)V", &[JValue::Object(&k)])
        .map(|_| ())
        .map_err(|e| jni_err("ContentValues.putNull", e))
}

/// `ContentResolver.insert`, returning the new row URI (null on failure).
fn insert<'a>(
    env: &mut JNIEnv<'a>,
    resolver: &JObject,
    uri: &str,
    values: &JObject,
) -> Result<JObject<'a>> {
    let uri = parse_uri(env, uri)?;
    env.call_method(
        resolver,
        "insert",
        "(Landroid/net/Uri;Landroid/content/ContentValues;)Landroid/net/Uri;",
        &[JValue::Object(&uri), JValue::Object(values)],
    )
    .and_then(|v| v.l())
    .map_err(|e| jni_err("ContentResolver.insert", e))
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn phone_label(kind: Option<&str>, custom: Option<&str>) -> Option<String> {
    if let Some(label) = custom.filter(|l| !l.is_empty()) {
        return Some(label.to_owned());
    }
    let label = match kind? {
        "1" => "home",
        "2" => "mobile",
        "3" => "work",
        "4" => "fax_work",
        "5" => "fax_home",
        "6" => "pager",
        _ => "other",
    };
    Some(label.into())
}

fn email_label(kind: Option<&str>, custom: Option<&str>) -> Option<String> {
    if let Some(label) = custom.filter(|l| !l.is_empty()) {
        return Some(label.to_owned());
    }
    let label = match kind? {
        "1" => "home",
        "2" => "work",
        "4" => "mobile",
        _ => "other",
    };
    Some(label.into())
}

/// Fold Data-table rows into contacts, keeping first-seen order.
fn assemble(rows: Vec<Vec<Option<String>>>, projection: &Projection) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let col = |i: usize| row.get(i).and_then(|v| v.as_deref());
        let (Some(contact_id), Some(mime)) = (col(0), col(1)) else {
            continue;
        };
        let slot = *index.entry(contact_id.to_owned()).or_insert_with(|| {
            contacts.push(Contact {
                id: ContactId::new(contact_id),
                ..Default::default()
            });
            contacts.len() - 1
        });
        let contact = &mut contacts[slot];
        let owned = |i: usize| col(i).map(str::to_owned);

        match mime {
            MIME_NAME if projection.includes(ContactField::Name) => {
                contact.name.display_name = owned(2);
                contact.name.given_name = owned(3);
                contact.name.family_name = owned(4);
                contact.name.name_prefix = owned(5);
                contact.name.middle_name = owned(6);
                contact.name.name_suffix = owned(7);
            }
            MIME_ORGANIZATION if projection.includes(ContactField::Organization) => {
                contact.organization.organization_name = owned(2);
                contact.organization.job_title = owned(5);
            }
            MIME_NOTE if projection.includes(ContactField::Note) => contact.note = owned(2),
            MIME_EVENT if projection.includes(ContactField::Birthday) => {
                if col(3) == Some(EVENT_TYPE_BIRTHDAY) {
                    contact.birthday = col(2).and_then(|s| s.parse::<Birthday>().ok());
                }
            }
            MIME_PHONE if projection.includes(ContactField::Phones) => {
                if let Some(number) = owned(2) {
                    contact.phones.push(LabeledValue {
                        label: phone_label(col(3), col(4)),
                        value: number,
                    });
                }
            }
            MIME_EMAIL if projection.includes(ContactField::Emails) => {
                if let Some(address) = owned(2) {
                    contact.emails.push(LabeledValue {
                        label: email_label(col(3), col(4)),
                        value: address,
                    });
                }
            }
            MIME_WEBSITE if projection.includes(ContactField::Urls) => {
                if let Some(url) = owned(2) {
                    contact.urls.push(LabeledValue::new(url));
                }
            }
            MIME_POSTAL if projection.includes(ContactField::PostalAddresses) => {
                if let Some(address) = owned(2) {
                    contact.postal_addresses.push(LabeledValue {
                        label: col(4).map(str::to_owned),
                        value: address,
                    });
                }
            }
            _ => {}
        }
    }

    contacts
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the contacts bridge.
///
/// Zero-sized; all state lives on the Java side or in the pending-callback
/// registries above.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge. No JNI call happens until a trait
    /// method is invoked.
    pub fn new() -> Self {
        Self
    }

    fn has_permission(env: &mut JNIEnv, activity: &JObject, permission: &str) -> Result<bool> {
        let p = jstring(env, permission)?;
        let granted = env
            .call_method(
                activity,
                "checkSelfPermission",
                "(Ljava/lang/String;)I",
                &[JValue::Object(&p)],
            )
            .and_then(|v| v.i())
            .map_err(|e| jni_err("checkSelfPermission", e))?;
        Ok(granted == PERMISSION_GRANTED)
    }

    fn prefs<'a>(env: &mut JNIEnv<'a>, activity: &JObject) -> Result<JObject<'a>> {
        let name = jstring(env, PREFS_FILE)?;
        env.call_method(
            activity,
            "getSharedPreferences",
            "(Ljava/lang/String;I)Landroid/content/SharedPreferences;",
            &[JValue::Object(&name), JValue::Int(0)],
        )
        .and_then(|v| v.l())
        .map_err(|e| jni_err("getSharedPreferences", e))
    }

    fn was_requested(env: &mut JNIEnv, activity: &JObject) -> Result<bool> {
        let prefs = Self::prefs(env, activity)?;
        let key = jstring(env, PREFS_KEY_REQUESTED)?;
        env.call_method(
            &prefs,
            "getBoolean",
            "(Ljava/lang/String;Z)Z",
            &[JValue::Object(&key), JValue::Bool(0)],
        )
        .and_then(|v| v.z())
        .map_err(|e| jni_err("SharedPreferences.getBoolean", e))
    }

    fn mark_requested(env: &mut JNIEnv, activity: &JObject) -> Result<()> {
        let prefs = Self::prefs(env, activity)?;
        let editor = env
            .call_method(&prefs, "edit", "()Landroid/content/SharedPreferences$Editor;", &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err("SharedPreferences.edit", e))?;
        let key = jstring(env, PREFS_KEY_REQUESTED)?;
        env.call_method(
            &editor,
            "putBoolean",
            "(Ljava/lang/String;Z)Landroid/content/SharedPreferences$Editor;",
            &[JValue::Object(&key), JValue::Bool(1)],
        )
        .map_err(|e| jni_err("Editor.putBoolean", e))?;
        env.call_method(&editor, "apply", "()V", &[])
            .map_err(|e| jni_err("Editor.apply", e))?;
        Ok(())
    }

    fn query_data(
        &self,
        selection: Option<&str>,
        args: &[&str],
        projection: &Projection,
    ) -> Result<Vec<Contact>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;
        let cursor = query(
            &mut env,
            &resolver,
            DATA_URI,
            &DATA_COLUMNS,
            selection,
            args,
            Some("contact_id ASC"),
        )?;
        let rows = read_rows(&mut env, cursor, DATA_COLUMNS.len())?;
        Ok(assemble(rows, projection))
    }

    /// Insert one Data row for `raw_id`. `fill` adds the kind-specific columns.
    fn insert_data(
        env: &mut JNIEnv,
        resolver: &JObject,
        raw_id: i64,
        mime: &str,
        fill: impl FnOnce(&mut JNIEnv, &JObject) -> Result<()>,
    ) -> Result<()> {
        let values = content_values(env)?;
        put_long(env, &values, "raw_contact_id", raw_id)?;
        put_str(env, &values, "mimetype", mime)?;
        fill(env, &values)?;
        let uri = insert(env, resolver, DATA_URI, &values)?;
        if uri.is_null() {
            return Err(ContactsError::StoreFailure(format!("insert of {mime} row failed")));
        }
        Ok(())
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

impl NativeContactsPermission for AndroidBridge {
    fn authorization_status(&self) -> Result<PermissionState> {
        let mut env = jni_env()?;
        let activity = activity()?;

        if Self::has_permission(&mut env, &activity, READ_CONTACTS)?
            && Self::has_permission(&mut env, &activity, WRITE_CONTACTS)?
        {
            return Ok(PermissionState::Granted);
        }

        let p = jstring(&mut env, READ_CONTACTS)?;
        let rationale = env
            .call_method(
                &activity,
                "shouldShowRequestPermissionRationale",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&p)],
            )
            .and_then(|v| v.z())
            .map_err(|e| jni_err("shouldShowRequestPermissionRationale", e))?;

        // Asked before and the OS will no longer show a rationale: the user
        // chose "don't ask again".
        if !rationale && Self::was_requested(&mut env, &activity)? {
            Ok(PermissionState::Denied)
        } else {
            Ok(PermissionState::Prompt)
        }
    }

    fn request_access(&self, done: Completion<()>) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!("Android: requesting READ/WRITE_CONTACTS");
        locked(&PENDING_PERMISSION).push(done);

        let permissions = string_array(&mut env, &[READ_CONTACTS, WRITE_CONTACTS])?;
        let issued = env
            .call_method(
                &activity,
                "requestPermissions",
                "([Ljava/lang/String;I)V",
                &[JValue::Object(&permissions), JValue::Int(REQUEST_CONTACTS_PERMISSION)],
            )
            .map_err(|e| jni_err("Activity.requestPermissions", e));

        if let Err(e) = issued {
            // Nothing will call back; drop the waiter we just queued.
            locked(&PENDING_PERMISSION).pop();
            return Err(e);
        }
        Self::mark_requested(&mut env, &activity)
    }
}

impl NativeContactStore for AndroidBridge {
    fn fetch_contact(&self, id: &ContactId, projection: &Projection) -> Result<Option<Contact>> {
        let contacts = self.query_data(Some("contact_id = ?"), &[id.as_str()], projection)?;
        Ok(contacts.into_iter().next())
    }

    fn fetch_contacts(&self, projection: &Projection) -> Result<Vec<Contact>> {
        let contacts = self.query_data(None, &[], projection)?;
        tracing::debug!(count = contacts.len(), "Android: read contacts");
        Ok(contacts)
    }

    fn create_contact(&self, input: &NewContact) -> Result<ContactId> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;

        // -- Raw contact in the local (account-less) store -------------------
        let values = content_values(&mut env)?;
        put_null(&mut env, &values, "account_type")?;
        put_null(&mut env, &values, "account_name")?;
        let raw_uri = insert(&mut env, &resolver, RAW_CONTACTS_URI, &values)?;
        if raw_uri.is_null() {
            return Err(ContactsError::StoreFailure("raw contact insert returned null".into()));
        }
        let raw_id = env
            .call_static_method(
                "android/content/ContentUris",
                "parseId",
                "(Landroid/net/Uri;)J",
                &[JValue::Object(&raw_uri)],
            )
            .and_then(|v| v.j())
            .map_err(|e| jni_err("ContentUris.parseId", e))?;

        // -- Data rows -------------------------------------------------------
        let name = &input.name;
        if !name.is_empty() {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_NAME, |env, v| {
                let columns = [
                    ("data1", &name.display_name),
                    ("data2", &name.given_name),
                    ("data3", &name.family_name),
                    ("data4", &name.name_prefix),
                    ("data5", &name.middle_name),
                    ("data6", &name.name_suffix),
                ];
                for (column, value) in columns {
                    if let Some(value) = value {
                        put_str(env, v, column, value)?;
                    }
                }
                Ok(())
            })?;
        }

        let org = &input.organization;
        if org.organization_name.is_some() || org.job_title.is_some() {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_ORGANIZATION, |env, v| {
                if let Some(company) = &org.organization_name {
                    put_str(env, v, "data1", company)?;
                }
                if let Some(title) = &org.job_title {
                    put_str(env, v, "data4", title)?;
                }
                Ok(())
            })?;
        }

        if let Some(note) = &input.note {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_NOTE, |env, v| {
                put_str(env, v, "data1", note)
            })?;
        }

        if let Some(birthday) = input.birthday {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_EVENT, |env, v| {
                put_str(env, v, "data1", &birthday.to_string())?;
                put_str(env, v, "data2", EVENT_TYPE_BIRTHDAY)
            })?;
        }

        for phone in &input.phones {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_PHONE, |env, v| {
                put_str(env, v, "data1", &phone.value)?;
                labeled_type(env, v, phone, PHONE_TYPE_OTHER)
            })?;
        }
        for email in &input.emails {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_EMAIL, |env, v| {
                put_str(env, v, "data1", &email.value)?;
                labeled_type(env, v, email, EMAIL_TYPE_OTHER)
            })?;
        }
        for url in &input.urls {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_WEBSITE, |env, v| {
                put_str(env, v, "data1", &url.value)
            })?;
        }
        for address in &input.postal_addresses {
            Self::insert_data(&mut env, &resolver, raw_id, MIME_POSTAL, |env, v| {
                put_str(env, v, "data1", &address.value)?;
                labeled_type(env, v, address, EMAIL_TYPE_OTHER)
            })?;
        }

        // -- Aggregate contact id -------------------------------------------
        let raw_id_str = raw_id.to_string();
        let cursor = query(
            &mut env,
            &resolver,
            RAW_CONTACTS_URI,
            &["contact_id"],
            Some("_id = ?"),
            &[raw_id_str.as_str()],
            None,
        )?;
        let contact_id = read_rows(&mut env, cursor, 1)?
            .into_iter()
            .next()
            .and_then(|mut row| row.pop().flatten())
            .ok_or_else(|| {
                ContactsError::StoreFailure(format!("raw contact {raw_id} has no aggregate"))
            })?;

        tracing::info!(%contact_id, raw_id, "Android: contact created");
        Ok(ContactId::new(contact_id))
    }

    fn delete_contact(&self, id: &ContactId) -> Result<bool> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;

        let uri = parse_uri(&mut env, RAW_CONTACTS_URI)?;
        let selection = jstring(&mut env, "contact_id = ?")?;
        let args = string_array(&mut env, &[id.as_str()])?;
        let deleted = env
            .call_method(
                &resolver,
                "delete",
                "(Landroid/net/Uri;Ljava/lang/String;[Ljava/lang/String;)I",
                &[
                    JValue::Object(&uri),
                    JValue::Object(&selection),
                    JValue::Object(&args),
                ],
            )
            .and_then(|v| v.i())
            .map_err(|e| jni_err("ContentResolver.delete", e))?;

        tracing::info!(%id, deleted, "Android: delete contact");
        Ok(deleted > 0)
    }
}

/// Store a custom label as `TYPE_CUSTOM` + label, otherwise the kind's
/// "other" type.
fn labeled_type(env: &mut JNIEnv, values: &JObject, entry: &LabeledValue, other: i32) -> Result<()> {
    match &entry.label {
        Some(label) => {
            put_int(env, values, "data2", TYPE_CUSTOM)?;
            put_str(env, values, "data3", label)
        }
        None => put_int(env, values, "data2", other),
    }
}

impl NativeContactPicker for AndroidBridge {
    /// Launch `ACTION_PICK` on the contacts URI. The selection is reported
    /// by the host Activity through `onContactsPicked` as contact ids.
    fn present_picker(
        &self,
        session: PickerSessionId,
        options: &PickerOptions,
        listener: Arc<dyn PickerListener>,
    ) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        tracing::info!(%session, "Android: launching contact picker");

        let action = jstring(&mut env, "android.intent.action.PICK")?;
        let uri = parse_uri(&mut env, CONTACTS_URI)?;
        let intent = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;Landroid/net/Uri;)V",
                &[JValue::Object(&action), JValue::Object(&uri)],
            )
            .map_err(|e| jni_err("new Intent", e))?;

        let title_key = jstring(&mut env, "android.intent.extra.TITLE")?;
        let title = jstring(&mut env, &options.title)?;
        env.call_method(
            &intent,
            "putExtra",
            "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&title_key), JValue::Object(&title)],
        )
        .map_err(|e| jni_err("Intent.putExtra(TITLE)", e))?;

        if options.selection_mode == SelectionMode::Multiple {
            let key = jstring(&mut env, "android.intent.extra.ALLOW_MULTIPLE")?;
            env.call_method(
                &intent,
                "putExtra",
                "(Ljava/lang/String;Z)Landroid/content/Intent;",
                &[JValue::Object(&key), JValue::Bool(1)],
            )
            .map_err(|e| jni_err("Intent.putExtra(ALLOW_MULTIPLE)", e))?;
        }

        let request_code = PENDING_PICKERS.register(session, listener);

        let launched = env
            .call_method(
                &activity,
                "startActivityForResult",
                "(Landroid/content/Intent;I)V",
                &[JValue::Object(&intent), JValue::Int(request_code)],
            )
            .map_err(|e| jni_err("startActivityForResult", e));

        if let Err(e) = launched {
            PENDING_PICKERS.take(request_code);
            return Err(e);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host Activity callbacks
// ---------------------------------------------------------------------------

/// `MultiContactBridge.onPermissionResult()`: the permission dialog closed.
#[unsafe(no_mangle)]
pub extern "system" fn Java_org_hyperpolymath_multicontact_MultiContactBridge_onPermissionResult(
    _env: JNIEnv,
    _class: JClass,
) {
    let waiters: Vec<Completion<()>> = locked(&PENDING_PERMISSION).drain(..).collect();
    tracing::debug!(waiters = waiters.len(), "Android: permission result");
    for done in waiters {
        done.complete(Ok(()));
    }
}

/// `MultiContactBridge.onContactsPicked(requestCode, contactIds)`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_org_hyperpolymath_multicontact_MultiContactBridge_onContactsPicked(
    mut env: JNIEnv,
    _class: JClass,
    request_code: jint,
    contact_ids: JObjectArray,
) {
    let ids = (|| -> Result<Vec<ContactId>> {
        let len = env
            .get_array_length(&contact_ids)
            .map_err(|e| jni_err("get_array_length", e))?;
        let mut ids = Vec::with_capacity(len as usize);
        for i in 0..len {
            let element = env
                .get_object_array_element(&contact_ids, i)
                .map_err(|e| jni_err("get_object_array_element", e))?;
            if let Some(id) = opt_string(&mut env, element)? {
                ids.push(ContactId::new(id));
            }
        }
        Ok(ids)
    })();

    let event = match ids {
        Ok(ids) => PickerEvent::SelectedIds(ids),
        Err(e) => PickerEvent::Failed(e.to_string()),
    };
    deliver_picker_event(request_code, event);
}

/// `MultiContactBridge.onPickerCancelled(requestCode)`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_org_hyperpolymath_multicontact_MultiContactBridge_onPickerCancelled(
    _env: JNIEnv,
    _class: JClass,
    request_code: jint,
) {
    deliver_picker_event(request_code, PickerEvent::Cancelled);
}

/// `MultiContactBridge.onPickerFailed(requestCode, reason)`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_org_hyperpolymath_multicontact_MultiContactBridge_onPickerFailed(
    mut env: JNIEnv,
    _class: JClass,
    request_code: jint,
    reason: JString,
) {
    let reason = opt_string(&mut env, JObject::from(reason))
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown picker failure".into());
    deliver_picker_event(request_code, PickerEvent::Failed(reason));
}
