// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS platform bridge via objc2.
//
// Requires compilation with the iOS SDK (Xcode). Store access goes through
// `CNContactStore` (Contacts.framework); the picker is
// `CNContactPickerViewController` (ContactsUI.framework).
//
// This module is cfg-gated to `target_os = "ios"` and will not compile on
// other platforms. The picker is presented on the main queue whichever
// thread asks for it; presentation failures reach the listener as
// `PickerEvent::Failed`. Store reads and writes may run on any thread.
//
// Unsafe code here falls into two categories:
//
// 1. **Framework key constants** (`CNContactGivenNameKey`, ...): extern
//    statics exported by Contacts.framework, valid for the process lifetime.
//
// 2. **ObjC message sends and generated bindings**: the objc2 framework
//    crates mark most Contacts calls `unsafe`. Each call only reads keys
//    that were requested in the fetch, since reading an unfetched key
//    raises an Objective-C exception. ContactsUI has no objc2 binding for
//    iOS, so the picker is driven with raw `msg_send!`.

#![cfg(target_os = "ios")]

use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use block2::{RcBlock, StackBlock};
use objc2::rc::Retained;
use dispatch2::DispatchQueue;
use objc2::runtime::{AnyObject, Bool, NSObject, NSObjectProtocol, ProtocolObject};
use objc2::{DefinedClass, MainThreadMarker, MainThreadOnly, define_class, msg_send};
use objc2_contacts::{
    CNAuthorizationStatus, CNContact, CNContactBirthdayKey, CNContactEmailAddressesKey,
    CNContactFamilyNameKey, CNContactFetchRequest, CNContactGivenNameKey,
    CNContactIdentifierKey, CNContactJobTitleKey, CNContactMiddleNameKey,
    CNContactNamePrefixKey, CNContactNameSuffixKey, CNContactNoteKey,
    CNContactOrganizationNameKey, CNContactPhoneNumbersKey, CNContactPostalAddressesKey,
    CNContactStore, CNContactUrlAddressesKey, CNEntityType, CNKeyDescriptor, CNLabeledValue,
    CNMutableContact, CNMutablePostalAddress, CNPhoneNumber, CNPostalAddress,
    CNPostalAddressFormatter, CNPostalAddressFormatterStyle, CNSaveRequest,
};
use objc2_foundation::{NSArray, NSDateComponents, NSError, NSString};
use objc2_ui_kit::{UIApplication, UIViewController};

use multicontact_core::error::{ContactsError, Result};
use multicontact_core::{
    Birthday, Contact, ContactField, ContactId, ContactName, LabeledValue, NewContact,
    Organization, PermissionState, PickerOptions, PickerSessionId, Projection, SelectionMode,
};

use crate::traits::*;

/// `CNErrorCodeRecordDoesNotExist`.
const CN_ERROR_RECORD_DOES_NOT_EXIST: isize = 200;

/// `NSDateComponentUndefined`.
const DATE_COMPONENT_UNDEFINED: isize = isize::MAX;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

// ContactsUI.framework is only reached through the ObjC runtime; link it so
// `CNContactPickerViewController` is registered.
#[link(name = "ContactsUI", kind = "framework")]
unsafe extern "C" {}

/// Assert that we are on the main thread and return the marker.
fn require_main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new()
        .ok_or_else(|| ContactsError::Bridge("must be called from the main thread".into()))
}

/// Obtain the root `UIViewController` from the key window.
fn root_view_controller(mtm: MainThreadMarker) -> Result<Retained<UIViewController>> {
    let app = UIApplication::sharedApplication(mtm);

    // SAFETY: msg_send! to well-known UIApplication / UIWindow selectors.
    // The MainThreadMarker guarantees we are on the main thread.
    let root: Option<Retained<UIViewController>> = unsafe {
        let window: Option<Retained<AnyObject>> = msg_send![&app, keyWindow];
        window.and_then(|w| msg_send![&w, rootViewController])
    };

    root.ok_or_else(|| ContactsError::Bridge("no root view controller available".into()))
}

fn ns_error(context: &str, e: &NSError) -> ContactsError {
    ContactsError::StoreFailure(format!("{context}: {}", e.localizedDescription()))
}

fn non_empty(s: Retained<NSString>) -> Option<String> {
    let s = s.to_string();
    if s.is_empty() { None } else { Some(s) }
}

fn ns(s: &str) -> Retained<NSString> {
    NSString::from_str(s)
}

/// Contacts.framework keys needed to read `field`.
fn field_keys(field: ContactField) -> Vec<&'static NSString> {
    // SAFETY: framework-exported constant strings, valid for the process
    // lifetime.
    unsafe {
        match field {
            ContactField::ContactId => vec![CNContactIdentifierKey],
            ContactField::Name => vec![
                CNContactGivenNameKey,
                CNContactMiddleNameKey,
                CNContactFamilyNameKey,
                CNContactNamePrefixKey,
                CNContactNameSuffixKey,
            ],
            ContactField::Organization => {
                vec![CNContactOrganizationNameKey, CNContactJobTitleKey]
            }
            ContactField::Birthday => vec![CNContactBirthdayKey],
            ContactField::Note => vec![CNContactNoteKey],
            ContactField::Phones => vec![CNContactPhoneNumbersKey],
            ContactField::Emails => vec![CNContactEmailAddressesKey],
            ContactField::Urls => vec![CNContactUrlAddressesKey],
            ContactField::PostalAddresses => vec![CNContactPostalAddressesKey],
        }
    }
}

/// Key descriptors for a fetch honouring `projection`. The identifier is
/// always fetched.
fn keys_to_fetch(projection: &Projection) -> Retained<NSArray<ProtocolObject<dyn CNKeyDescriptor>>> {
    let mut keys = field_keys(ContactField::ContactId);
    for field in projection.fields() {
        if field != ContactField::ContactId {
            keys.extend(field_keys(field));
        }
    }
    let descriptors: Vec<&ProtocolObject<dyn CNKeyDescriptor>> =
        keys.into_iter().map(ProtocolObject::from_ref).collect();
    NSArray::from_slice(&descriptors)
}

fn labeled_strings(values: &NSArray<CNLabeledValue<NSString>>) -> Vec<LabeledValue> {
    values
        .iter()
        .map(|lv| {
            // SAFETY: generated accessors on an immutable CNLabeledValue.
            let (label, value) = unsafe { (lv.label(), lv.value()) };
            LabeledValue {
                label: label.map(|l| l.to_string()),
                value: value.to_string(),
            }
        })
        .collect()
}

/// Convert a fetched `CNContact`, reading only the keys `projection` asked for.
fn read_contact(contact: &CNContact, projection: &Projection) -> Contact {
    // SAFETY: every accessor below is guarded by the same projection that
    // built the fetch's key list, so no unfetched key is read.
    unsafe {
        let mut out = Contact {
            id: ContactId::new(contact.identifier().to_string()),
            ..Default::default()
        };

        if projection.includes(ContactField::Name) {
            out.name = ContactName {
                display_name: None,
                given_name: non_empty(contact.givenName()),
                middle_name: non_empty(contact.middleName()),
                family_name: non_empty(contact.familyName()),
                name_prefix: non_empty(contact.namePrefix()),
                name_suffix: non_empty(contact.nameSuffix()),
            };
        }
        if projection.includes(ContactField::Organization) {
            out.organization = Organization {
                organization_name: non_empty(contact.organizationName()),
                job_title: non_empty(contact.jobTitle()),
            };
        }
        if projection.includes(ContactField::Birthday) {
            out.birthday = contact.birthday().and_then(|c| birthday_from_components(&c));
        }
        if projection.includes(ContactField::Note) {
            out.note = non_empty(contact.note());
        }
        if projection.includes(ContactField::Phones) {
            out.phones = contact
                .phoneNumbers()
                .iter()
                .map(|lv| LabeledValue {
                    label: lv.label().map(|l| l.to_string()),
                    value: lv.value().stringValue().to_string(),
                })
                .collect();
        }
        if projection.includes(ContactField::Emails) {
            out.emails = labeled_strings(&contact.emailAddresses());
        }
        if projection.includes(ContactField::Urls) {
            out.urls = labeled_strings(&contact.urlAddresses());
        }
        if projection.includes(ContactField::PostalAddresses) {
            out.postal_addresses = contact
                .postalAddresses()
                .iter()
                .map(|lv| LabeledValue {
                    label: lv.label().map(|l| l.to_string()),
                    value: CNPostalAddressFormatter::stringFromPostalAddress_style(
                        &lv.value(),
                        CNPostalAddressFormatterStyle::MailingAddress,
                    )
                    .to_string(),
                })
                .collect();
        }
        out
    }
}

fn birthday_from_components(c: &NSDateComponents) -> Option<Birthday> {
    let year = c.year();
    let year = (year != DATE_COMPONENT_UNDEFINED).then(|| year as i32);
    Birthday::new(year, c.month() as u32, c.day() as u32)
}

fn labeled<T: objc2::Message>(
    label: Option<&str>,
    value: &T,
) -> Retained<CNLabeledValue<T>> {
    let label = label.map(ns);
    // SAFETY: class constructor with a retained value; label may be nil.
    unsafe { CNLabeledValue::labeledValueWithLabel_value(label.as_deref(), value) }
}

fn labeled_ns_strings(values: &[LabeledValue]) -> Retained<NSArray<CNLabeledValue<NSString>>> {
    let items: Vec<Retained<CNLabeledValue<NSString>>> = values
        .iter()
        .map(|v| labeled(v.label.as_deref(), &*ns(&v.value)))
        .collect();
    NSArray::from_retained_slice(&items)
}

/// Build a `CNMutableContact` from the create input.
fn mutable_contact(input: &NewContact) -> Retained<CNMutableContact> {
    // SAFETY: setters on a freshly created, unshared CNMutableContact.
    unsafe {
        let contact = CNMutableContact::new();
        let name = &input.name;
        if let Some(v) = &name.given_name {
            contact.setGivenName(&ns(v));
        }
        if let Some(v) = &name.middle_name {
            contact.setMiddleName(&ns(v));
        }
        if let Some(v) = &name.family_name {
            contact.setFamilyName(&ns(v));
        }
        if let Some(v) = &name.name_prefix {
            contact.setNamePrefix(&ns(v));
        }
        if let Some(v) = &name.name_suffix {
            contact.setNameSuffix(&ns(v));
        }
        if let Some(v) = &input.organization.organization_name {
            contact.setOrganizationName(&ns(v));
        }
        if let Some(v) = &input.organization.job_title {
            contact.setJobTitle(&ns(v));
        }
        if let Some(v) = &input.note {
            contact.setNote(&ns(v));
        }
        if let Some(b) = input.birthday {
            let comps = NSDateComponents::new();
            if let Some(year) = b.year {
                comps.setYear(year as isize);
            }
            comps.setMonth(b.month as isize);
            comps.setDay(b.day as isize);
            contact.setBirthday(Some(&comps));
        }

        let phones: Vec<Retained<CNLabeledValue<CNPhoneNumber>>> = input
            .phones
            .iter()
            .map(|p| {
                let number = CNPhoneNumber::phoneNumberWithStringValue(&ns(&p.value));
                labeled(p.label.as_deref(), &*number)
            })
            .collect();
        contact.setPhoneNumbers(&NSArray::from_retained_slice(&phones));
        contact.setEmailAddresses(&labeled_ns_strings(&input.emails));
        contact.setUrlAddresses(&labeled_ns_strings(&input.urls));

        // Postal addresses arrive pre-formatted; they are stored as the
        // street line so the value round-trips unchanged.
        let addresses: Vec<Retained<CNLabeledValue<CNPostalAddress>>> = input
            .postal_addresses
            .iter()
            .map(|a| {
                let address = CNMutablePostalAddress::new();
                address.setStreet(&ns(&a.value));
                let address: Retained<CNPostalAddress> = Retained::into_super(address);
                labeled(a.label.as_deref(), &*address)
            })
            .collect();
        contact.setPostalAddresses(&NSArray::from_retained_slice(&addresses));

        contact
    }
}

/// Load one contact with every key, as needed after a picker selection.
fn fetch_full(store: &CNContactStore, id: &NSString) -> Result<Option<Contact>> {
    let projection = Projection::all();
    let keys = keys_to_fetch(&projection);
    // SAFETY: documented CNContactStore lookup with a valid key list.
    match unsafe { store.unifiedContactWithIdentifier_keysToFetch_error(id, &keys) } {
        Ok(contact) => Ok(Some(read_contact(&contact, &projection))),
        Err(e) if e.code() == CN_ERROR_RECORD_DOES_NOT_EXIST => Ok(None),
        Err(e) => Err(ns_error("unifiedContactWithIdentifier", &e)),
    }
}

// ---------------------------------------------------------------------------
// Picker delegates (CNContactPickerDelegate, implemented informally)
// ---------------------------------------------------------------------------
// CNContactPickerViewController switches to multi-selection when its
// delegate implements `contactPicker:didSelectContacts:`, so single and
// multiple selection need two delegate classes.

struct PickerDelegateIvars {
    session: PickerSessionId,
    listener: Arc<dyn PickerListener>,
    /// Shared with `LIVE_DELEGATES`; set once the terminal event fired.
    finished: Rc<Cell<bool>>,
}

impl PickerDelegateIvars {
    fn deliver(&self, event: PickerEvent) {
        if self.finished.replace(true) {
            tracing::debug!(session = %self.session, "iOS: ignoring repeated picker event");
            return;
        }
        self.listener.on_picker_event(self.session, event);
    }

    fn deliver_selection(&self, contacts: &NSArray<CNContact>, single: bool) {
        // SAFETY: CNContactStore is thread-safe; identifiers are always
        // present on picker results.
        let store = unsafe { CNContactStore::new() };
        let mut picked = Vec::with_capacity(contacts.count());
        for contact in contacts.iter() {
            let id = unsafe { contact.identifier() };
            match fetch_full(&store, &id) {
                Ok(Some(c)) => picked.push(c),
                Ok(None) => tracing::warn!(id = %id, "iOS: picked contact vanished before fetch"),
                Err(e) => {
                    self.deliver(PickerEvent::Failed(e.to_string()));
                    return;
                }
            }
        }

        let event = match (single, picked.pop()) {
            (true, Some(contact)) => PickerEvent::SelectedOne(contact),
            (true, None) => PickerEvent::Failed("selected contact could not be loaded".into()),
            (false, last) => {
                picked.extend(last);
                PickerEvent::SelectedMany(picked)
            }
        };
        self.deliver(event);
    }
}

thread_local! {
    /// The picker holds its delegate weakly; delegates are kept alive here
    /// until their session finished and the next picker is presented.
    static LIVE_DELEGATES: RefCell<Vec<(Rc<Cell<bool>>, Retained<NSObject>)>> =
        const { RefCell::new(Vec::new()) };
}

define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "MultiContactSinglePickerDelegate"]
    #[ivars = PickerDelegateIvars]
    struct SinglePickerDelegate;

    unsafe impl NSObjectProtocol for SinglePickerDelegate {}

    impl SinglePickerDelegate {
        #[unsafe(method(contactPicker:didSelectContact:))]
        fn did_select_contact(&self, _picker: &AnyObject, contact: &CNContact) {
            let one = NSArray::from_slice(&[contact]);
            self.ivars().deliver_selection(&one, true);
        }

        #[unsafe(method(contactPickerDidCancel:))]
        fn did_cancel(&self, _picker: &AnyObject) {
            self.ivars().deliver(PickerEvent::Cancelled);
        }
    }
}

define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "MultiContactMultiPickerDelegate"]
    #[ivars = PickerDelegateIvars]
    struct MultiPickerDelegate;

    unsafe impl NSObjectProtocol for MultiPickerDelegate {}

    impl MultiPickerDelegate {
        #[unsafe(method(contactPicker:didSelectContacts:))]
        fn did_select_contacts(
            &self,
            _picker: &AnyObject,
            contacts: &NSArray<CNContact>,
        ) {
            self.ivars().deliver_selection(contacts, false);
        }

        #[unsafe(method(contactPickerDidCancel:))]
        fn did_cancel(&self, _picker: &AnyObject) {
            self.ivars().deliver(PickerEvent::Cancelled);
        }
    }
}

impl SinglePickerDelegate {
    fn new(mtm: MainThreadMarker, ivars: PickerDelegateIvars) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(ivars);
        // SAFETY: standard NSObject init via super.
        unsafe { msg_send![super(this), init] }
    }
}

impl MultiPickerDelegate {
    fn new(mtm: MainThreadMarker, ivars: PickerDelegateIvars) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(ivars);
        // SAFETY: standard NSObject init via super.
        unsafe { msg_send![super(this), init] }
    }
}

// ---------------------------------------------------------------------------
// IosBridge
// ---------------------------------------------------------------------------

/// Concrete iOS contacts bridge.
///
/// Holds no state; a `CNContactStore` is cheap and created per call, as
/// Apple recommends for short-lived access.
pub struct IosBridge;

impl IosBridge {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformBridge for IosBridge {
    fn platform_name(&self) -> &str {
        "iOS"
    }
}

impl NativeContactsPermission for IosBridge {
    fn authorization_status(&self) -> Result<PermissionState> {
        // SAFETY: class method, callable from any thread.
        let status =
            unsafe { CNContactStore::authorizationStatusForEntityType(CNEntityType::Contacts) };

        let state = if status == CNAuthorizationStatus::Authorized
            || status == CNAuthorizationStatus::Limited
        {
            PermissionState::Granted
        } else if status == CNAuthorizationStatus::Denied
            || status == CNAuthorizationStatus::Restricted
        {
            PermissionState::Denied
        } else {
            // notDetermined and any status added in future SDKs.
            PermissionState::Prompt
        };
        Ok(state)
    }

    fn request_access(&self, done: Completion<()>) -> Result<()> {
        tracing::info!("iOS: requesting contacts access");
        // The completion handler runs on an arbitrary queue.
        let slot = Mutex::new(Some(done));
        let handler = RcBlock::new(move |granted: Bool, _error: *mut NSError| {
            tracing::debug!(granted = granted.as_bool(), "iOS: contacts access answered");
            let done = slot.lock().ok().and_then(|mut s| s.take());
            if let Some(done) = done {
                done.complete(Ok(()));
            }
        });

        // SAFETY: documented CNContactStore API; the block is retained by
        // the framework until it fires.
        unsafe {
            CNContactStore::new()
                .requestAccessForEntityType_completionHandler(CNEntityType::Contacts, &handler);
        }
        Ok(())
    }
}

impl NativeContactStore for IosBridge {
    fn fetch_contact(&self, id: &ContactId, projection: &Projection) -> Result<Option<Contact>> {
        let store = unsafe { CNContactStore::new() };
        let keys = keys_to_fetch(projection);
        // SAFETY: documented lookup with a key list built from `projection`.
        match unsafe { store.unifiedContactWithIdentifier_keysToFetch_error(&ns(id.as_str()), &keys) }
        {
            Ok(contact) => Ok(Some(read_contact(&contact, projection))),
            Err(e) if e.code() == CN_ERROR_RECORD_DOES_NOT_EXIST => Ok(None),
            Err(e) => Err(ns_error("unifiedContactWithIdentifier", &e)),
        }
    }

    fn fetch_contacts(&self, projection: &Projection) -> Result<Vec<Contact>> {
        let store = unsafe { CNContactStore::new() };
        let keys = keys_to_fetch(projection);
        // SAFETY: designated initialiser with a valid key list.
        let request =
            unsafe { CNContactFetchRequest::initWithKeysToFetch(CNContactFetchRequest::alloc(), &keys) };

        let collected = RefCell::new(Vec::new());
        let visit = StackBlock::new(|contact: NonNull<CNContact>, _stop: NonNull<Bool>| {
            // SAFETY: the framework passes a valid contact for the duration
            // of the block invocation.
            let contact = unsafe { contact.as_ref() };
            collected.borrow_mut().push(read_contact(contact, projection));
        });

        // SAFETY: synchronous enumeration; `visit` outlives the call.
        unsafe { store.enumerateContactsWithFetchRequest_error_usingBlock(&request, &visit) }
            .map_err(|e| ns_error("enumerateContacts", &e))?;

        let contacts = collected.into_inner();
        tracing::debug!(count = contacts.len(), "iOS: enumerated contacts");
        Ok(contacts)
    }

    fn create_contact(&self, input: &NewContact) -> Result<ContactId> {
        let store = unsafe { CNContactStore::new() };
        let contact = mutable_contact(input);

        // SAFETY: save request built from an unshared mutable contact;
        // `None` targets the default container.
        unsafe {
            let request = CNSaveRequest::new();
            request.addContact_toContainerWithIdentifier(&contact, None);
            store
                .executeSaveRequest_error(&request)
                .map_err(|e| ns_error("executeSaveRequest(add)", &e))?;
        }

        let id = unsafe { contact.identifier() }.to_string();
        if id.is_empty() {
            return Err(ContactsError::StoreFailure("saved contact has no identifier".into()));
        }
        tracing::info!(%id, "iOS: contact created");
        Ok(ContactId::new(id))
    }

    fn delete_contact(&self, id: &ContactId) -> Result<bool> {
        let store = unsafe { CNContactStore::new() };
        let keys = keys_to_fetch(&Projection::of([ContactField::ContactId]));

        // SAFETY: lookup as in `fetch_contact`.
        let contact = match unsafe {
            store.unifiedContactWithIdentifier_keysToFetch_error(&ns(id.as_str()), &keys)
        } {
            Ok(contact) => contact,
            Err(e) if e.code() == CN_ERROR_RECORD_DOES_NOT_EXIST => return Ok(false),
            Err(e) => return Err(ns_error("unifiedContactWithIdentifier", &e)),
        };

        // SAFETY: `mutableCopy` on CNContact returns a +1 CNMutableContact.
        unsafe {
            let mutable: Retained<CNMutableContact> = msg_send![&contact, mutableCopy];
            let request = CNSaveRequest::new();
            request.deleteContact(&mutable);
            store
                .executeSaveRequest_error(&request)
                .map_err(|e| ns_error("executeSaveRequest(delete)", &e))?;
        }
        tracing::info!(%id, "iOS: contact deleted");
        Ok(true)
    }
}

impl NativeContactPicker for IosBridge {
    /// Queue `CNContactPickerViewController` for modal presentation on the
    /// root view controller. Returns once queued; the selection, or the
    /// reason presentation failed, arrives through the listener.
    fn present_picker(
        &self,
        session: PickerSessionId,
        options: &PickerOptions,
        listener: Arc<dyn PickerListener>,
    ) -> Result<()> {
        tracing::info!(%session, mode = ?options.selection_mode, "iOS: queueing contact picker");
        let options = options.clone();
        DispatchQueue::main().exec_async(move || {
            if let Err(e) = present_on_main(session, &options, Arc::clone(&listener)) {
                tracing::warn!(%session, error = %e, "iOS: picker presentation failed");
                listener.on_picker_event(session, PickerEvent::Failed(e.to_string()));
            }
        });
        Ok(())
    }
}

/// Build the picker and its delegate and present it. Runs on the main queue.
fn present_on_main(
    session: PickerSessionId,
    options: &PickerOptions,
    listener: Arc<dyn PickerListener>,
) -> Result<()> {
    let mtm = require_main_thread()?;
    let root = root_view_controller(mtm)?;

    // SAFETY: `new` on the ContactsUI picker class returns a +1
    // UIViewController subclass; nil means the framework is unavailable.
    let picker: Option<Retained<UIViewController>> =
        unsafe { msg_send![objc2::class!(CNContactPickerViewController), new] };
    let picker = picker
        .ok_or_else(|| ContactsError::Bridge("CNContactPickerViewController unavailable".into()))?;
    picker.setTitle(Some(&ns(&options.title)));

    let finished = Rc::new(Cell::new(false));
    let ivars = PickerDelegateIvars {
        session,
        listener,
        finished: Rc::clone(&finished),
    };
    let delegate: Retained<NSObject> = match options.selection_mode {
        SelectionMode::Single => Retained::into_super(SinglePickerDelegate::new(mtm, ivars)),
        SelectionMode::Multiple => Retained::into_super(MultiPickerDelegate::new(mtm, ivars)),
    };

    // SAFETY: `setDelegate:` takes an `id<CNContactPickerDelegate>`; both
    // delegate classes answer the protocol's selectors. The picker holds it
    // weakly, so it is kept in `LIVE_DELEGATES`.
    unsafe {
        let _: () = msg_send![&picker, setDelegate: &*delegate];
    }
    LIVE_DELEGATES.with(|live| {
        let mut live = live.borrow_mut();
        live.retain(|(done, _)| !done.get());
        live.push((finished, delegate));
    });

    root.presentViewController_animated_completion(&picker, true, None);
    Ok(())
}
