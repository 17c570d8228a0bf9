// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MultiContact — Native platform bridge abstractions.
//
// Defines the contacts capability traits and the platform dispatch that
// picks an implementation at start-up: Contacts.framework on iOS,
// ContactsContract over JNI on Android, and an unimplemented stub anywhere
// else. The in-memory bridge is available on every target for tests and
// desktop development.

use std::sync::Arc;

pub mod memory;
pub mod pending;
pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod stub;

pub use memory::{MemoryBridge, PickerScript};
pub use pending::PendingPickers;
pub use traits::*;

/// Retrieves the bridge implementation for the target operating system.
///
/// Returned as a shared trait object so the plugin and the native callback
/// paths can hold it at the same time.
pub fn platform_bridge() -> Arc<dyn PlatformBridge> {
    #[cfg(target_os = "ios")]
    {
        Arc::new(ios::IosBridge::new())
    }
    #[cfg(target_os = "android")]
    {
        Arc::new(android::AndroidBridge::new())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        Arc::new(stub::StubBridge)
    }
}

#[cfg(all(test, not(any(target_os = "ios", target_os = "android"))))]
mod tests {
    use super::*;

    #[test]
    fn desktop_gets_the_stub() {
        let bridge = platform_bridge();
        assert_eq!(bridge.platform_name(), "desktop");
        assert!(!bridge.supports_contacts());
    }
}
