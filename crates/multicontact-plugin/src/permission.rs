// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Permission gate.
//
// Every store or picker operation runs through `with_permission`. When access
// is not granted yet the OS prompt is requested once, the status is read
// again after the user answers, and the operation either runs exactly once
// or the call fails as permission-denied.

use std::future::Future;
use std::sync::Arc;

use multicontact_bridge::{Completion, PlatformBridge};
use multicontact_core::error::{ContactsError, Result};
use multicontact_core::PermissionState;
use tracing::{debug, info};

pub struct PermissionGate {
    bridge: Arc<dyn PlatformBridge>,
}

impl PermissionGate {
    pub fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self { bridge }
    }

    /// Current authorisation without prompting.
    pub fn check(&self) -> Result<PermissionState> {
        self.bridge.authorization_status()
    }

    /// Issue the OS request and wait for the user's answer, then report the
    /// status the OS now holds.
    ///
    /// The OS decides whether a dialog is actually shown; an already
    /// answered permission completes immediately with its current state.
    pub async fn request(&self) -> Result<PermissionState> {
        let (done, answered) = Completion::channel();
        self.bridge.request_access(done)?;

        match answered.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ContactsError::Bridge(
                    "permission prompt closed without reporting".into(),
                ));
            }
        }

        let status = self.check()?;
        info!(%status, "contacts permission answered");
        Ok(status)
    }

    /// Run `op` once contacts access is granted.
    ///
    /// A non-granted status triggers exactly one request; `op` is not
    /// retried or re-queued if that request is declined.
    pub async fn with_permission<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let status = self.check()?;
        if !status.is_granted() {
            debug!(%status, "contacts access not granted, requesting");
            if !self.request().await?.is_granted() {
                return Err(ContactsError::PermissionDenied);
            }
        }
        op().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicontact_bridge::MemoryBridge;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gate(bridge: &Arc<MemoryBridge>) -> PermissionGate {
        PermissionGate::new(Arc::clone(bridge) as Arc<dyn PlatformBridge>)
    }

    #[tokio::test]
    async fn granted_runs_without_prompt() {
        let bridge = Arc::new(MemoryBridge::new());
        let value = gate(&bridge).with_permission(|| async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(bridge.permission_requests(), 0);
    }

    #[tokio::test]
    async fn prompt_then_grant_runs_once() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Prompt));
        let runs = AtomicUsize::new(0);
        let counter = &runs;

        gate(&bridge)
            .with_permission(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(bridge.permission_requests(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn declined_prompt_is_denied_and_op_never_runs() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Prompt));
        bridge.answer_prompt_with(PermissionState::Denied);
        let runs = AtomicUsize::new(0);
        let counter = &runs;

        let err = gate(&bridge)
            .with_permission(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ContactsError::PermissionDenied));
        assert_eq!(bridge.permission_requests(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn already_denied_asks_once_without_retry() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Denied));
        let gate = gate(&bridge);

        assert!(gate.with_permission(|| async { Ok(()) }).await.is_err());
        assert_eq!(bridge.permission_requests(), 1);
        assert_eq!(gate.check().unwrap(), PermissionState::Denied);
    }

    #[tokio::test]
    async fn request_reports_new_status() {
        let bridge = Arc::new(MemoryBridge::with_permission(PermissionState::Prompt));
        assert_eq!(gate(&bridge).request().await.unwrap(), PermissionState::Granted);
    }
}
