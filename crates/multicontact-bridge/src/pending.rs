// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request-code registry for pickers launched through an activity result.
//
// Android hands a picker result back with nothing but the request code it
// was launched with, so each presentation takes a code from a small ring and
// the listener is parked under it until the host activity calls back.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use multicontact_core::PickerSessionId;

use crate::traits::{PickerEvent, PickerListener};

/// Number of request codes in the ring.
pub const PICKER_SLOTS: i32 = 256;

struct Parked {
    request_code: i32,
    session: PickerSessionId,
    listener: Arc<dyn PickerListener>,
}

/// Listeners waiting for a picker result, keyed by request code.
pub struct PendingPickers {
    base: i32,
    next_slot: AtomicI32,
    parked: Mutex<Vec<Parked>>,
}

impl PendingPickers {
    /// Codes run from `base` to `base + PICKER_SLOTS - 1`.
    pub const fn new(base: i32) -> Self {
        Self {
            base,
            next_slot: AtomicI32::new(0),
            parked: Mutex::new(Vec::new()),
        }
    }

    fn parked(&self) -> MutexGuard<'_, Vec<Parked>> {
        self.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park `listener` under the next request code and return the code.
    ///
    /// A session still parked under a reused code never got its result; it
    /// is evicted and told the picker failed.
    pub fn register(&self, session: PickerSessionId, listener: Arc<dyn PickerListener>) -> i32 {
        let slot = self
            .next_slot
            .fetch_add(1, Ordering::Relaxed)
            .rem_euclid(PICKER_SLOTS);
        let request_code = self.base + slot;

        let mut evicted = Vec::new();
        {
            let mut parked = self.parked();
            parked.retain(|p| {
                if p.request_code == request_code {
                    evicted.push((p.session, Arc::clone(&p.listener)));
                    false
                } else {
                    true
                }
            });
            parked.push(Parked {
                request_code,
                session,
                listener,
            });
        }

        for (stale, listener) in evicted {
            tracing::warn!(
                session = %stale,
                request_code,
                "picker request code reused, evicting stale session"
            );
            listener.on_picker_event(
                stale,
                PickerEvent::Failed("picker result never arrived".into()),
            );
        }
        request_code
    }

    /// Remove and return the listener parked under `request_code`.
    pub fn take(&self, request_code: i32) -> Option<(PickerSessionId, Arc<dyn PickerListener>)> {
        let mut parked = self.parked();
        let pos = parked.iter().position(|p| p.request_code == request_code)?;
        let p = parked.remove(pos);
        Some((p.session, p.listener))
    }

    /// Forward `event` to whoever is parked under `request_code`.
    pub fn deliver(&self, request_code: i32, event: PickerEvent) -> bool {
        match self.take(request_code) {
            Some((session, listener)) => {
                listener.on_picker_event(session, event);
                true
            }
            None => {
                tracing::warn!(request_code, "picker result for unknown request");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.parked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PickerSessionId, PickerEvent)>>);

    impl PickerListener for Recorder {
        fn on_picker_event(&self, session: PickerSessionId, event: PickerEvent) {
            self.0.lock().unwrap().push((session, event));
        }
    }

    #[test]
    fn codes_stay_in_range_and_wrap() {
        let pending = PendingPickers::new(0x4D00);
        let listener = Arc::new(Recorder::default());

        let first = pending.register(PickerSessionId::new(), listener.clone());
        assert_eq!(first, 0x4D00);
        for _ in 1..PICKER_SLOTS {
            let code = pending.register(PickerSessionId::new(), listener.clone());
            assert!((0x4D00..0x4D00 + PICKER_SLOTS).contains(&code));
        }
        let wrapped = pending.register(PickerSessionId::new(), listener);
        assert_eq!(wrapped, first);
    }

    #[test]
    fn reused_code_reaches_the_new_session() {
        let pending = PendingPickers::new(0);
        let abandoned = Arc::new(Recorder::default());
        let abandoned_session = PickerSessionId::new();
        let code = pending.register(abandoned_session, abandoned.clone());

        // The rest of the ring is answered normally.
        for _ in 1..PICKER_SLOTS {
            let c = pending.register(PickerSessionId::new(), Arc::new(Recorder::default()));
            assert!(pending.deliver(c, PickerEvent::Cancelled));
        }
        assert_eq!(pending.len(), 1);

        let current = Arc::new(Recorder::default());
        let current_session = PickerSessionId::new();
        assert_eq!(pending.register(current_session, current.clone()), code);
        assert_eq!(pending.len(), 1);
        assert_eq!(
            *abandoned.0.lock().unwrap(),
            vec![(
                abandoned_session,
                PickerEvent::Failed("picker result never arrived".into())
            )]
        );

        assert!(pending.deliver(code, PickerEvent::Cancelled));
        assert_eq!(
            *current.0.lock().unwrap(),
            vec![(current_session, PickerEvent::Cancelled)]
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn unknown_code_is_dropped() {
        let pending = PendingPickers::new(0);
        assert!(!pending.deliver(42, PickerEvent::Cancelled));
        assert!(pending.take(42).is_none());
    }
}
