// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error hooks notified of every failed delivery

use crate::error::DispatchError;
use crate::event::Event;
use crate::id::SubscriptionId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Handle for removing a registered error hook
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// A delivery that failed, as passed to error hooks
#[derive(Clone, Debug)]
pub struct DispatchFailure {
    pub subscription_id: SubscriptionId,
    pub event: Arc<Event>,
    pub error: DispatchError,
}

type ErrorHook = Arc<dyn Fn(&DispatchFailure) + Send + Sync>;

#[derive(Default)]
pub(super) struct ErrorHooks {
    next_id: AtomicU64,
    hooks: RwLock<Vec<(HookId, ErrorHook)>>,
}

impl ErrorHooks {
    pub(super) fn add(&self, hook: ErrorHook) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, hook));
        id
    }

    pub(super) fn remove(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Call every hook outside the lock so a hook may add or remove hooks
    pub(super) fn notify(&self, failure: &DispatchFailure) {
        let hooks: Vec<ErrorHook> = self
            .hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();

        for hook in hooks {
            hook(failure);
        }
    }
}
