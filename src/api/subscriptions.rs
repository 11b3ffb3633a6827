use serde::{Deserialize, Serialize};

use super::{FetchRequest, LoadFailure};

/// Handle returned by every `on_*` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl SubscriptionId {
    /// Id under which cursor callbacks are registered with the broadcaster.
    #[must_use]
    pub fn consumer_key(self) -> String {
        format!("subscription:{}", self.0)
    }
}

type Handler<T> = Box<dyn FnMut(&T)>;

/// Typed handler lists for window commits and load failures.
#[derive(Default)]
pub(super) struct Subscriptions {
    next_id: u64,
    window_commit: Vec<(SubscriptionId, Handler<FetchRequest>)>,
    load_failed: Vec<(SubscriptionId, Handler<LoadFailure>)>,
}

impl Subscriptions {
    pub(super) fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub(super) fn add_window_commit(&mut self, id: SubscriptionId, handler: Handler<FetchRequest>) {
        self.window_commit.push((id, handler));
    }

    pub(super) fn add_load_failed(&mut self, id: SubscriptionId, handler: Handler<LoadFailure>) {
        self.load_failed.push((id, handler));
    }

    pub(super) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.window_commit.len() + self.load_failed.len();
        self.window_commit.retain(|(sub, _)| *sub != id);
        self.load_failed.retain(|(sub, _)| *sub != id);
        before != self.window_commit.len() + self.load_failed.len()
    }

    pub(super) fn notify_window_commit(&mut self, request: &FetchRequest) {
        for (_, handler) in &mut self.window_commit {
            handler(request);
        }
    }

    pub(super) fn notify_load_failed(&mut self, failure: &LoadFailure) {
        for (_, handler) in &mut self.load_failed {
            handler(failure);
        }
    }
}
