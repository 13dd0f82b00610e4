use std::sync::Arc;

use anyhow::{Context, Result};
use crt_core::{CursorStyle, EventKind, Host, Subscription};
use log::debug;
use winit::window::{CursorIcon, Window};

/// Which event kinds currently have a listener.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    next_id: u64,
    active: Vec<Subscription>,
}

impl SubscriptionTable {
    pub fn add(&mut self, kind: EventKind) -> Subscription {
        self.next_id += 1;
        let subscription = Subscription {
            id: self.next_id,
            kind,
        };
        self.active.push(subscription);
        subscription
    }

    /// Returns `false` if the handle was not registered.
    pub fn remove(&mut self, subscription: Subscription) -> bool {
        let before = self.active.len();
        self.active.retain(|active| *active != subscription);
        self.active.len() != before
    }

    pub fn wants(&self, kind: EventKind) -> bool {
        self.active.iter().any(|active| active.kind == kind)
    }
}

/// Host capabilities backed by the winit window and the system URL opener.
pub struct WindowHost {
    window: Arc<Window>,
    subscriptions: SubscriptionTable,
    cursor: CursorStyle,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            subscriptions: SubscriptionTable::default(),
            cursor: CursorStyle::Default,
        }
    }

    pub fn wants(&self, kind: EventKind) -> bool {
        self.subscriptions.wants(kind)
    }
}

impl Host for WindowHost {
    fn subscribe(&mut self, kind: EventKind) -> Subscription {
        self.subscriptions.add(kind)
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        if !self.subscriptions.remove(subscription) {
            debug!("ignoring unknown subscription {:?}", subscription);
        }
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("launching browser for {url}"))
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        if cursor == self.cursor {
            return;
        }
        self.cursor = cursor;
        self.window.set_cursor_icon(match cursor {
            CursorStyle::Default => CursorIcon::Default,
            CursorStyle::Pointer => CursorIcon::Pointer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_tracks_kinds_until_removed() {
        let mut table = SubscriptionTable::default();
        let click = table.add(EventKind::Click);
        let resize = table.add(EventKind::Resize);
        assert_ne!(click.id, resize.id);
        assert!(table.wants(EventKind::Click));
        assert!(!table.wants(EventKind::PointerMove));

        assert!(table.remove(click));
        assert!(!table.remove(click));
        assert!(!table.wants(EventKind::Click));
        assert_eq!(table.active.len(), 1);
    }
}
