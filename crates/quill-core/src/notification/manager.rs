// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::account::Account;
use crate::event::Signal;
use crate::notification::Notification;

#[derive(Debug, Clone)]
pub enum NotificationManagerEvent {
    Added { notification: Notification },
    Removed { notification: Notification },
    Read { notification: Notification },
    Unread { notification: Notification },
    UnreadCountChanged { count: usize },
    /// List-model style update, emitted after `Added`/`Removed` so consumers
    /// that re-query see the mutated list.
    ItemsChanged { position: usize, removed: usize, added: usize },
}

/// An observable, ordered list of notifications.
#[derive(Clone, Default)]
pub struct NotificationManager {
    inner: Arc<NotificationManagerInner>,
}

#[derive(Default)]
pub(crate) struct NotificationManagerInner {
    items: RwLock<Vec<Notification>>,
    events: Signal<NotificationManagerEvent>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Signal<NotificationManagerEvent> {
        &self.inner.events
    }

    /// Adds a notification. Adding the same notification twice is a
    /// programmer error: logged and refused.
    pub fn add(&self, notification: &Notification) -> bool {
        let position = {
            let mut items = self.inner.items.write();
            if items.iter().any(|n| n.ptr_eq(notification)) {
                warn!(id = %notification.id(), "notification was already added");
                return false;
            }
            items.push(notification.clone());
            items.len() - 1
        };

        notification.set_manager(Some(Arc::downgrade(&self.inner)));

        self.inner.events.emit(&NotificationManagerEvent::Added {
            notification: notification.clone(),
        });
        self.inner.events.emit(&NotificationManagerEvent::ItemsChanged {
            position,
            removed: 0,
            added: 1,
        });
        self.emit_unread_count();
        true
    }

    /// Removes a notification. Returns false (with no signals) if it was
    /// not present.
    pub fn remove(&self, notification: &Notification) -> bool {
        let position = {
            let mut items = self.inner.items.write();
            let Some(position) = items.iter().position(|n| n.ptr_eq(notification)) else {
                return false;
            };
            items.remove(position);
            position
        };

        notification.set_manager(None);

        self.inner.events.emit(&NotificationManagerEvent::Removed {
            notification: notification.clone(),
        });
        self.inner.events.emit(&NotificationManagerEvent::ItemsChanged {
            position,
            removed: 1,
            added: 0,
        });
        self.emit_unread_count();
        true
    }

    pub fn clear(&self) {
        let items = std::mem::take(&mut *self.inner.items.write());
        for notification in items.iter().rev() {
            notification.set_manager(None);
            self.inner.events.emit(&NotificationManagerEvent::Removed {
                notification: notification.clone(),
            });
        }
        if !items.is_empty() {
            self.inner.events.emit(&NotificationManagerEvent::ItemsChanged {
                position: 0,
                removed: items.len(),
                added: 0,
            });
            self.emit_unread_count();
        }
    }

    /// Removes notifications belonging to `account`, iterating in reverse
    /// index order so removal positions stay stable. Unless
    /// `include_non_transient` is set, non-transient notifications (e.g.
    /// connection errors) are left in place. Returns the number removed.
    pub fn remove_with_account(&self, account: &Account, include_non_transient: bool) -> usize {
        let victims = {
            let items = self.inner.items.read();
            items
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, n)| {
                    n.account().map_or(false, |a| a.ptr_eq(account))
                        && (include_non_transient || n.transient())
                })
                .map(|(_, n)| n.clone())
                .collect::<Vec<_>>()
        };

        let mut removed = 0;
        for notification in victims {
            if self.remove(&notification) {
                removed += 1;
            }
        }
        removed
    }

    pub fn unread_count(&self) -> usize {
        self.inner
            .items
            .read()
            .iter()
            .filter(|n| !n.read())
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Notification> {
        self.inner.items.read().get(index).cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.items.read().clone()
    }

    fn emit_unread_count(&self) {
        self.inner
            .events
            .emit(&NotificationManagerEvent::UnreadCountChanged {
                count: self.unread_count(),
            });
    }
}

impl NotificationManagerInner {
    pub(crate) fn notification_read_changed(
        self: &Arc<Self>,
        notification: &Notification,
        read: bool,
    ) {
        let event = if read {
            NotificationManagerEvent::Read {
                notification: notification.clone(),
            }
        } else {
            NotificationManagerEvent::Unread {
                notification: notification.clone(),
            }
        };
        self.events.emit(&event);

        let count = self.items.read().iter().filter(|n| !n.read()).count();
        self.events
            .emit(&NotificationManagerEvent::UnreadCountChanged { count });
    }
}

impl Debug for NotificationManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationManager")
            .field("items", &self.len())
            .field("unread", &self.unread_count())
            .finish()
    }
}
