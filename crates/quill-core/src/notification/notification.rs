// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use strum_macros::Display;
use uuid::Uuid;

use crate::account::Account;
use crate::event::Signal;
use crate::notification::manager::NotificationManagerInner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum NotificationKind {
    Generic,
    ConnectionError,
}

impl NotificationKind {
    /// Whether notifications of this kind are transient by default, i.e.
    /// swept by account-scoped removal.
    pub fn default_transient(&self) -> bool {
        match self {
            NotificationKind::Generic => true,
            NotificationKind::ConnectionError => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub notification: Notification,
    pub read: bool,
}

/// A user-visible informational event.
#[derive(Clone)]
pub struct Notification {
    inner: Arc<NotificationInner>,
}

struct NotificationInner {
    id: String,
    kind: NotificationKind,
    account: Option<Account>,
    created_at: DateTime<Utc>,
    transient: bool,
    state: RwLock<NotificationState>,
    changed: Signal<NotificationEvent>,
    pub(crate) manager: RwLock<Option<Weak<NotificationManagerInner>>>,
}

struct NotificationState {
    title: String,
    read: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self::build(kind, title, None, kind.default_transient())
    }

    pub fn for_account(
        kind: NotificationKind,
        title: impl Into<String>,
        account: Account,
    ) -> Self {
        Self::build(kind, title, Some(account), kind.default_transient())
    }

    pub fn with_transient(
        kind: NotificationKind,
        title: impl Into<String>,
        account: Option<Account>,
        transient: bool,
    ) -> Self {
        Self::build(kind, title, account, transient)
    }

    fn build(
        kind: NotificationKind,
        title: impl Into<String>,
        account: Option<Account>,
        transient: bool,
    ) -> Self {
        Self {
            inner: Arc::new(NotificationInner {
                id: Uuid::new_v4().to_string(),
                kind,
                account,
                created_at: Utc::now(),
                transient,
                state: RwLock::new(NotificationState {
                    title: title.into(),
                    read: false,
                }),
                changed: Signal::new(),
                manager: RwLock::new(None),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> NotificationKind {
        self.inner.kind
    }

    pub fn account(&self) -> Option<&Account> {
        self.inner.account.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn transient(&self) -> bool {
        self.inner.transient
    }

    pub fn title(&self) -> String {
        self.inner.state.read().title.clone()
    }

    pub fn read(&self) -> bool {
        self.inner.state.read().read
    }

    pub fn set_read(&self, read: bool) {
        {
            let mut state = self.inner.state.write();
            if state.read == read {
                return;
            }
            state.read = read;
        }

        self.inner.changed.emit(&NotificationEvent {
            notification: self.clone(),
            read,
        });

        let manager = self.inner.manager.read().as_ref().and_then(Weak::upgrade);
        if let Some(manager) = manager {
            manager.notification_read_changed(self, read);
        }
    }

    pub fn changed(&self) -> &Signal<NotificationEvent> {
        &self.inner.changed
    }

    pub fn ptr_eq(&self, other: &Notification) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_manager(&self, manager: Option<Weak<NotificationManagerInner>>) {
        *self.inner.manager.write() = manager;
    }
}

impl Debug for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("read", &self.read())
            .finish()
    }
}
