// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use tracing::warn;

use crate::account::manager::AccountManagerInner;
use crate::account::{AccountSettings, SettingValue};
use crate::connection::Connection;
use crate::contact::{ContactInfo, Presence};
use crate::event::Signal;
use crate::tags::Tags;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub presence: Presence,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountProperty {
    Username,
    Enabled,
    RememberPassword,
    Settings,
    Status,
    Tags,
    Connection,
}

#[derive(Debug, Clone)]
pub struct AccountEvent {
    pub account: Account,
    pub property: AccountProperty,
}

/// A user identity on a protocol.
///
/// Accounts are created standalone and become live once registered with an
/// [`AccountManager`](crate::account::AccountManager), which resolves the
/// protocol by id when connecting. Passwords are never stored on the
/// account; they go through the active credential provider.
#[derive(Clone)]
pub struct Account {
    inner: Arc<AccountInner>,
}

pub(crate) struct AccountInner {
    id: String,
    protocol_id: String,
    state: RwLock<AccountState>,
    connection: RwLock<Option<Connection>>,
    self_info: OnceLock<ContactInfo>,
    changed: Signal<AccountEvent>,
    pub(crate) manager: RwLock<Option<Weak<AccountManagerInner>>>,
}

struct AccountState {
    username: String,
    enabled: bool,
    remember_password: bool,
    settings: AccountSettings,
    status: Status,
    tags: Tags,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        protocol_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let protocol_id = protocol_id.into();
        let username = username.into();

        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidSettings(format!(
                "account id may not be empty or contain whitespace: {:?}",
                id
            )));
        }
        if username.is_empty() {
            return Err(Error::InvalidSettings(
                "account username may not be empty".to_string(),
            ));
        }
        if protocol_id.is_empty() {
            return Err(Error::InvalidSettings(
                "account protocol id may not be empty".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(AccountInner {
                id,
                protocol_id,
                state: RwLock::new(AccountState {
                    username,
                    enabled: false,
                    remember_password: false,
                    settings: AccountSettings::new(),
                    status: Status::default(),
                    tags: Tags::new(),
                }),
                connection: RwLock::new(None),
                self_info: OnceLock::new(),
                changed: Signal::new(),
                manager: RwLock::new(None),
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn protocol_id(&self) -> &str {
        &self.inner.protocol_id
    }

    pub fn username(&self) -> String {
        self.inner.state.read().username.clone()
    }

    pub fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        {
            let mut state = self.inner.state.write();
            if state.username == username {
                return;
            }
            state.username = username;
        }
        self.notify(AccountProperty::Username);
    }

    pub fn enabled(&self) -> bool {
        self.inner.state.read().enabled
    }

    /// Enables or disables the account.
    ///
    /// Enabling a registered account triggers `connect()` on the ambient
    /// tokio runtime; disabling triggers `disconnect()`. Without a runtime
    /// the flag still changes and connecting is left to the host.
    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut state = self.inner.state.write();
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }
        self.notify(AccountProperty::Enabled);

        if self.manager().is_none() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(
                account = %self.inner.id,
                "no tokio runtime, account will not be {} automatically",
                if enabled { "connected" } else { "disconnected" }
            );
            return;
        };

        let account = self.clone();
        handle.spawn(async move {
            let result = if enabled {
                account.connect().await.map(|_| ())
            } else {
                account.disconnect().await
            };
            if let Err(error) = result {
                warn!(account = %account.id(), %error, "automatic connection change failed");
            }
        });
    }

    pub fn remember_password(&self) -> bool {
        self.inner.state.read().remember_password
    }

    pub fn set_remember_password(&self, remember: bool) {
        {
            let mut state = self.inner.state.write();
            if state.remember_password == remember {
                return;
            }
            state.remember_password = remember;
        }
        self.notify(AccountProperty::RememberPassword);
    }

    pub fn status(&self) -> Status {
        self.inner.state.read().status.clone()
    }

    pub fn set_status(&self, status: Status) {
        {
            let mut state = self.inner.state.write();
            if state.status == status {
                return;
            }
            state.status = status;
        }
        self.notify(AccountProperty::Status);
    }

    pub fn settings(&self) -> AccountSettings {
        self.inner.state.read().settings.clone()
    }

    pub fn setting(&self, key: &str) -> Option<SettingValue> {
        self.inner.state.read().settings.get(key).cloned()
    }

    pub fn bool_setting(&self, key: &str) -> bool {
        self.inner.state.read().settings.bool(key)
    }

    pub fn int_setting(&self, key: &str) -> i64 {
        self.inner.state.read().settings.int(key)
    }

    pub fn string_setting(&self, key: &str) -> Option<String> {
        self.inner.state.read().settings.string(key).map(String::from)
    }

    pub fn set_setting(&self, key: impl Into<String>, value: SettingValue) {
        {
            let mut state = self.inner.state.write();
            state.settings.set(key, value);
        }
        self.notify(AccountProperty::Settings);
    }

    pub fn tags(&self) -> Tags {
        self.inner.state.read().tags.clone()
    }

    /// Mutates the tag set in place and notifies observers if it changed.
    pub fn update_tags(&self, update: impl FnOnce(&mut Tags)) {
        let changed = {
            let mut state = self.inner.state.write();
            let before = state.tags.clone();
            update(&mut state.tags);
            state.tags != before
        };
        if changed {
            self.notify(AccountProperty::Tags);
        }
    }

    /// The contact info representing this account's own user.
    pub fn self_info(&self) -> &ContactInfo {
        self.inner
            .self_info
            .get_or_init(|| ContactInfo::new(self.username()))
    }

    pub fn connection(&self) -> Option<Connection> {
        self.inner.connection.read().clone()
    }

    /// Connects the account through its protocol. Requires the account to
    /// be registered with an account manager holding the protocol.
    pub async fn connect(&self) -> Result<Connection> {
        let Some(manager) = self.manager() else {
            return Err(Error::InvalidSettings(format!(
                "account {} is not registered with an account manager",
                self.inner.id
            )));
        };
        manager.connect_account(self).await
    }

    /// Disconnects the account's connection, cancelling all in-flight work.
    /// Does nothing when there is no live connection.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(manager) = self.manager() else {
            if let Some(connection) = self.connection() {
                connection.disconnect();
            }
            return Ok(());
        };
        manager.disconnect_account(self).await
    }

    pub fn changed(&self) -> &Signal<AccountEvent> {
        &self.inner.changed
    }

    pub fn ptr_eq(&self, other: &Account) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_connection(&self, connection: Option<Connection>) {
        *self.inner.connection.write() = connection;
        self.notify(AccountProperty::Connection);
    }

    pub(crate) fn from_inner(inner: Arc<AccountInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<AccountInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn manager(&self) -> Option<Arc<AccountManagerInner>> {
        self.inner.manager.read().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_manager(&self, manager: Option<Weak<AccountManagerInner>>) {
        *self.inner.manager.write() = manager;
    }

    pub(crate) fn notify(&self, property: AccountProperty) {
        self.inner.changed.emit(&AccountEvent {
            account: self.clone(),
            property,
        });
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Account {}

impl Debug for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.inner.id)
            .field("protocol_id", &self.inner.protocol_id)
            .field("username", &self.inner.state.read().username)
            .finish()
    }
}
