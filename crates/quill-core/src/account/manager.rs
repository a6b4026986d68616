// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::account::{Account, AccountProperty};
use crate::connection::{Connection, ConnectionState};
use crate::credential::CredentialManager;
use crate::event::{Signal, SignalHandlerId};
use crate::notification::{Notification, NotificationKind, NotificationManager};
use crate::protocol::ProtocolManager;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub enum AccountManagerEvent {
    Added {
        account: Account,
    },
    Removed {
        account: Account,
    },
    AccountChanged {
        account: Account,
        property: AccountProperty,
    },
}

/// The registry of accounts, keyed by account id.
///
/// The manager resolves each account's protocol when connecting, re-emits
/// account property notifications, and raises connection-error
/// notifications against the owning account.
#[derive(Clone)]
pub struct AccountManager {
    inner: Arc<AccountManagerInner>,
}

pub(crate) struct AccountManagerInner {
    protocols: ProtocolManager,
    credentials: CredentialManager,
    notifications: NotificationManager,
    state: RwLock<IndexMap<String, Registration>>,
    events: Signal<AccountManagerEvent>,
}

struct Registration {
    account: Account,
    handler: SignalHandlerId,
}

impl AccountManager {
    pub fn new(
        protocols: ProtocolManager,
        credentials: CredentialManager,
        notifications: NotificationManager,
    ) -> Self {
        Self {
            inner: Arc::new(AccountManagerInner {
                protocols,
                credentials,
                notifications,
                state: RwLock::new(IndexMap::new()),
                events: Signal::new(),
            }),
        }
    }

    pub fn events(&self) -> &Signal<AccountManagerEvent> {
        &self.inner.events
    }

    pub fn protocols(&self) -> &ProtocolManager {
        &self.inner.protocols
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.inner.credentials
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.inner.notifications
    }

    /// Registers an account. Fails if an account with the same id is
    /// already present.
    pub fn add(&self, account: &Account) -> bool {
        {
            let mut state = self.inner.state.write();
            if state.contains_key(account.id()) {
                warn!(id = %account.id(), "an account with this id is already registered");
                return false;
            }

            let handler = self.connect_account_signal(account);
            account.set_manager(Some(Arc::downgrade(&self.inner)));
            state.insert(
                account.id().to_string(),
                Registration {
                    account: account.clone(),
                    handler,
                },
            );
        }

        self.inner.events.emit(&AccountManagerEvent::Added {
            account: account.clone(),
        });
        true
    }

    /// Removes an account. Returns false (with no signals) if it was not
    /// registered.
    pub fn remove(&self, account: &Account) -> bool {
        let registration = {
            let mut state = self.inner.state.write();
            match state.get(account.id()) {
                Some(registration) if registration.account.ptr_eq(account) => {}
                _ => return false,
            }
            state.shift_remove(account.id()).expect("entry exists")
        };

        registration
            .account
            .changed()
            .disconnect(registration.handler);
        registration.account.set_manager(None);

        self.inner.events.emit(&AccountManagerEvent::Removed {
            account: registration.account,
        });
        true
    }

    pub fn find_by_id(&self, id: &str) -> Option<Account> {
        self.inner
            .state
            .read()
            .get(id)
            .map(|r| r.account.clone())
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.inner
            .state
            .read()
            .values()
            .map(|r| r.account.clone())
            .collect()
    }

    /// Accounts whose connection is currently in `Connected`.
    pub fn connected(&self) -> Vec<Account> {
        self.inner
            .state
            .read()
            .values()
            .filter(|r| {
                r.account
                    .connection()
                    .is_some_and(|c| c.state() == ConnectionState::Connected)
            })
            .map(|r| r.account.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.read().is_empty()
    }

    fn connect_account_signal(&self, account: &Account) -> SignalHandlerId {
        let manager = Arc::downgrade(&self.inner);
        account.changed().connect(move |event| {
            let Some(manager) = Weak::upgrade(&manager) else {
                return;
            };
            manager.events.emit(&AccountManagerEvent::AccountChanged {
                account: event.account.clone(),
                property: event.property,
            });
        })
    }
}

impl AccountManagerInner {
    pub(crate) async fn connect_account(self: &Arc<Self>, account: &Account) -> Result<Connection> {
        let Some(protocol) = self.protocols.find_by_id(account.protocol_id()) else {
            return Err(Error::InvalidSettings(format!(
                "no protocol registered with id {:?}",
                account.protocol_id()
            )));
        };

        if let Some(existing) = account.connection() {
            if existing.state() != ConnectionState::Disconnected {
                return Ok(existing);
            }
        }

        let connection = Connection::new(account);
        account.set_connection(Some(connection.clone()));
        connection.set_state(ConnectionState::Connecting);

        match protocol.connect(account, &connection).await {
            Ok(()) => {
                // Protocols may drive the state themselves.
                if connection.state() == ConnectionState::Connecting {
                    connection.set_state(ConnectionState::Connected);
                }
                Ok(connection)
            }
            Err(error) => {
                connection
                    .set_state_with_error(ConnectionState::Disconnected, Some(error.clone()));
                Err(error)
            }
        }
    }

    pub(crate) async fn disconnect_account(self: &Arc<Self>, account: &Account) -> Result<()> {
        let Some(connection) = account.connection() else {
            return Ok(());
        };
        if connection.state() == ConnectionState::Disconnected {
            return Ok(());
        }

        connection.disconnect();

        if let Some(protocol) = self.protocols.find_by_id(account.protocol_id()) {
            protocol.disconnect(account, &connection).await?;
        }

        connection.set_state(ConnectionState::Disconnected);
        Ok(())
    }

    /// Raises a connection-error notification against the account and, on
    /// authentication failures, clears the saved password unless the user
    /// asked to remember it.
    pub(crate) fn handle_connection_error(self: &Arc<Self>, account: &Account, error: &Error) {
        let notification = Notification::for_account(
            NotificationKind::ConnectionError,
            format!("{}: {}", account.username(), error),
            account.clone(),
        );
        self.notifications.add(&notification);

        if !matches!(error, Error::AuthenticationFailed(_)) || account.remember_password() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(account = %account.id(), "no tokio runtime, stored password was not cleared");
            return;
        };

        let credentials = self.credentials.clone();
        let account = account.clone();
        handle.spawn(async move {
            let cancel = CancellationToken::new();
            match credentials.clear_password(&account, &cancel).await {
                Ok(()) | Err(Error::NoActiveProvider) => (),
                Err(error) => {
                    warn!(account = %account.id(), %error, "failed to clear stored password");
                }
            }
        });
    }
}

impl Debug for AccountManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountManager")
            .field("accounts", &self.len())
            .finish()
    }
}
