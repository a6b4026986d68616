// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use strum_macros::Display;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::account::{Account, AccountProperty};
use crate::event::Signal;
use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    fn rank(&self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Disconnecting => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    pub connection: Connection,
    pub old_state: ConnectionState,
    pub new_state: ConnectionState,
    pub error: Option<Error>,
}

/// An account's network session.
///
/// Owned by exactly one [`Account`]; holds a weak back-reference. The state
/// moves one way along `Disconnected → Connecting → Connected →
/// Disconnecting → Disconnected`; any transition into `Disconnected` may
/// carry an error. The cancellation token is triggered on disconnect and
/// must be observed by every protocol operation on this session.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    account: Weak<crate::account::AccountInner>,
    state: RwLock<ConnectionState>,
    error: RwLock<Option<Error>>,
    cancel: CancellationToken,
    changed: Signal<ConnectionEvent>,
}

impl Connection {
    pub(crate) fn new(account: &Account) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                account: account.downgrade(),
                state: RwLock::new(ConnectionState::Disconnected),
                error: RwLock::new(None),
                cancel: CancellationToken::new(),
                changed: Signal::new(),
            }),
        }
    }

    pub fn account(&self) -> Option<Account> {
        self.inner.account.upgrade().map(Account::from_inner)
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    pub fn error(&self) -> Option<Error> {
        self.inner.error.read().clone()
    }

    /// The token cancelled when this session disconnects. Protocol
    /// operations tied to the session must observe it.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn changed(&self) -> &Signal<ConnectionEvent> {
        &self.inner.changed
    }

    pub fn set_state(&self, state: ConnectionState) -> bool {
        self.set_state_with_error(state, None)
    }

    /// Advances the connection state. Backward transitions are refused with
    /// a warning; an error may only accompany a transition into
    /// `Disconnected`.
    pub fn set_state_with_error(&self, new_state: ConnectionState, error: Option<Error>) -> bool {
        let old_state = {
            let mut state = self.inner.state.write();
            let old_state = *state;

            let forward = new_state.rank() > old_state.rank();
            let wraps = new_state == ConnectionState::Disconnected
                && old_state != ConnectionState::Disconnected;
            if !forward && !wraps {
                drop(state);
                warn!(%old_state, %new_state, "refusing backward connection state transition");
                return false;
            }

            if error.is_some() && new_state != ConnectionState::Disconnected {
                drop(state);
                warn!(%new_state, "connection errors may only accompany a disconnect");
                return false;
            }

            *state = new_state;
            *self.inner.error.write() = error.clone();
            old_state
        };

        self.inner.changed.emit(&ConnectionEvent {
            connection: self.clone(),
            old_state,
            new_state,
            error: error.clone(),
        });

        if let Some(account) = self.account() {
            account.notify(AccountProperty::Connection);

            if new_state == ConnectionState::Disconnected {
                if let Some(error) = error {
                    if let Some(manager) = account.manager() {
                        manager.handle_connection_error(&account, &error);
                    }
                }
            }
        }

        true
    }

    /// Starts disconnecting and cancels all in-flight work bound to this
    /// session. Idempotent.
    pub fn disconnect(&self) {
        let state = self.state();
        if state == ConnectionState::Disconnected || state == ConnectionState::Disconnecting {
            self.inner.cancel.cancel();
            return;
        }
        self.set_state(ConnectionState::Disconnecting);
        self.inner.cancel.cancel();
    }

    pub fn ptr_eq(&self, other: &Connection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .finish()
    }
}
