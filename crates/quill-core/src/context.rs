// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::warn;

use crate::account::AccountManager;
use crate::contact::ContactManager;
use crate::conversation::ConversationManager;
use crate::credential::CredentialManager;
use crate::notification::NotificationManager;
use crate::protocol::ProtocolManager;
use crate::transfer::FileTransferManager;

static DEFAULT_CORE: Lazy<RwLock<Option<Core>>> = Lazy::new(|| RwLock::new(None));

/// The context object tying the default managers together.
///
/// `Core::init()` wires a fresh set of managers and installs them as the
/// process-wide default until `Core::shutdown()`. Hosts that want several
/// isolated runtimes can also construct cores with `Core::new()` and skip
/// the default slot entirely.
#[derive(Clone)]
pub struct Core {
    inner: Arc<CoreInner>,
}

struct CoreInner {
    protocols: ProtocolManager,
    credentials: CredentialManager,
    notifications: NotificationManager,
    accounts: AccountManager,
    contacts: ContactManager,
    conversations: ConversationManager,
    transfers: FileTransferManager,
}

impl Core {
    pub fn new() -> Self {
        let protocols = ProtocolManager::new();
        let credentials = CredentialManager::new();
        let notifications = NotificationManager::new();
        let accounts = AccountManager::new(
            protocols.clone(),
            credentials.clone(),
            notifications.clone(),
        );

        Self {
            inner: Arc::new(CoreInner {
                protocols,
                credentials,
                notifications,
                accounts,
                contacts: ContactManager::new(),
                conversations: ConversationManager::new(),
                transfers: FileTransferManager::new(),
            }),
        }
    }

    /// Installs a fresh core as the process-wide default and returns it.
    /// Calling this while a default exists is a programmer error; the
    /// existing core is returned unchanged.
    pub fn init() -> Self {
        let mut slot = DEFAULT_CORE.write();
        if let Some(existing) = slot.as_ref() {
            warn!("the default core was already initialised");
            return existing.clone();
        }
        let core = Self::new();
        *slot = Some(core.clone());
        core
    }

    /// The process-wide default core, if one was initialised.
    pub fn get() -> Option<Self> {
        DEFAULT_CORE.read().clone()
    }

    /// Tears down the process-wide default. Existing handles keep their
    /// managers alive until dropped.
    pub fn shutdown() {
        DEFAULT_CORE.write().take();
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

    pub fn accounts(&self) -> &AccountManager {
        &self.inner.accounts
    }

    pub fn contacts(&self) -> &ContactManager {
        &self.inner.contacts
    }

    pub fn conversations(&self) -> &ConversationManager {
        &self.inner.conversations
    }

    pub fn transfers(&self) -> &FileTransferManager {
        &self.inner.transfers
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Core {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core").finish()
    }
}
