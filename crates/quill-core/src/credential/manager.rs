// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::account::Account;
use crate::credential::CredentialProvider;
use crate::event::Signal;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub enum CredentialManagerEvent {
    ProviderRegistered { id: String },
    ProviderUnregistered { id: String },
    ActiveChanged { old: Option<String>, new: Option<String> },
}

/// Registry of credential providers with at most one active provider.
///
/// Password operations are delegated verbatim to the active provider and
/// fail with [`Error::NoActiveProvider`] when none is set.
#[derive(Clone, Default)]
pub struct CredentialManager {
    inner: Arc<CredentialManagerInner>,
}

#[derive(Default)]
struct CredentialManagerInner {
    state: RwLock<CredentialManagerState>,
    events: Signal<CredentialManagerEvent>,
}

#[derive(Default)]
struct CredentialManagerState {
    providers: IndexMap<String, Arc<dyn CredentialProvider>>,
    active: Option<String>,
}

impl CredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Signal<CredentialManagerEvent> {
        &self.inner.events
    }

    /// Registers a provider. Fails if another provider with the same id is
    /// already registered.
    pub fn register(&self, provider: Arc<dyn CredentialProvider>) -> bool {
        let id = provider.id().to_string();
        {
            let mut state = self.inner.state.write();
            if state.providers.contains_key(&id) {
                warn!(id, "a credential provider with this id is already registered");
                return false;
            }
            state.providers.insert(id.clone(), provider);
        }
        self.inner
            .events
            .emit(&CredentialManagerEvent::ProviderRegistered { id });
        true
    }

    /// Unregisters a provider. Fails while the provider is active.
    pub fn unregister(&self, provider: &Arc<dyn CredentialProvider>) -> bool {
        let id = provider.id().to_string();
        {
            let mut state = self.inner.state.write();
            if state.active.as_deref() == Some(id.as_str()) {
                warn!(id, "refusing to unregister the active credential provider");
                return false;
            }
            if state.providers.shift_remove(&id).is_none() {
                return false;
            }
        }
        self.inner
            .events
            .emit(&CredentialManagerEvent::ProviderUnregistered { id });
        true
    }

    /// Activates the provider with the given id, or unsets the active
    /// provider when `id` is `None`. Activating an unknown id fails.
    pub fn set_active(&self, id: Option<&str>) -> bool {
        let old = {
            let mut state = self.inner.state.write();
            if let Some(id) = id {
                if !state.providers.contains_key(id) {
                    warn!(id, "cannot activate unknown credential provider");
                    return false;
                }
            }
            let old = state.active.take();
            state.active = id.map(String::from);
            old
        };

        self.inner.events.emit(&CredentialManagerEvent::ActiveChanged {
            old,
            new: id.map(String::from),
        });
        true
    }

    pub fn active(&self) -> Option<Arc<dyn CredentialProvider>> {
        let state = self.inner.state.read();
        state
            .active
            .as_ref()
            .and_then(|id| state.providers.get(id))
            .cloned()
    }

    pub fn active_id(&self) -> Option<String> {
        self.inner.state.read().active.clone()
    }

    pub fn provider(&self, id: &str) -> Option<Arc<dyn CredentialProvider>> {
        self.inner.state.read().providers.get(id).cloned()
    }

    pub fn providers(&self) -> Vec<Arc<dyn CredentialProvider>> {
        self.inner.state.read().providers.values().cloned().collect()
    }

    pub async fn read_password(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<Option<SecretString>> {
        let Some(provider) = self.active() else {
            return Err(Error::NoActiveProvider);
        };
        provider.read_password(account, cancel).await
    }

    pub async fn write_password(
        &self,
        account: &Account,
        password: SecretString,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Some(provider) = self.active() else {
            return Err(Error::NoActiveProvider);
        };
        provider.write_password(account, password, cancel).await
    }

    pub async fn clear_password(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Some(provider) = self.active() else {
            return Err(Error::NoActiveProvider);
        };
        provider.clear_password(account, cancel).await
    }
}

impl Debug for CredentialManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("CredentialManager")
            .field("providers", &state.providers.len())
            .field("active", &state.active)
            .finish()
    }
}
