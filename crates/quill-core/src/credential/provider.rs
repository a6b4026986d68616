// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use crate::account::Account;
use crate::{Error, Result};

/// A pluggable secret store.
///
/// Providers are registered with the
/// [`CredentialManager`](crate::credential::CredentialManager); exactly one
/// may be active at a time. All operations are keyed by account and must
/// observe the cancellation token.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    async fn read_password(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<Option<SecretString>>;

    async fn write_password(
        &self,
        account: &Account,
        password: SecretString,
        cancel: &CancellationToken,
    ) -> Result<()>;

    async fn clear_password(&self, account: &Account, cancel: &CancellationToken) -> Result<()>;
}

/// A credential provider that keeps secrets in process memory. Useful for
/// hosts without a system keyring and for tests.
#[derive(Default)]
pub struct InMemoryCredentialProvider {
    passwords: Mutex<HashMap<String, SecretString>>,
}

impl InMemoryCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialProvider {
    fn id(&self) -> &str {
        "memory"
    }

    fn name(&self) -> &str {
        "In-memory credential store"
    }

    async fn read_password(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> Result<Option<SecretString>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(self
            .passwords
            .lock()
            .get(account.id())
            .map(|password| SecretString::new(password.expose_secret().clone())))
    }

    async fn write_password(
        &self,
        account: &Account,
        password: SecretString,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.passwords
            .lock()
            .insert(account.id().to_string(), password);
        Ok(())
    }

    async fn clear_password(&self, account: &Account, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.passwords.lock().remove(account.id());
        Ok(())
    }
}
