// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::account::Account;
use crate::connection::Connection;
use crate::contact::{Contact, ContactInfo};
use crate::conversation::{Conversation, Message};
use crate::request::RequestField;
use crate::transfer::FileTransfer;
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolOptions {
    /// The service has no password at all.
    pub no_password: bool,
    /// A password exists but connecting without one is valid.
    pub password_optional: bool,
    /// The service cannot carry inline images.
    pub no_images: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolAction {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: String,
}

/// The plugin contract for a chat service.
///
/// A protocol registers with the
/// [`ProtocolManager`](crate::protocol::ProtocolManager) and drives the
/// connections of accounts bound to it. Capability interfaces are optional;
/// the accessors return `None` for unsupported capabilities and the
/// [`capabilities`] dispatch layer turns that into
/// [`Error::NotImplemented`](crate::Error::NotImplemented).
#[async_trait]
pub trait Protocol: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn icon_name(&self) -> Option<&str> {
        None
    }

    fn options(&self) -> ProtocolOptions {
        ProtocolOptions::default()
    }

    /// Additional typed options shown on the new-account dialog. The core
    /// stores their values as opaque account settings.
    fn account_options(&self) -> Vec<RequestField> {
        Vec::new()
    }

    /// Drives the connection to `Connected`, or to `Disconnected` with an
    /// error. The connection's cancellation token must be observed by all
    /// session work.
    async fn connect(&self, account: &Account, connection: &Connection) -> Result<()>;

    /// Tears the session down. Called after the connection's token has been
    /// cancelled; must be idempotent.
    async fn disconnect(&self, account: &Account, connection: &Connection) -> Result<()>;

    fn contacts(&self) -> Option<&dyn ProtocolContacts> {
        None
    }

    fn conversations(&self) -> Option<&dyn ProtocolConversations> {
        None
    }

    fn file_transfer(&self) -> Option<&dyn ProtocolFileTransfer> {
        None
    }

    fn roster(&self) -> Option<&dyn ProtocolRoster> {
        None
    }
}

#[async_trait]
pub trait ProtocolContacts: Send + Sync {
    /// The shortest query `search` accepts.
    fn minimum_search_length(&self) -> usize {
        3
    }

    async fn search(
        &self,
        account: &Account,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContactInfo>>;

    async fn profile(&self, info: &ContactInfo, cancel: &CancellationToken) -> Result<String>;

    fn actions(&self, _info: &ContactInfo) -> Vec<ProtocolAction> {
        Vec::new()
    }

    fn menu(&self, _info: &ContactInfo) -> Vec<MenuItem> {
        Vec::new()
    }
}

#[async_trait]
pub trait ProtocolConversations: Send + Sync {
    async fn send_message(
        &self,
        conversation: &Conversation,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<bool>;
}

#[async_trait]
pub trait ProtocolFileTransfer: Send + Sync {
    async fn send(&self, transfer: &FileTransfer, cancel: &CancellationToken) -> Result<bool>;

    async fn receive(&self, transfer: &FileTransfer, cancel: &CancellationToken) -> Result<bool>;
}

#[async_trait]
pub trait ProtocolRoster: Send + Sync {
    async fn add(
        &self,
        account: &Account,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<bool>;

    async fn update(
        &self,
        account: &Account,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<bool>;

    async fn remove(
        &self,
        account: &Account,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<bool>;
}

/// Dispatch helpers that surface [`Error::NotImplemented`] for protocols
/// lacking a capability, so call sites never have to probe the accessors
/// themselves.
///
/// [`Error::NotImplemented`]: crate::Error::NotImplemented
pub mod capabilities {
    use super::*;
    use crate::Error;

    pub async fn search_contacts(
        protocol: &dyn Protocol,
        account: &Account,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContactInfo>> {
        let Some(contacts) = protocol.contacts() else {
            return Err(Error::NotImplemented);
        };
        contacts.search(account, query, cancel).await
    }

    pub async fn contact_profile(
        protocol: &dyn Protocol,
        info: &ContactInfo,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let Some(contacts) = protocol.contacts() else {
            return Err(Error::NotImplemented);
        };
        contacts.profile(info, cancel).await
    }

    pub async fn send_message(
        protocol: &dyn Protocol,
        conversation: &Conversation,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(conversations) = protocol.conversations() else {
            return Err(Error::NotImplemented);
        };
        conversations.send_message(conversation, message, cancel).await
    }

    pub async fn send_file(
        protocol: &dyn Protocol,
        transfer: &FileTransfer,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(file_transfer) = protocol.file_transfer() else {
            return Err(Error::NotImplemented);
        };
        file_transfer.send(transfer, cancel).await
    }

    pub async fn receive_file(
        protocol: &dyn Protocol,
        transfer: &FileTransfer,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(file_transfer) = protocol.file_transfer() else {
            return Err(Error::NotImplemented);
        };
        file_transfer.receive(transfer, cancel).await
    }

    pub async fn roster_add(
        protocol: &dyn Protocol,
        account: &Account,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(roster) = protocol.roster() else {
            return Err(Error::NotImplemented);
        };
        roster.add(account, contact, cancel).await
    }

    pub async fn roster_update(
        protocol: &dyn Protocol,
        account: &Account,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(roster) = protocol.roster() else {
            return Err(Error::NotImplemented);
        };
        roster.update(account, contact, cancel).await
    }

    pub async fn roster_remove(
        protocol: &dyn Protocol,
        account: &Account,
        contact: &Contact,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(roster) = protocol.roster() else {
            return Err(Error::NotImplemented);
        };
        roster.remove(account, contact, cancel).await
    }
}
