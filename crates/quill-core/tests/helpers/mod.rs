// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use quill_core::account::Account;
use quill_core::connection::{Connection, ConnectionState};
use quill_core::contact::{Contact, ContactInfo};
use quill_core::conversation::{Conversation, Message};
use quill_core::event::Signal;
use quill_core::protocol::{Protocol, ProtocolContacts, ProtocolConversations};
use quill_core::{Error, Result};

pub const MOCK_PROTOCOL_ID: &str = "prpl-mock";

/// A protocol that connects instantly and records sent messages. Implements
/// the contacts and conversations capabilities; file transfer and roster
/// are deliberately absent.
#[derive(Default)]
pub struct MockProtocol {
    connect_error: Mutex<Option<Error>>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl MockProtocol {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_connect(&self, error: Error) {
        *self.connect_error.lock() = Some(error);
    }
}

#[async_trait]
impl Protocol for MockProtocol {
    fn id(&self) -> &str {
        MOCK_PROTOCOL_ID
    }

    fn name(&self) -> &str {
        "Mock"
    }

    async fn connect(&self, _account: &Account, connection: &Connection) -> Result<()> {
        if let Some(error) = self.connect_error.lock().take() {
            return Err(error);
        }
        connection.set_state(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self, _account: &Account, _connection: &Connection) -> Result<()> {
        Ok(())
    }

    fn contacts(&self) -> Option<&dyn ProtocolContacts> {
        Some(self)
    }

    fn conversations(&self) -> Option<&dyn ProtocolConversations> {
        Some(self)
    }
}

#[async_trait]
impl ProtocolContacts for MockProtocol {
    async fn search(
        &self,
        _account: &Account,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContactInfo>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if query.len() < self.minimum_search_length() {
            return Ok(Vec::new());
        }
        Ok(vec![ContactInfo::builder(query)
            .id(format!("id-{query}"))
            .build()])
    }

    async fn profile(&self, info: &ContactInfo, cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(format!("Profile of {}", info.username()))
    }
}

#[async_trait]
impl ProtocolConversations for MockProtocol {
    async fn send_message(
        &self,
        conversation: &Conversation,
        message: &Message,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.sent
            .lock()
            .push((conversation.global_id(), message.contents.clone()));
        Ok(true)
    }
}

/// A protocol with no optional capabilities at all.
pub struct BareProtocol;

#[async_trait]
impl Protocol for BareProtocol {
    fn id(&self) -> &str {
        "prpl-bare"
    }

    fn name(&self) -> &str {
        "Bare"
    }

    async fn connect(&self, _account: &Account, connection: &Connection) -> Result<()> {
        connection.set_state(ConnectionState::Connected);
        Ok(())
    }

    async fn disconnect(&self, _account: &Account, _connection: &Connection) -> Result<()> {
        Ok(())
    }
}

pub fn account(id: &str, username: &str) -> Account {
    Account::new(id, MOCK_PROTOCOL_ID, username).unwrap()
}

pub fn contact(account: &Account, id: &str, username: &str) -> Contact {
    Contact::with_id(account.clone(), id, username)
}

/// Connects to a signal and collects every emitted event into a shared
/// vector.
pub fn collect_events<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    signal.connect(move |event: &T| sink.lock().push(event.clone()));
    events
}

/// Polls `predicate` until it holds or the timeout elapses, yielding to the
/// runtime between attempts.
pub async fn wait_until(predicate: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !predicate() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition was not reached in time");
        }
        tokio::task::yield_now().await;
    }
}
