// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::warn;

use crate::event::Signal;
use crate::protocol::Protocol;

#[derive(Debug, Clone)]
pub enum ProtocolManagerEvent {
    Registered { id: String },
    Unregistered { id: String },
}

/// The registry of protocol plugins, keyed by protocol id.
#[derive(Clone, Default)]
pub struct ProtocolManager {
    inner: Arc<ProtocolManagerInner>,
}

#[derive(Default)]
struct ProtocolManagerInner {
    protocols: RwLock<IndexMap<String, Arc<dyn Protocol>>>,
    events: Signal<ProtocolManagerEvent>,
}

impl ProtocolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Signal<ProtocolManagerEvent> {
        &self.inner.events
    }

    /// Registers a protocol. Id collisions are rejected.
    pub fn register(&self, protocol: Arc<dyn Protocol>) -> bool {
        let id = protocol.id().to_string();
        {
            let mut protocols = self.inner.protocols.write();
            if protocols.contains_key(&id) {
                warn!(id, "a protocol with this id is already registered");
                return false;
            }
            protocols.insert(id.clone(), protocol);
        }
        self.inner
            .events
            .emit(&ProtocolManagerEvent::Registered { id });
        true
    }

    pub fn unregister(&self, id: &str) -> bool {
        if self.inner.protocols.write().shift_remove(id).is_none() {
            return false;
        }
        self.inner.events.emit(&ProtocolManagerEvent::Unregistered {
            id: id.to_string(),
        });
        true
    }

    pub fn find_by_id(&self, id: &str) -> Option<Arc<dyn Protocol>> {
        self.inner.protocols.read().get(id).cloned()
    }

    pub fn protocols(&self) -> Vec<Arc<dyn Protocol>> {
        self.inner.protocols.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.protocols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.protocols.read().is_empty()
    }
}

impl Debug for ProtocolManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolManager")
            .field("protocols", &self.len())
            .finish()
    }
}
