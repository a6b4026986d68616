// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::warn;

use crate::event::{Signal, SignalHandlerId};
use crate::transfer::{FileTransfer, TransferProperty};

#[derive(Debug, Clone)]
pub enum FileTransferManagerEvent {
    Added {
        transfer: FileTransfer,
    },
    Removed {
        transfer: FileTransfer,
    },
    TransferChanged {
        transfer: FileTransfer,
        property: TransferProperty,
    },
    /// List-model style update, emitted after `Added`/`Removed`.
    ItemsChanged {
        position: usize,
        removed: usize,
        added: usize,
    },
}

/// An observable, ordered list of file transfers.
#[derive(Clone, Default)]
pub struct FileTransferManager {
    inner: Arc<FileTransferManagerInner>,
}

#[derive(Default)]
struct FileTransferManagerInner {
    state: RwLock<Vec<Registration>>,
    events: Signal<FileTransferManagerEvent>,
}

struct Registration {
    transfer: FileTransfer,
    handler: SignalHandlerId,
}

impl FileTransferManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Signal<FileTransferManagerEvent> {
        &self.inner.events
    }

    /// Adds a transfer and starts re-emitting its property notifications.
    /// Double-adds are refused with a warning.
    pub fn add(&self, transfer: &FileTransfer) -> bool {
        let position = {
            let mut state = self.inner.state.write();
            if state.iter().any(|r| r.transfer.ptr_eq(transfer)) {
                warn!(filename = %transfer.filename(), "transfer was already added");
                return false;
            }

            let handler = self.connect_transfer(transfer);
            state.push(Registration {
                transfer: transfer.clone(),
                handler,
            });
            state.len() - 1
        };

        self.inner.events.emit(&FileTransferManagerEvent::Added {
            transfer: transfer.clone(),
        });
        self.inner.events.emit(&FileTransferManagerEvent::ItemsChanged {
            position,
            removed: 0,
            added: 1,
        });
        true
    }

    /// Removes a transfer. Returns false (with no signals) if it was not
    /// present.
    pub fn remove(&self, transfer: &FileTransfer) -> bool {
        let (registration, position) = {
            let mut state = self.inner.state.write();
            let Some(position) = state.iter().position(|r| r.transfer.ptr_eq(transfer)) else {
                return false;
            };
            (state.remove(position), position)
        };

        registration
            .transfer
            .changed()
            .disconnect(registration.handler);

        self.inner.events.emit(&FileTransferManagerEvent::Removed {
            transfer: registration.transfer,
        });
        self.inner.events.emit(&FileTransferManagerEvent::ItemsChanged {
            position,
            removed: 1,
            added: 0,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<FileTransfer> {
        self.inner
            .state
            .read()
            .get(index)
            .map(|r| r.transfer.clone())
    }

    pub fn transfers(&self) -> Vec<FileTransfer> {
        self.inner
            .state
            .read()
            .iter()
            .map(|r| r.transfer.clone())
            .collect()
    }

    fn connect_transfer(&self, transfer: &FileTransfer) -> SignalHandlerId {
        let manager = Arc::downgrade(&self.inner);
        transfer.changed().connect(move |event| {
            let Some(manager) = Weak::upgrade(&manager) else {
                return;
            };
            manager
                .events
                .emit(&FileTransferManagerEvent::TransferChanged {
                    transfer: event.transfer.clone(),
                    property: event.property,
                });
        })
    }
}

impl Debug for FileTransferManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTransferManager")
            .field("transfers", &self.len())
            .finish()
    }
}
