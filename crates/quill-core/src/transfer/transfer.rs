// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mime::Mime;
use parking_lot::RwLock;
use strum_macros::Display;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::account::Account;
use crate::contact::ContactInfo;
use crate::event::Signal;
use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TransferState {
    #[default]
    Unknown,
    Negotiating,
    Started,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferProperty {
    State,
    Error,
    BytesTransferred,
    Message,
}

#[derive(Debug, Clone)]
pub struct FileTransferEvent {
    pub transfer: FileTransfer,
    pub property: TransferProperty,
}

/// An in-flight file transfer.
///
/// The manager and the driving protocol share ownership through the handle.
/// The transfer's cancellation token is the single cancellation point; the
/// protocol must observe it, and cancelling moves the transfer to `Failed`
/// with [`Error::Cancelled`].
#[derive(Clone)]
pub struct FileTransfer {
    inner: Arc<FileTransferInner>,
}

struct FileTransferInner {
    account: Account,
    remote: ContactInfo,
    initiator: ContactInfo,
    filename: String,
    file_size: u64,
    content_type: Option<Mime>,
    local_path: Option<PathBuf>,
    cancel: CancellationToken,
    state: RwLock<TransferMutableState>,
    changed: Signal<FileTransferEvent>,
}

#[derive(Default)]
struct TransferMutableState {
    state: TransferState,
    error: Option<Error>,
    bytes_transferred: u64,
    message: Option<String>,
}

impl FileTransfer {
    /// Creates an outgoing transfer from a local file, reading display name
    /// and size from the filesystem. The initiator is the account's own
    /// user.
    pub fn new_send(
        account: Account,
        remote: ContactInfo,
        local_path: impl AsRef<Path>,
    ) -> std::io::Result<Self> {
        let local_path = local_path.as_ref();
        let metadata = std::fs::metadata(local_path)?;
        let filename = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(local_path).first();
        let initiator = account.self_info().clone();

        Ok(Self::build(
            account,
            remote,
            initiator,
            filename,
            metadata.len(),
            content_type,
            Some(local_path.to_path_buf()),
        ))
    }

    /// Creates an incoming transfer from an advertised filename and size.
    /// The initiator is the remote contact.
    pub fn new_receive(
        account: Account,
        remote: ContactInfo,
        filename: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let initiator = remote.clone();
        Self::build(
            account,
            remote,
            initiator,
            filename.into(),
            file_size,
            None,
            None,
        )
    }

    fn build(
        account: Account,
        remote: ContactInfo,
        initiator: ContactInfo,
        filename: String,
        file_size: u64,
        content_type: Option<Mime>,
        local_path: Option<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(FileTransferInner {
                account,
                remote,
                initiator,
                filename,
                file_size,
                content_type,
                local_path,
                cancel: CancellationToken::new(),
                state: RwLock::new(TransferMutableState::default()),
                changed: Signal::new(),
            }),
        }
    }

    pub fn account(&self) -> &Account {
        &self.inner.account
    }

    pub fn remote(&self) -> &ContactInfo {
        &self.inner.remote
    }

    pub fn initiator(&self) -> &ContactInfo {
        &self.inner.initiator
    }

    pub fn filename(&self) -> &str {
        &self.inner.filename
    }

    /// The advertised size in bytes. Zero-byte files are valid.
    pub fn file_size(&self) -> u64 {
        self.inner.file_size
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.inner.content_type.as_ref()
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.inner.local_path.as_deref()
    }

    /// The token protocols must observe while moving bytes.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn state(&self) -> TransferState {
        self.inner.state.read().state
    }

    /// Advances the transfer state machine. Leaving a terminal state is
    /// refused with a warning.
    pub fn set_state(&self, state: TransferState) -> bool {
        self.set_state_with_error(state, None)
    }

    pub fn set_state_with_error(&self, new_state: TransferState, error: Option<Error>) -> bool {
        let error_changed = {
            let mut state = self.inner.state.write();
            if state.state == new_state && state.error == error {
                return true;
            }
            if matches!(state.state, TransferState::Finished | TransferState::Failed) {
                let old_state = state.state;
                drop(state);
                warn!(%old_state, %new_state, "transfer is already in a terminal state");
                return false;
            }
            state.state = new_state;
            let error_changed = state.error != error;
            state.error = error;
            error_changed
        };

        self.notify(TransferProperty::State);
        if error_changed {
            self.notify(TransferProperty::Error);
        }
        true
    }

    pub fn error(&self) -> Option<Error> {
        self.inner.state.read().error.clone()
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.inner.state.read().bytes_transferred
    }

    pub fn set_bytes_transferred(&self, bytes: u64) {
        {
            let mut state = self.inner.state.write();
            if state.bytes_transferred == bytes {
                return;
            }
            state.bytes_transferred = bytes;
        }
        self.notify(TransferProperty::BytesTransferred);
    }

    /// Completed fraction in `[0, 1]`, or `None` for unknown-size (zero)
    /// transfers.
    pub fn progress(&self) -> Option<f64> {
        if self.inner.file_size == 0 {
            return None;
        }
        Some(self.bytes_transferred() as f64 / self.inner.file_size as f64)
    }

    pub fn message(&self) -> Option<String> {
        self.inner.state.read().message.clone()
    }

    /// A human-readable status line for UIs.
    pub fn set_message(&self, message: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.message == message {
                return;
            }
            state.message = message;
        }
        self.notify(TransferProperty::Message);
    }

    /// Cancels the transfer: triggers the token and fails the transfer with
    /// [`Error::Cancelled`].
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
        self.set_state_with_error(TransferState::Failed, Some(Error::Cancelled));
    }

    pub fn changed(&self) -> &Signal<FileTransferEvent> {
        &self.inner.changed
    }

    pub fn ptr_eq(&self, other: &FileTransfer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, property: TransferProperty) {
        self.inner.changed.emit(&FileTransferEvent {
            transfer: self.clone(),
            property,
        });
    }
}

impl Debug for FileTransfer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTransfer")
            .field("filename", &self.inner.filename)
            .field("file_size", &self.inner.file_size)
            .field("state", &self.state())
            .finish()
    }
}
