// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::io::Write;

use pretty_assertions::assert_eq;

use quill_core::transfer::{
    FileTransfer, FileTransferManager, FileTransferManagerEvent, TransferProperty, TransferState,
};
use quill_core::Error;

mod helpers;

use helpers::{account, collect_events, contact};

#[test]
fn test_send_shape_reads_file_metadata() {
    let account = account("test", "test");
    let remote = contact(&account, "u1", "Alice");

    let mut file = tempfile::Builder::new()
        .prefix("quill-transfer")
        .suffix(".txt")
        .tempfile()
        .unwrap();
    file.write_all(b"hello, world").unwrap();

    let transfer =
        FileTransfer::new_send(account.clone(), remote.info().clone(), file.path()).unwrap();

    assert_eq!(transfer.file_size(), 12);
    assert!(transfer.filename().starts_with("quill-transfer"));
    assert_eq!(
        transfer.content_type().map(|m| m.essence_str().to_string()),
        Some("text/plain".to_string())
    );
    assert_eq!(transfer.local_path(), Some(file.path()));
    assert_eq!(transfer.initiator().username(), "test");
    assert_eq!(transfer.state(), TransferState::Unknown);
}

#[test]
fn test_receive_shape_uses_advertised_metadata() {
    let account = account("test", "test");
    let remote = contact(&account, "u1", "Alice");

    let transfer =
        FileTransfer::new_receive(account.clone(), remote.info().clone(), "photo.jpg", 1024);

    assert_eq!(transfer.filename(), "photo.jpg");
    assert_eq!(transfer.file_size(), 1024);
    assert!(transfer.local_path().is_none());
    // The remote side initiated the transfer.
    assert_eq!(transfer.initiator(), transfer.remote());
}

#[test]
fn test_zero_byte_files_are_valid() {
    let account = account("test", "test");
    let remote = contact(&account, "u1", "Alice");

    let transfer = FileTransfer::new_receive(account, remote.info().clone(), "empty", 0);
    assert_eq!(transfer.file_size(), 0);
    assert!(transfer.progress().is_none());
}

#[test]
fn test_progress() {
    let account = account("test", "test");
    let remote = contact(&account, "u1", "Alice");

    let transfer = FileTransfer::new_receive(account, remote.info().clone(), "big.bin", 200);
    assert_eq!(transfer.progress(), Some(0.0));

    transfer.set_bytes_transferred(50);
    assert_eq!(transfer.progress(), Some(0.25));

    transfer.set_bytes_transferred(200);
    assert_eq!(transfer.progress(), Some(1.0));
}

#[test]
fn test_cancel_fails_the_transfer() {
    let account = account("test", "test");
    let remote = contact(&account, "u1", "Alice");

    let transfer = FileTransfer::new_receive(account, remote.info().clone(), "doc.pdf", 42);
    transfer.set_state(TransferState::Negotiating);
    transfer.set_state(TransferState::Started);

    transfer.cancel();

    assert!(transfer.cancellation_token().is_cancelled());
    assert_eq!(transfer.state(), TransferState::Failed);
    assert_eq!(transfer.error(), Some(Error::Cancelled));

    // Terminal states are sticky.
    assert!(!transfer.set_state(TransferState::Started));
    assert_eq!(transfer.state(), TransferState::Failed);
}

#[test]
fn test_manager_round_trip_and_re_emission() {
    let manager = FileTransferManager::new();
    let account = account("test", "test");
    let remote = contact(&account, "u1", "Alice");
    let transfer = FileTransfer::new_receive(account, remote.info().clone(), "doc.pdf", 42);

    let events = collect_events(manager.events());

    assert!(manager.add(&transfer));
    assert!(!manager.add(&transfer));
    assert_eq!(manager.len(), 1);
    assert!(manager.get(0).unwrap().ptr_eq(&transfer));

    transfer.set_state(TransferState::Negotiating);
    assert!(events.lock().iter().any(|event| matches!(
        event,
        FileTransferManagerEvent::TransferChanged {
            property: TransferProperty::State,
            ..
        }
    )));

    assert!(manager.remove(&transfer));
    assert_eq!(manager.len(), 0);

    events.lock().clear();
    assert!(!manager.remove(&transfer));
    assert!(events.lock().is_empty());

    // Changes after removal are no longer re-emitted.
    transfer.set_state(TransferState::Started);
    assert!(events.lock().is_empty());
}
