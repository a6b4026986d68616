// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use quill_oscar::{
    subtype, tlv_kinds, PermitDenyMode, Snac, SnacSink, SsiError, SsiItem, SsiItemKind,
    SsiSession,
};

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Snac>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn subtypes(&self) -> Vec<u16> {
        self.sent.lock().unwrap().iter().map(|s| s.subtype).collect()
    }

    fn request_ids(&self) -> Vec<u32> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.request_id)
            .collect()
    }
}

impl SnacSink for RecordingSink {
    fn send_snac(&self, snac: Snac) -> Result<(), SsiError> {
        self.sent.lock().unwrap().push(snac);
        Ok(())
    }
}

fn buddy(name: &str, group_id: u16, buddy_id: u16) -> SsiItem {
    SsiItem::new(Some(name.to_string()), group_id, buddy_id, SsiItemKind::Buddy)
}

#[test]
fn test_one_in_flight_queue() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    session.request_add(&[buddy("alice", 1, 1)]).unwrap();
    session.request_add(&[buddy("bob", 1, 2)]).unwrap();
    session.request_delete(&[buddy("carol", 1, 3)]).unwrap();

    // Only mod_begin and the first request have hit the wire; the rest is
    // held until the ack.
    assert_eq!(sink.subtypes(), vec![subtype::MOD_BEGIN, subtype::ADD]);
    assert!(session.is_waiting_for_ack());
    assert_eq!(session.pending_requests(), 2);

    session.handle_ack().unwrap();
    assert_eq!(
        sink.subtypes(),
        vec![subtype::MOD_BEGIN, subtype::ADD, subtype::ADD]
    );

    session.handle_ack().unwrap();
    assert_eq!(
        sink.subtypes(),
        vec![
            subtype::MOD_BEGIN,
            subtype::ADD,
            subtype::ADD,
            subtype::DELETE
        ]
    );

    // Draining the queue closes the transaction.
    session.handle_ack().unwrap();
    assert_eq!(
        sink.subtypes(),
        vec![
            subtype::MOD_BEGIN,
            subtype::ADD,
            subtype::ADD,
            subtype::DELETE,
            subtype::MOD_END
        ]
    );
    assert!(!session.is_waiting_for_ack());
    assert_eq!(session.pending_requests(), 0);
}

#[test]
fn test_new_transaction_after_drain() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    session.request_add(&[buddy("alice", 1, 1)]).unwrap();
    session.handle_ack().unwrap();
    assert_eq!(
        sink.subtypes(),
        vec![subtype::MOD_BEGIN, subtype::ADD, subtype::MOD_END]
    );

    // A later submission opens a fresh transaction.
    session.request_modify(&[buddy("alice", 1, 1)]).unwrap();
    session.handle_ack().unwrap();
    assert_eq!(
        sink.subtypes(),
        vec![
            subtype::MOD_BEGIN,
            subtype::ADD,
            subtype::MOD_END,
            subtype::MOD_BEGIN,
            subtype::MODIFY,
            subtype::MOD_END
        ]
    );
}

#[test]
fn test_request_ids_increase() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    session.request_add(&[buddy("alice", 1, 1)]).unwrap();
    session.handle_ack().unwrap();

    let ids = sink.request_ids();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_clean_list_migrates_orphans() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    // A well-formed group next to an orphaned buddy in the master group.
    let (group, _) = session
        .list_mut()
        .add(Some("Buddies".to_string()), SsiItemKind::Group, None);
    session
        .list_mut()
        .add(Some("alice".to_string()), SsiItemKind::Buddy, Some(group));
    session.list_mut().insert(buddy("stray", 0, 99));

    session.clean_list().unwrap();

    // No buddy remains in the master group.
    assert!(session
        .list()
        .items()
        .iter()
        .all(|i| i.kind != SsiItemKind::Buddy || i.group_id != 0));

    // The group summary was rebuilt and is non-empty.
    let members = session
        .list()
        .find_item(None, Some("Buddies"), SsiItemKind::Group)
        .unwrap()
        .data
        .get(tlv_kinds::GROUP_MEMBERS)
        .unwrap();
    assert_eq!(members.len(), 4);

    // The migration went over the wire as delete-then-add.
    let subtypes = sink.subtypes();
    let delete = subtypes.iter().position(|s| *s == subtype::DELETE).unwrap();
    let add = subtypes.iter().rposition(|s| *s == subtype::ADD).unwrap();
    assert!(delete < add);

    // No empty groups remain.
    assert!(session
        .list()
        .groups()
        .filter(|g| g.group_id != 0)
        .all(|g| g.data.get(tlv_kinds::GROUP_MEMBERS).is_some()));
}

#[test]
fn test_clean_list_creates_unknown_group_when_needed() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink);

    session.list_mut().insert(buddy("stray", 0, 1));
    session.clean_list().unwrap();

    let unknown = session
        .list()
        .find_item(None, Some("Unknown"), SsiItemKind::Group)
        .expect("a group was created");
    assert_ne!(unknown.group_id, 0);

    let stray = session
        .list()
        .find_item(None, Some("stray"), SsiItemKind::Buddy)
        .unwrap();
    assert_eq!(stray.group_id, unknown.group_id);
}

#[test]
fn test_clean_list_removes_empty_groups() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    let (keep, _) = session
        .list_mut()
        .add(Some("Buddies".to_string()), SsiItemKind::Group, None);
    session
        .list_mut()
        .add(Some("alice".to_string()), SsiItemKind::Buddy, Some(keep));
    session
        .list_mut()
        .add(Some("Empty".to_string()), SsiItemKind::Group, None);
    session.list_mut().insert(buddy("stray", 0, 50));

    session.clean_list().unwrap();

    assert!(session
        .list()
        .find_item(None, Some("Empty"), SsiItemKind::Group)
        .is_none());
    assert!(session
        .list()
        .find_item(None, Some("Buddies"), SsiItemKind::Group)
        .is_some());
}

#[test]
fn test_clean_list_is_a_noop_without_orphans() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    let (group, _) = session
        .list_mut()
        .add(Some("Buddies".to_string()), SsiItemKind::Group, None);
    session
        .list_mut()
        .add(Some("alice".to_string()), SsiItemKind::Buddy, Some(group));

    session.clean_list().unwrap();
    assert!(sink.subtypes().is_empty());
}

#[test]
fn test_set_permit_deny_adds_then_modifies() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink.clone());

    session
        .set_permit_deny(PermitDenyMode::AllowBuddiesOnly, 0xFFFF_FFFF)
        .unwrap();
    session.handle_ack().unwrap();

    let item = session
        .list()
        .find_item(None, None, SsiItemKind::PdInfo)
        .unwrap()
        .clone();
    assert_eq!(item.data.get(tlv_kinds::PD_MODE).unwrap().value(), &[5]);

    // Tag an unrelated TLV onto the item, then change the mode: the value
    // is overwritten in place and the extra TLV survives.
    session
        .list_mut()
        .find_mut(item.group_id, item.buddy_id)
        .unwrap()
        .data
        .set_u8(0x0066, 1);

    session
        .set_permit_deny(PermitDenyMode::BlockAll, 0)
        .unwrap();
    session.handle_ack().unwrap();

    let item = session
        .list()
        .find_item(None, None, SsiItemKind::PdInfo)
        .unwrap();
    assert_eq!(item.data.get(tlv_kinds::PD_MODE).unwrap().value(), &[2]);
    assert!(item.data.get(0x0066).is_some());

    // First submission added, second modified.
    let subtypes = sink.subtypes();
    assert!(subtypes.contains(&subtype::ADD));
    assert!(subtypes.contains(&subtype::MODIFY));
}

#[test]
fn test_set_presence() {
    let sink = RecordingSink::new();
    let mut session = SsiSession::new(sink);

    session.set_presence(0x0000_0400).unwrap();
    session.handle_ack().unwrap();

    let item = session
        .list()
        .find_item(None, None, SsiItemKind::PresencePrefs)
        .unwrap();
    assert_eq!(
        item.data.get(tlv_kinds::PRESENCE_PREFS).unwrap().value(),
        0x0000_0400u32.to_be_bytes().as_slice()
    );

    session.set_presence(0).unwrap();
    let item = session
        .list()
        .find_item(None, None, SsiItemKind::PresencePrefs)
        .unwrap();
    assert_eq!(
        item.data.get(tlv_kinds::PRESENCE_PREFS).unwrap().value(),
        &[0, 0, 0, 0]
    );
}
