// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use pretty_assertions::assert_eq;

use quill_core::conversation::{
    Conversation, ConversationManager, ConversationManagerEvent, ConversationProperty,
    ConversationType,
};

mod helpers;

use helpers::{account, collect_events, contact};

#[test]
fn test_register_and_unregister_are_idempotent_false() {
    let manager = ConversationManager::new();
    let account = account("test", "test");
    let conversation = Conversation::new(account, "dm-1", ConversationType::Dm);

    let events = collect_events(manager.events());

    assert!(manager.register(&conversation));
    assert!(!manager.register(&conversation));
    assert_eq!(manager.len(), 1);

    assert!(manager.unregister(&conversation));
    assert!(!manager.unregister(&conversation));
    assert!(manager.is_empty());

    let kinds = events
        .lock()
        .iter()
        .map(|event| match event {
            ConversationManagerEvent::Registered { .. } => "registered",
            ConversationManagerEvent::Unregistered { .. } => "unregistered",
            _ => "other",
        })
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec!["registered", "unregistered"]);
}

#[test]
fn test_property_notifications_are_re_emitted_until_unregistered() {
    let manager = ConversationManager::new();
    let account = account("test", "test");
    let conversation = Conversation::new(account, "chan-1", ConversationType::Channel);

    let events = collect_events(manager.events());

    manager.register(&conversation);
    conversation.set_title(Some("news".to_string()));

    let changed = events
        .lock()
        .iter()
        .filter_map(|event| match event {
            ConversationManagerEvent::ConversationChanged { property, .. } => Some(*property),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(changed.contains(&ConversationProperty::Title));
    assert!(changed.contains(&ConversationProperty::TitleForDisplay));

    // Disconnecting on unregister is mandatory.
    manager.unregister(&conversation);
    events.lock().clear();
    conversation.set_title(Some("olds".to_string()));
    assert!(events.lock().is_empty());
}

#[test]
fn test_present_propagates_through_manager() {
    let manager = ConversationManager::new();
    let account = account("test", "test");
    let conversation = Conversation::new(account, "dm-1", ConversationType::Dm);

    let events = collect_events(manager.events());
    manager.register(&conversation);
    conversation.present();

    assert!(events.lock().iter().any(|event| matches!(
        event,
        ConversationManagerEvent::Present { conversation: c } if c.ptr_eq(&conversation)
    )));
}

#[test]
fn test_find_dm() {
    let manager = ConversationManager::new();
    let account = account("test", "test");
    let other_account = helpers::account("test2", "test2");

    let alice = contact(&account, "u1", "Alice");
    let bob = contact(&account, "u2", "Bob");

    // A group DM with Alice must not count as her DM.
    let group = Conversation::new(account.clone(), "gdm-1", ConversationType::GroupDm);
    group.add_member(alice.info(), false);
    group.add_member(bob.info(), false);
    manager.register(&group);

    let dm = Conversation::new(account.clone(), "dm-1", ConversationType::Dm);
    dm.add_member(alice.info(), false);
    manager.register(&dm);

    // A DM on another account with the same identity must not match.
    let foreign_alice = contact(&other_account, "u1", "Alice");
    let foreign_dm = Conversation::new(other_account.clone(), "dm-1", ConversationType::Dm);
    foreign_dm.add_member(foreign_alice.info(), false);
    manager.register(&foreign_dm);

    let found = manager.find_dm(&alice).expect("DM should be found");
    assert!(found.ptr_eq(&dm));

    assert!(manager.find_dm(&bob).is_none());
}
