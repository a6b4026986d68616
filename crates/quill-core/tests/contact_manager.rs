// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use pretty_assertions::assert_eq;

use quill_core::contact::{Contact, ContactManager, ContactManagerEvent, ContactProperty, Person};

mod helpers;

use helpers::{account, collect_events, contact};

#[test]
fn test_add_remove_round_trip() {
    let manager = ContactManager::new();
    let account = account("test", "test");
    let alice = contact(&account, "u1", "Alice");

    assert!(manager.add(&alice));
    assert!(!manager.add(&alice));
    assert_eq!(manager.len(), 1);

    assert!(manager.remove(&alice));
    assert_eq!(manager.len(), 0);

    let events = collect_events(manager.events());
    assert!(!manager.remove(&alice));
    assert!(events.lock().is_empty());
}

#[test]
fn test_identity_collisions_are_refused() {
    let manager = ContactManager::new();
    let account = account("test", "test");

    let alice = contact(&account, "u1", "Alice");
    let impostor = Contact::with_id(account.clone(), "u1", "Impostor");

    assert!(manager.add(&alice));
    assert!(!manager.add(&impostor));
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_find_by_id_and_username() {
    let manager = ContactManager::new();
    let account = account("test", "test");
    let other = helpers::account("test2", "test2");

    let alice = contact(&account, "u1", "Alice");
    let bob = Contact::new(account.clone(), "Bob");
    manager.add(&alice);
    manager.add(&bob);

    assert!(manager.find_with_id(&account, "u1").unwrap().ptr_eq(&alice));
    assert!(manager
        .find_with_username(&account, "Alice")
        .unwrap()
        .ptr_eq(&alice));
    assert!(manager
        .find_with_username(&account, "Bob")
        .unwrap()
        .ptr_eq(&bob));

    // Lookups are account-scoped.
    assert!(manager.find_with_id(&other, "u1").is_none());
    assert!(manager.find_with_username(&other, "Alice").is_none());
}

#[test]
fn test_remove_all_only_touches_one_account() {
    let manager = ContactManager::new();
    let first = account("test", "test");
    let second = helpers::account("test2", "test2");

    manager.add(&contact(&first, "u1", "Alice"));
    manager.add(&contact(&first, "u2", "Bob"));
    manager.add(&contact(&second, "u1", "Eve"));

    assert_eq!(manager.remove_all(&first), 2);
    assert_eq!(manager.len(), 1);
    assert!(manager.find_with_id(&second, "u1").is_some());
}

#[test]
fn test_contact_changes_are_re_emitted() {
    let manager = ContactManager::new();
    let account = account("test", "test");
    let alice = contact(&account, "u1", "Alice");
    manager.add(&alice);

    let events = collect_events(manager.events());
    alice.set_alias(Some("Ally".to_string()));

    {
        let events = events.lock();
        assert!(events.iter().any(|event| matches!(
            event,
            ContactManagerEvent::Changed {
                property: ContactProperty::Alias,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|event| matches!(event, ContactManagerEvent::PopulateMenu { .. })));
    }

    manager.remove(&alice);
    events.lock().clear();
    alice.set_alias(None);
    assert!(events.lock().is_empty());
}

#[test]
fn test_persons() {
    let manager = ContactManager::new();
    let account = account("test", "test");

    let alice = contact(&account, "u1", "Alice");
    let alice_work = contact(&account, "u2", "alice.work");
    manager.add(&alice);
    manager.add(&alice_work);

    let person = Person::new();
    assert!(person.add_info(alice.info().clone()));
    assert!(person.add_info(alice_work.info().clone()));

    assert!(manager.add_person(&person));
    assert!(!manager.add_person(&person));
    assert_eq!(manager.persons().len(), 1);

    // Removing the person together with its contacts empties the manager.
    assert!(manager.remove_person(&person, true));
    assert!(!manager.remove_person(&person, false));
    assert!(manager.persons().is_empty());
    assert_eq!(manager.len(), 0);
}

#[test]
fn test_person_without_contact_removal() {
    let manager = ContactManager::new();
    let account = account("test", "test");
    let alice = contact(&account, "u1", "Alice");
    manager.add(&alice);

    let person = Person::new();
    person.add_info(alice.info().clone());
    manager.add_person(&person);

    assert!(manager.remove_person(&person, false));
    assert_eq!(manager.len(), 1);
}
