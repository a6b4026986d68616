// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::warn;

use crate::account::Account;
use crate::contact::{Contact, ContactKey, ContactProperty, Person};
use crate::event::{Signal, SignalHandlerId};

#[derive(Debug, Clone)]
pub enum ContactManagerEvent {
    Added { contact: Contact },
    Removed { contact: Contact },
    Changed { contact: Contact, property: ContactProperty },
    /// Emitted alongside `Changed` so menu consumers can rebuild entries for
    /// the contact.
    PopulateMenu { contact: Contact },
    PersonAdded { person: Person },
    PersonRemoved { person: Person },
}

/// The registry of contacts and persons.
///
/// Contacts are indexed by `(account, id-or-username)`; the manager holds
/// strong references and re-emits every contact's property notifications.
#[derive(Clone, Default)]
pub struct ContactManager {
    inner: Arc<ContactManagerInner>,
}

#[derive(Default)]
struct ContactManagerInner {
    state: RwLock<ContactManagerState>,
    events: Signal<ContactManagerEvent>,
}

#[derive(Default)]
struct ContactManagerState {
    contacts: IndexMap<ContactKey, Registration>,
    persons: Vec<Person>,
}

struct Registration {
    contact: Contact,
    handler: SignalHandlerId,
}

impl ContactManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Signal<ContactManagerEvent> {
        &self.inner.events
    }

    /// Registers a contact. Refuses double-adds (same underlying record) and
    /// identity collisions with a warning.
    pub fn add(&self, contact: &Contact) -> bool {
        let key = contact.key();
        {
            let mut state = self.inner.state.write();
            if let Some(existing) = state.contacts.get(&key) {
                if existing.contact.ptr_eq(contact) {
                    warn!(username = %contact.username(), "contact was already added");
                } else {
                    warn!(
                        username = %contact.username(),
                        "another contact with the same identity is already registered"
                    );
                }
                return false;
            }

            let handler = self.connect_contact(contact);
            state.contacts.insert(
                key,
                Registration {
                    contact: contact.clone(),
                    handler,
                },
            );
        }

        self.inner.events.emit(&ContactManagerEvent::Added {
            contact: contact.clone(),
        });
        true
    }

    /// Removes a contact. Returns false (with no signals) if it was not
    /// registered.
    pub fn remove(&self, contact: &Contact) -> bool {
        let registration = {
            let mut state = self.inner.state.write();
            let Some(registration) = state.contacts.shift_remove(&contact.key()) else {
                return false;
            };
            registration
        };

        registration
            .contact
            .changed()
            .disconnect(registration.handler);

        self.inner.events.emit(&ContactManagerEvent::Removed {
            contact: registration.contact,
        });
        true
    }

    /// Removes every contact belonging to the given account. Returns the
    /// number of contacts removed.
    pub fn remove_all(&self, account: &Account) -> usize {
        let contacts = {
            let state = self.inner.state.read();
            state
                .contacts
                .values()
                .filter(|r| r.contact.account().ptr_eq(account))
                .map(|r| r.contact.clone())
                .collect::<Vec<_>>()
        };

        let mut removed = 0;
        for contact in contacts {
            if self.remove(&contact) {
                removed += 1;
            }
        }
        removed
    }

    pub fn find_with_id(&self, account: &Account, id: &str) -> Option<Contact> {
        let key = ContactKey {
            account_id: Some(account.id().to_string()),
            local: id.to_string(),
        };
        self.inner
            .state
            .read()
            .contacts
            .get(&key)
            .map(|r| r.contact.clone())
    }

    pub fn find_with_username(&self, account: &Account, username: &str) -> Option<Contact> {
        self.inner
            .state
            .read()
            .contacts
            .values()
            .find(|r| r.contact.account().ptr_eq(account) && r.contact.username() == username)
            .map(|r| r.contact.clone())
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.inner
            .state
            .read()
            .contacts
            .values()
            .map(|r| r.contact.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.read().contacts.is_empty()
    }

    pub fn add_person(&self, person: &Person) -> bool {
        {
            let mut state = self.inner.state.write();
            if state.persons.iter().any(|p| p.ptr_eq(person)) {
                warn!(id = %person.id(), "person was already added");
                return false;
            }
            state.persons.push(person.clone());
        }
        self.inner.events.emit(&ContactManagerEvent::PersonAdded {
            person: person.clone(),
        });
        true
    }

    /// Removes a person, optionally removing its contacts from the manager
    /// as well.
    pub fn remove_person(&self, person: &Person, remove_contacts: bool) -> bool {
        let removed = {
            let mut state = self.inner.state.write();
            let len = state.persons.len();
            state.persons.retain(|p| !p.ptr_eq(person));
            state.persons.len() != len
        };
        if !removed {
            return false;
        }

        if remove_contacts {
            for info in person.infos() {
                let contact = self
                    .inner
                    .state
                    .read()
                    .contacts
                    .get(&info.key())
                    .map(|r| r.contact.clone());
                if let Some(contact) = contact {
                    self.remove(&contact);
                }
            }
        }

        self.inner.events.emit(&ContactManagerEvent::PersonRemoved {
            person: person.clone(),
        });
        true
    }

    pub fn persons(&self) -> Vec<Person> {
        self.inner.state.read().persons.clone()
    }

    fn connect_contact(&self, contact: &Contact) -> SignalHandlerId {
        let manager = Arc::downgrade(&self.inner);
        let contact = contact.clone();
        contact.clone().changed().connect(move |event| {
            let Some(manager) = Weak::upgrade(&manager) else {
                return;
            };
            manager.events.emit(&ContactManagerEvent::Changed {
                contact: contact.clone(),
                property: event.property,
            });
            manager.events.emit(&ContactManagerEvent::PopulateMenu {
                contact: contact.clone(),
            });
        })
    }
}

impl Debug for ContactManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ContactManager")
            .field("contacts", &state.contacts.len())
            .field("persons", &state.persons.len())
            .finish()
    }
}
