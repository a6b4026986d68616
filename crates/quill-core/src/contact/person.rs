// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::contact::ContactInfo;
use crate::event::Signal;

#[derive(Debug, Clone)]
pub enum PersonEventKind {
    InfoAdded(ContactInfo),
    InfoRemoved(ContactInfo),
}

#[derive(Debug, Clone)]
pub struct PersonEvent {
    pub person: Person,
    pub kind: PersonEventKind,
}

/// A group of contact infos the user considers the same human.
///
/// Contact infos are shared; an info can outlive every person referencing
/// it, and removing the last info does not remove the person.
#[derive(Clone)]
pub struct Person {
    inner: Arc<PersonInner>,
}

struct PersonInner {
    id: String,
    infos: RwLock<Vec<ContactInfo>>,
    changed: Signal<PersonEvent>,
}

impl Person {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(PersonInner {
                id: id.into(),
                infos: RwLock::new(Vec::new()),
                changed: Signal::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Adds a contact info. Returns false if an info with the same identity
    /// is already part of this person.
    pub fn add_info(&self, info: ContactInfo) -> bool {
        {
            let mut infos = self.inner.infos.write();
            if infos.iter().any(|existing| existing == &info) {
                return false;
            }
            infos.push(info.clone());
        }
        self.inner.changed.emit(&PersonEvent {
            person: self.clone(),
            kind: PersonEventKind::InfoAdded(info),
        });
        true
    }

    /// Removes a contact info. Returns false if it was not part of this
    /// person.
    pub fn remove_info(&self, info: &ContactInfo) -> bool {
        let removed = {
            let mut infos = self.inner.infos.write();
            let len = infos.len();
            infos.retain(|existing| existing != info);
            infos.len() != len
        };
        if removed {
            self.inner.changed.emit(&PersonEvent {
                person: self.clone(),
                kind: PersonEventKind::InfoRemoved(info.clone()),
            });
        }
        removed
    }

    pub fn infos(&self) -> Vec<ContactInfo> {
        self.inner.infos.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.infos.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.infos.read().is_empty()
    }

    pub fn changed(&self) -> &Signal<PersonEvent> {
        &self.inner.changed
    }

    pub fn ptr_eq(&self, other: &Person) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Person {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Person")
            .field("id", &self.inner.id)
            .field("infos", &self.inner.infos.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_infos() {
        let person = Person::new();
        let alice = ContactInfo::builder("alice").id("u1").build();
        let bob = ContactInfo::builder("bob").id("u2").build();

        assert!(person.add_info(alice.clone()));
        assert!(person.add_info(bob.clone()));
        assert!(!person.add_info(alice.clone()));
        assert_eq!(person.len(), 2);

        assert!(person.remove_info(&alice));
        assert!(!person.remove_info(&alice));
        assert_eq!(person.len(), 1);

        // A person survives losing its last info.
        assert!(person.remove_info(&bob));
        assert!(person.is_empty());
    }
}
