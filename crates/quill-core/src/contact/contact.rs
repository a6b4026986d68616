// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::ops::Deref;

use crate::account::Account;
use crate::contact::ContactInfo;

/// A [`ContactInfo`] bound to an [`Account`].
///
/// The account is set at construction and never changes. Within a
/// [`ContactManager`](crate::contact::ContactManager) the pair
/// `(account, id-or-username)` is unique.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Contact {
    info: ContactInfo,
}

impl Contact {
    pub fn new(account: Account, username: impl Into<String>) -> Self {
        Self {
            info: ContactInfo::builder(username).account(account).build(),
        }
    }

    pub fn with_id(account: Account, id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            info: ContactInfo::builder(username)
                .account(account)
                .id(id)
                .build(),
        }
    }

    pub fn account(&self) -> &Account {
        self.info
            .account()
            .expect("Contact was constructed without an account")
    }

    pub fn info(&self) -> &ContactInfo {
        &self.info
    }

    pub fn into_info(self) -> ContactInfo {
        self.info
    }
}

impl Deref for Contact {
    type Target = ContactInfo;

    fn deref(&self) -> &Self::Target {
        &self.info
    }
}

impl Debug for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contact")
            .field("account", &self.account().id())
            .field("info", &self.info)
            .finish()
    }
}
