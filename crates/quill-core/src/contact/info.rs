// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use strum_macros::{Display, EnumString};
use url::Url;

use crate::account::Account;
use crate::event::Signal;
use crate::tags::Tags;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Presence {
    Available,
    Away,
    DoNotDisturb,
    #[default]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactProperty {
    Username,
    DisplayName,
    Alias,
    Presence,
    Avatar,
    Tags,
}

impl ContactProperty {
    /// Whether a change to this property can affect a derived display name.
    pub(crate) fn affects_display_name(&self) -> bool {
        matches!(
            self,
            ContactProperty::Username | ContactProperty::DisplayName | ContactProperty::Alias
        )
    }
}

#[derive(Debug, Clone)]
pub struct ContactInfoEvent {
    pub info: ContactInfo,
    pub property: ContactProperty,
}

/// The identity of a contact info: its owning account (if any) and its id,
/// falling back to the username when no id was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactKey {
    pub account_id: Option<String>,
    pub local: String,
}

/// An identity on a chat service.
///
/// Two infos denote the same identity iff their `(account, id)` pairs match,
/// using the username where the id is absent. Cloning shares the underlying
/// record.
#[derive(Clone)]
pub struct ContactInfo {
    inner: Arc<ContactInfoInner>,
}

pub(crate) struct ContactInfoInner {
    account: Option<Account>,
    id: Option<String>,
    state: RwLock<ContactInfoState>,
    changed: Signal<ContactInfoEvent>,
}

#[derive(Debug, Default)]
struct ContactInfoState {
    username: String,
    display_name: Option<String>,
    alias: Option<String>,
    presence: Presence,
    avatar: Option<Url>,
    tags: Tags,
}

pub struct ContactInfoBuilder {
    account: Option<Account>,
    id: Option<String>,
    username: String,
    display_name: Option<String>,
    alias: Option<String>,
}

impl ContactInfoBuilder {
    pub fn account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn build(self) -> ContactInfo {
        ContactInfo {
            inner: Arc::new(ContactInfoInner {
                account: self.account,
                id: self.id,
                state: RwLock::new(ContactInfoState {
                    username: self.username,
                    display_name: self.display_name,
                    alias: self.alias,
                    ..Default::default()
                }),
                changed: Signal::new(),
            }),
        }
    }
}

impl ContactInfo {
    pub fn new(username: impl Into<String>) -> Self {
        Self::builder(username).build()
    }

    pub fn builder(username: impl Into<String>) -> ContactInfoBuilder {
        ContactInfoBuilder {
            account: None,
            id: None,
            username: username.into(),
            display_name: None,
            alias: None,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        self.inner.account.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    pub fn username(&self) -> String {
        self.inner.state.read().username.clone()
    }

    pub fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        {
            let mut state = self.inner.state.write();
            if state.username == username {
                return;
            }
            state.username = username;
        }
        self.notify(ContactProperty::Username);
    }

    pub fn display_name(&self) -> Option<String> {
        self.inner.state.read().display_name.clone()
    }

    pub fn set_display_name(&self, name: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.display_name == name {
                return;
            }
            state.display_name = name;
        }
        self.notify(ContactProperty::DisplayName);
    }

    pub fn alias(&self) -> Option<String> {
        self.inner.state.read().alias.clone()
    }

    pub fn set_alias(&self, alias: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.alias == alias {
                return;
            }
            state.alias = alias;
        }
        self.notify(ContactProperty::Alias);
    }

    pub fn presence(&self) -> Presence {
        self.inner.state.read().presence
    }

    pub fn set_presence(&self, presence: Presence) {
        {
            let mut state = self.inner.state.write();
            if state.presence == presence {
                return;
            }
            state.presence = presence;
        }
        self.notify(ContactProperty::Presence);
    }

    pub fn avatar(&self) -> Option<Url> {
        self.inner.state.read().avatar.clone()
    }

    pub fn set_avatar(&self, avatar: Option<Url>) {
        {
            let mut state = self.inner.state.write();
            if state.avatar == avatar {
                return;
            }
            state.avatar = avatar;
        }
        self.notify(ContactProperty::Avatar);
    }

    pub fn tags(&self) -> Tags {
        self.inner.state.read().tags.clone()
    }

    /// Mutates the tag set in place and notifies observers if it changed.
    pub fn update_tags(&self, update: impl FnOnce(&mut Tags)) {
        let changed = {
            let mut state = self.inner.state.write();
            let before = state.tags.clone();
            update(&mut state.tags);
            state.tags != before
        };
        if changed {
            self.notify(ContactProperty::Tags);
        }
    }

    /// The name shown for this identity: the user-set alias, then the
    /// service-provided display name, then the username, then the id.
    pub fn name_for_display(&self) -> String {
        let state = self.inner.state.read();
        if let Some(alias) = state.alias.as_ref().filter(|a| !a.is_empty()) {
            return alias.clone();
        }
        if let Some(name) = state.display_name.as_ref().filter(|n| !n.is_empty()) {
            return name.clone();
        }
        if !state.username.is_empty() {
            return state.username.clone();
        }
        self.inner.id.clone().unwrap_or_default()
    }

    pub fn key(&self) -> ContactKey {
        ContactKey {
            account_id: self.inner.account.as_ref().map(|a| a.id().to_string()),
            local: self
                .inner
                .id
                .clone()
                .unwrap_or_else(|| self.inner.state.read().username.clone()),
        }
    }

    pub fn changed(&self) -> &Signal<ContactInfoEvent> {
        &self.inner.changed
    }

    /// Whether the two handles point at the same underlying record.
    pub fn ptr_eq(&self, other: &ContactInfo) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, property: ContactProperty) {
        self.inner.changed.emit(&ContactInfoEvent {
            info: self.clone(),
            property,
        });
    }
}

impl PartialEq for ContactInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ContactInfo {}

impl Hash for ContactInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Debug for ContactInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ContactInfo")
            .field("id", &self.inner.id)
            .field("username", &state.username)
            .field("alias", &state.alias)
            .finish()
    }
}
