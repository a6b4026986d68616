// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use strum_macros::Display;
use tracing::warn;

use crate::account::Account;
use crate::contact::{ContactInfo, ContactKey};
use crate::conversation::{ConversationMembers, MemberFlags, MembershipRecord, Message};
use crate::event::{Signal, SignalHandlerId};
use crate::tags::Tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConversationType {
    Dm,
    GroupDm,
    Channel,
    Thread,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TypingState {
    #[default]
    Idle,
    Typing,
    Paused,
}

/// Protocol-advertised conversation capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationFeatures(u32);

impl ConversationFeatures {
    pub const NONE: Self = Self(0);
    pub const HTML: Self = Self(1 << 0);
    pub const TYPING: Self = Self(1 << 1);
    pub const TOPIC: Self = Self(1 << 2);
    pub const IMAGES: Self = Self(1 << 3);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationProperty {
    Name,
    Alias,
    Title,
    TitleForDisplay,
    Topic,
    Features,
    TypingState,
    UserNickname,
    Favorite,
    AgeRestricted,
    NeedsAttention,
    Logging,
    Tags,
    Members,
}

#[derive(Debug, Clone)]
pub enum ConversationEvent {
    Changed {
        conversation: Conversation,
        property: ConversationProperty,
    },
    MessageWritten {
        conversation: Conversation,
        message: Message,
    },
    MemberAdded {
        conversation: Conversation,
        contact: ContactInfo,
    },
    MemberRemoved {
        conversation: Conversation,
        contact: ContactInfo,
    },
    Presented {
        conversation: Conversation,
    },
}

/// A DM, group DM, channel or thread.
///
/// Conversations own their members and message log. The derived
/// `title_for_display` follows the chain alias → title → generated from
/// members → id and is recomputed whenever any of its sources change,
/// including member display-name changes.
#[derive(Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

pub(crate) struct ConversationInner {
    account: Account,
    id: String,
    kind: ConversationType,
    created_on: DateTime<Utc>,
    state: RwLock<ConversationState>,
    members: RwLock<ConversationMembers>,
    messages: RwLock<Vec<Message>>,
    member_handlers: Mutex<HashMap<ContactKey, SignalHandlerId>>,
    events: Signal<ConversationEvent>,
}

struct ConversationState {
    name: Option<String>,
    alias: Option<String>,
    title: Option<String>,
    topic: Option<String>,
    topic_author: Option<ContactInfo>,
    topic_updated: Option<DateTime<Utc>>,
    features: ConversationFeatures,
    typing_state: TypingState,
    user_nickname: Option<String>,
    favorite: bool,
    age_restricted: bool,
    needs_attention: bool,
    logging: bool,
    tags: Tags,
    title_for_display: String,
}

impl Conversation {
    pub fn new(account: Account, id: impl Into<String>, kind: ConversationType) -> Self {
        let id = id.into();
        Self {
            inner: Arc::new(ConversationInner {
                account,
                kind,
                created_on: Utc::now(),
                state: RwLock::new(ConversationState {
                    name: None,
                    alias: None,
                    title: None,
                    topic: None,
                    topic_author: None,
                    topic_updated: None,
                    features: ConversationFeatures::NONE,
                    typing_state: TypingState::Idle,
                    user_nickname: None,
                    favorite: false,
                    age_restricted: false,
                    needs_attention: false,
                    logging: false,
                    tags: Tags::new(),
                    title_for_display: id.clone(),
                }),
                id,
                members: RwLock::new(ConversationMembers::new()),
                messages: RwLock::new(Vec::new()),
                member_handlers: Mutex::new(HashMap::new()),
                events: Signal::new(),
            }),
        }
    }

    pub fn account(&self) -> &Account {
        &self.inner.account
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The globally unique id, `<account id>-<conversation id>`.
    pub fn global_id(&self) -> String {
        format!("{}-{}", self.inner.account.id(), self.inner.id)
    }

    pub fn kind(&self) -> ConversationType {
        self.inner.kind
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        self.inner.created_on
    }

    pub fn events(&self) -> &Signal<ConversationEvent> {
        &self.inner.events
    }

    pub fn name(&self) -> Option<String> {
        self.inner.state.read().name.clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.name == name {
                return;
            }
            state.name = name;
        }
        self.notify(ConversationProperty::Name);
    }

    pub fn alias(&self) -> Option<String> {
        self.inner.state.read().alias.clone()
    }

    /// Sets the user-chosen alias, the highest-priority title source.
    pub fn set_alias(&self, alias: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.alias == alias {
                return;
            }
            state.alias = alias;
        }
        self.notify(ConversationProperty::Alias);
        self.refresh_title_for_display();
    }

    pub fn title(&self) -> Option<String> {
        self.inner.state.read().title.clone()
    }

    /// Sets the protocol-chosen title.
    pub fn set_title(&self, title: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.title == title {
                return;
            }
            state.title = title;
        }
        self.notify(ConversationProperty::Title);
        self.refresh_title_for_display();
    }

    pub fn topic(&self) -> Option<String> {
        self.inner.state.read().topic.clone()
    }

    pub fn topic_author(&self) -> Option<ContactInfo> {
        self.inner.state.read().topic_author.clone()
    }

    pub fn topic_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().topic_updated
    }

    /// Sets topic, author and timestamp atomically, with a single
    /// notification.
    pub fn set_topic_full(
        &self,
        topic: Option<String>,
        author: Option<ContactInfo>,
        updated: Option<DateTime<Utc>>,
    ) {
        {
            let mut state = self.inner.state.write();
            if state.topic == topic && state.topic_author == author && state.topic_updated == updated
            {
                return;
            }
            state.topic = topic;
            state.topic_author = author;
            state.topic_updated = updated;
        }
        self.notify(ConversationProperty::Topic);
    }

    pub fn features(&self) -> ConversationFeatures {
        self.inner.state.read().features
    }

    pub fn set_features(&self, features: ConversationFeatures) {
        {
            let mut state = self.inner.state.write();
            if state.features == features {
                return;
            }
            state.features = features;
        }
        self.notify(ConversationProperty::Features);
    }

    pub fn typing_state(&self) -> TypingState {
        self.inner.state.read().typing_state
    }

    pub fn set_typing_state(&self, typing_state: TypingState) {
        {
            let mut state = self.inner.state.write();
            if state.typing_state == typing_state {
                return;
            }
            state.typing_state = typing_state;
        }
        self.notify(ConversationProperty::TypingState);
    }

    pub fn user_nickname(&self) -> Option<String> {
        self.inner.state.read().user_nickname.clone()
    }

    pub fn set_user_nickname(&self, nickname: Option<String>) {
        {
            let mut state = self.inner.state.write();
            if state.user_nickname == nickname {
                return;
            }
            state.user_nickname = nickname;
        }
        self.notify(ConversationProperty::UserNickname);
    }

    pub fn favorite(&self) -> bool {
        self.inner.state.read().favorite
    }

    pub fn set_favorite(&self, favorite: bool) {
        self.set_flag(favorite, ConversationProperty::Favorite, |s| &mut s.favorite);
    }

    pub fn age_restricted(&self) -> bool {
        self.inner.state.read().age_restricted
    }

    pub fn set_age_restricted(&self, age_restricted: bool) {
        self.set_flag(age_restricted, ConversationProperty::AgeRestricted, |s| {
            &mut s.age_restricted
        });
    }

    pub fn needs_attention(&self) -> bool {
        self.inner.state.read().needs_attention
    }

    pub fn set_needs_attention(&self, needs_attention: bool) {
        self.set_flag(needs_attention, ConversationProperty::NeedsAttention, |s| {
            &mut s.needs_attention
        });
    }

    pub fn logging(&self) -> bool {
        self.inner.state.read().logging
    }

    pub fn set_logging(&self, logging: bool) {
        self.set_flag(logging, ConversationProperty::Logging, |s| &mut s.logging);
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
            self.notify(ConversationProperty::Tags);
        }
    }

    /// The title shown to the user: alias, then title, then a members-derived
    /// name, then the conversation id.
    pub fn title_for_display(&self) -> String {
        self.inner.state.read().title_for_display.clone()
    }

    /// Signals that the UI should bring this conversation to the front.
    pub fn present(&self) {
        self.inner.events.emit(&ConversationEvent::Presented {
            conversation: self.clone(),
        });
    }

    // Members

    pub fn add_member(&self, contact: &ContactInfo, is_me: bool) -> bool {
        self.add_member_record(MembershipRecord::new(contact.clone(), is_me))
    }

    pub fn add_member_with(
        &self,
        contact: &ContactInfo,
        is_me: bool,
        flags: MemberFlags,
        nickname: Option<String>,
    ) -> bool {
        let mut record = MembershipRecord::new(contact.clone(), is_me);
        record.flags = flags;
        record.nickname = nickname;
        self.add_member_record(record)
    }

    fn add_member_record(&self, record: MembershipRecord) -> bool {
        let contact = record.contact.clone();
        {
            let mut members = self.inner.members.write();
            if !members.insert(record) {
                warn!(
                    conversation = %self.inner.id,
                    contact = %contact.name_for_display(),
                    "member is already part of the conversation"
                );
                return false;
            }
        }

        self.connect_member(&contact);

        self.inner.events.emit(&ConversationEvent::MemberAdded {
            conversation: self.clone(),
            contact,
        });
        self.notify(ConversationProperty::Members);
        self.refresh_title_for_display();
        true
    }

    pub fn remove_member(&self, contact: &ContactInfo) -> bool {
        let record = {
            let mut members = self.inner.members.write();
            members.remove(contact)
        };
        let Some(record) = record else {
            return false;
        };

        self.disconnect_member(&record.contact);

        self.inner.events.emit(&ConversationEvent::MemberRemoved {
            conversation: self.clone(),
            contact: record.contact,
        });
        self.notify(ConversationProperty::Members);
        self.refresh_title_for_display();
        true
    }

    pub fn member(&self, contact: &ContactInfo) -> Option<MembershipRecord> {
        self.inner.members.read().get(contact).cloned()
    }

    pub fn members(&self) -> ConversationMembers {
        self.inner.members.read().clone()
    }

    pub fn member_count(&self) -> usize {
        self.inner.members.read().len()
    }

    /// Updates a member's flags in place. Returns false if the contact is
    /// not a member.
    pub fn update_member_flags(
        &self,
        contact: &ContactInfo,
        update: impl FnOnce(&mut MemberFlags),
    ) -> bool {
        let changed = {
            let mut members = self.inner.members.write();
            let Some(record) = members.get_mut(contact) else {
                return false;
            };
            let before = record.flags;
            update(&mut record.flags);
            record.flags != before
        };
        if changed {
            self.notify(ConversationProperty::Members);
        }
        true
    }

    // Messages

    /// Appends a message to the log and notifies observers. Message ids are
    /// unique within a conversation; duplicates are refused with a warning.
    pub fn write_message(&self, message: Message) -> bool {
        {
            let mut messages = self.inner.messages.write();
            if messages.iter().any(|m| m.id == message.id) {
                warn!(
                    conversation = %self.inner.id,
                    message = %message.id,
                    "a message with this id was already written"
                );
                return false;
            }
            messages.push(message.clone());
        }

        self.inner.events.emit(&ConversationEvent::MessageWritten {
            conversation: self.clone(),
            message,
        });
        true
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.messages.read().clone()
    }

    pub fn message_count(&self) -> usize {
        self.inner.messages.read().len()
    }

    pub fn ptr_eq(&self, other: &Conversation) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ConversationInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<ConversationInner>) -> Self {
        Self { inner }
    }

    // Derived title

    fn generated_title(&self) -> Option<String> {
        let members = self.inner.members.read();
        let mut others = members.others().map(MembershipRecord::shown_name);
        match self.inner.kind {
            ConversationType::Dm => {
                let name = others.next()?;
                if others.next().is_some() {
                    return None;
                }
                Some(name)
            }
            ConversationType::GroupDm => {
                let names = others.collect::<Vec<_>>();
                if names.is_empty() {
                    return None;
                }
                Some(names.join(", "))
            }
            _ => None,
        }
    }

    fn refresh_title_for_display(&self) {
        let generated = self.generated_title();
        let changed = {
            let mut state = self.inner.state.write();
            let new_title = state
                .alias
                .clone()
                .or_else(|| state.title.clone())
                .or(generated)
                .unwrap_or_else(|| self.inner.id.clone());
            if state.title_for_display == new_title {
                false
            } else {
                state.title_for_display = new_title;
                true
            }
        };
        if changed {
            self.notify(ConversationProperty::TitleForDisplay);
        }
    }

    fn connect_member(&self, contact: &ContactInfo) {
        let weak = self.downgrade();
        let handler = contact.changed().connect(move |event| {
            if !event.property.affects_display_name() {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            Conversation::from_inner(inner).refresh_title_for_display();
        });
        self.inner
            .member_handlers
            .lock()
            .insert(contact.key(), handler);
    }

    fn disconnect_member(&self, contact: &ContactInfo) {
        if let Some(handler) = self.inner.member_handlers.lock().remove(&contact.key()) {
            contact.changed().disconnect(handler);
        }
    }

    fn set_flag(
        &self,
        value: bool,
        property: ConversationProperty,
        field: impl FnOnce(&mut ConversationState) -> &mut bool,
    ) {
        {
            let mut state = self.inner.state.write();
            let slot = field(&mut *state);
            if *slot == value {
                return;
            }
            *slot = value;
        }
        self.notify(property);
    }

    fn notify(&self, property: ConversationProperty) {
        self.inner.events.emit(&ConversationEvent::Changed {
            conversation: self.clone(),
            property,
        });
    }
}

impl Debug for Conversation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("account", &self.inner.account.id())
            .finish()
    }
}
