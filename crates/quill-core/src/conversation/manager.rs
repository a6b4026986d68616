// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::contact::Contact;
use crate::conversation::{
    Conversation, ConversationEvent, ConversationProperty, ConversationType,
};
use crate::event::{Signal, SignalHandlerId};

#[derive(Debug, Clone)]
pub enum ConversationManagerEvent {
    Registered {
        conversation: Conversation,
    },
    Unregistered {
        conversation: Conversation,
    },
    /// A registered conversation asked for UI attention.
    Present {
        conversation: Conversation,
    },
    ConversationChanged {
        conversation: Conversation,
        property: ConversationProperty,
    },
}

/// The registry of live conversations.
///
/// Conversations are registered and unregistered explicitly; the manager
/// re-emits every registered conversation's property notifications and
/// disconnects from them on unregistration.
#[derive(Clone, Default)]
pub struct ConversationManager {
    inner: Arc<ConversationManagerInner>,
}

#[derive(Default)]
pub(crate) struct ConversationManagerInner {
    state: RwLock<Vec<Registration>>,
    events: Signal<ConversationManagerEvent>,
}

struct Registration {
    conversation: Conversation,
    handler: SignalHandlerId,
}

impl ConversationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &Signal<ConversationManagerEvent> {
        &self.inner.events
    }

    /// Registers a conversation. Returns false if it is already registered.
    pub fn register(&self, conversation: &Conversation) -> bool {
        {
            let mut state = self.inner.state.write();
            if state.iter().any(|r| r.conversation.ptr_eq(conversation)) {
                return false;
            }

            let handler = self.connect_conversation(conversation);
            state.push(Registration {
                conversation: conversation.clone(),
                handler,
            });
        }

        self.inner.events.emit(&ConversationManagerEvent::Registered {
            conversation: conversation.clone(),
        });
        true
    }

    /// Unregisters a conversation, disconnecting from its notifications.
    /// Returns false if it was not registered.
    pub fn unregister(&self, conversation: &Conversation) -> bool {
        let registration = {
            let mut state = self.inner.state.write();
            let Some(position) = state
                .iter()
                .position(|r| r.conversation.ptr_eq(conversation))
            else {
                return false;
            };
            state.remove(position)
        };

        registration
            .conversation
            .events()
            .disconnect(registration.handler);

        self.inner
            .events
            .emit(&ConversationManagerEvent::Unregistered {
                conversation: registration.conversation,
            });
        true
    }

    /// The first registered DM conversation on the contact's account whose
    /// sole non-self member is the contact.
    pub fn find_dm(&self, contact: &Contact) -> Option<Conversation> {
        self.inner
            .state
            .read()
            .iter()
            .map(|r| &r.conversation)
            .find(|conversation| {
                if conversation.kind() != ConversationType::Dm {
                    return false;
                }
                if !conversation.account().ptr_eq(contact.account()) {
                    return false;
                }
                let members = conversation.members();
                let mut others = members.others();
                let Some(record) = others.next() else {
                    return false;
                };
                others.next().is_none() && &record.contact == contact.info()
            })
            .cloned()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner
            .state
            .read()
            .iter()
            .map(|r| r.conversation.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.read().is_empty()
    }

    fn connect_conversation(&self, conversation: &Conversation) -> SignalHandlerId {
        let manager = Arc::downgrade(&self.inner);
        conversation.events().connect(move |event| {
            let Some(manager) = Weak::upgrade(&manager) else {
                return;
            };
            match event {
                ConversationEvent::Changed {
                    conversation,
                    property,
                } => {
                    manager
                        .events
                        .emit(&ConversationManagerEvent::ConversationChanged {
                            conversation: conversation.clone(),
                            property: *property,
                        });
                }
                ConversationEvent::Presented { conversation } => {
                    manager.events.emit(&ConversationManagerEvent::Present {
                        conversation: conversation.clone(),
                    });
                }
                _ => (),
            }
        })
    }
}

impl Debug for ConversationManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationManager")
            .field("conversations", &self.len())
            .finish()
    }
}
