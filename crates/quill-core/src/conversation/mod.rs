// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use conversation::{
    Conversation, ConversationEvent, ConversationFeatures, ConversationProperty, ConversationType,
    TypingState,
};
pub use manager::{ConversationManager, ConversationManagerEvent};
pub use members::{ConversationMembers, MemberFlags, MembershipRecord};
pub use message::{Message, MessageFlags};

mod conversation;
mod manager;
mod members;
mod message;
