// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};

use crate::contact::ContactInfo;
use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFlags {
    /// An outgoing message.
    pub send: bool,
    /// An incoming message.
    pub recv: bool,
    /// Generated by the system rather than a member.
    pub system: bool,
    /// Should trigger a notification.
    pub notify: bool,
    /// Delivery failed.
    pub error: bool,
    /// Contains inline images.
    pub images: bool,
    /// Arrived delayed (e.g. from offline storage or history).
    pub delayed: bool,
    /// Mentions the user's nickname.
    pub nick: bool,
}

/// An immutable record of a single message.
///
/// Messages are appended to a conversation in arrival order and never
/// reordered; ids are unique within one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub author: ContactInfo,
    pub contents: String,
    pub timestamp: DateTime<Utc>,
    pub flags: MessageFlags,
    pub error: Option<Error>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        author: ContactInfo,
        contents: impl Into<String>,
        timestamp: DateTime<Utc>,
        flags: MessageFlags,
    ) -> Self {
        Self {
            id: id.into(),
            author,
            contents: contents.into(),
            timestamp,
            flags,
            error: None,
        }
    }

    pub fn outgoing(id: impl Into<String>, author: ContactInfo, contents: impl Into<String>) -> Self {
        Self::new(
            id,
            author,
            contents,
            Utc::now(),
            MessageFlags {
                send: true,
                ..Default::default()
            },
        )
    }

    pub fn incoming(id: impl Into<String>, author: ContactInfo, contents: impl Into<String>) -> Self {
        Self::new(
            id,
            author,
            contents,
            Utc::now(),
            MessageFlags {
                recv: true,
                ..Default::default()
            },
        )
    }

    pub fn system(id: impl Into<String>, author: ContactInfo, contents: impl Into<String>) -> Self {
        Self::new(
            id,
            author,
            contents,
            Utc::now(),
            MessageFlags {
                system: true,
                ..Default::default()
            },
        )
    }

    pub fn with_error(mut self, error: Error) -> Self {
        self.flags.error = true;
        self.error = Some(error);
        self
    }
}
