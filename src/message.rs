use std::fmt;
use std::ops::{Deref, DerefMut};

/// What a [`Message`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Media data, i.e. RTP.
    Binary,
    /// Control data, i.e. RTCP.
    Control,
}

/// An owned buffer tagged with its kind.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    data: Vec<u8>,
}

impl Message {
    /// Create a new message.
    pub fn new(kind: MessageKind, data: Vec<u8>) -> Self {
        Message { kind, data }
    }

    /// A media data message.
    pub fn binary(data: Vec<u8>) -> Self {
        Message::new(MessageKind::Binary, data)
    }

    /// A control message.
    pub fn control(data: Vec<u8>) -> Self {
        Message::new(MessageKind::Control, data)
    }

    /// The kind of message.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Shorthand for `kind() == MessageKind::Control`.
    pub fn is_control(&self) -> bool {
        self.kind == MessageKind::Control
    }

    /// Append bytes to the end of the message.
    pub fn extend_from_slice(&mut self, other: &[u8]) {
        self.data.extend_from_slice(other);
    }

    /// Take the underlying buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Deref for Message {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for Message {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("kind", &self.kind)
            .field("len", &self.data.len())
            .finish()
    }
}
