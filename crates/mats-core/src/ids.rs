//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into agent/node `Vec`s via `id.0 as usize`, but callers
//! should prefer the `.index()` helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Index of an agent (vehicle, intersection, or crisis manager) in the
    /// world's agent table.  IDs are never reused within a run.
    pub struct AgentId(u32);
}

typed_id! {
    /// Index of a road-network node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Unique message identifier: `(sender agent id) << 32 | per-agent sequence`.
    ///
    /// Allocation is local to the sending agent's mailbox, so no global
    /// counter is needed and IDs are deterministic across runs.
    pub struct MessageId(u64);
}

impl MessageId {
    /// Compose a message ID from the sender and its outgoing sequence number.
    #[inline]
    pub fn compose(sender: AgentId, seq: u32) -> Self {
        MessageId(((sender.0 as u64) << 32) | seq as u64)
    }

    /// The agent that allocated this ID.
    #[inline]
    pub fn sender(self) -> AgentId {
        AgentId((self.0 >> 32) as u32)
    }
}

typed_id! {
    /// Identifier of a Contract-Net conversation.  Allocated by the manager
    /// side with the same sender/sequence scheme as [`MessageId`].
    pub struct ConversationId(u64);
}

impl ConversationId {
    #[inline]
    pub fn compose(manager: AgentId, seq: u32) -> Self {
        ConversationId(((manager.0 as u64) << 32) | seq as u64)
    }
}
