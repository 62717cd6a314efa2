//! Per-agent message queues.
//!
//! The inbox is bounded: when full, the oldest entry is evicted to admit the
//! new one, and the eviction is counted.  The outbox is unbounded — it is
//! drained by the scheduler every tick, so it never accumulates more than one
//! tick's worth of traffic.

use std::collections::VecDeque;

use mats_core::{AgentId, MessageId};

use crate::message::Message;

/// Default inbox capacity.
pub const DEFAULT_INBOX_CAPACITY: usize = 1_000;

/// One agent's inbox, outbox, and message-id sequence.
pub struct Mailbox {
    owner: AgentId,
    inbox: VecDeque<Message>,
    outbox: Vec<Message>,
    capacity: usize,
    /// Next outgoing message sequence number.
    seq: u32,
    /// Inbox entries discarded because the box was full.
    pub evictions: u64,
    /// Total messages this agent has sent.
    pub sent: u64,
}

impl Mailbox {
    pub fn new(owner: AgentId) -> Self {
        Self::with_capacity(owner, DEFAULT_INBOX_CAPACITY)
    }

    pub fn with_capacity(owner: AgentId, capacity: usize) -> Self {
        Self {
            owner,
            inbox: VecDeque::new(),
            outbox: Vec::new(),
            capacity,
            seq: 0,
            evictions: 0,
            sent: 0,
        }
    }

    #[inline]
    pub fn owner(&self) -> AgentId {
        self.owner
    }

    /// Allocate the next [`MessageId`] for an outgoing message.
    pub fn next_message_id(&mut self) -> MessageId {
        let id = MessageId::compose(self.owner, self.seq);
        self.seq += 1;
        id
    }

    /// Queue a message for the bus to pick up at the end of the tick.
    pub fn post(&mut self, message: Message) {
        self.sent += 1;
        self.outbox.push(message);
    }

    /// Accept an inbound message, evicting the oldest entry if full.
    ///
    /// Only the bus calls this.
    pub fn accept(&mut self, message: Message) {
        if self.inbox.len() >= self.capacity {
            self.inbox.pop_front();
            self.evictions += 1;
        }
        self.inbox.push_back(message);
    }

    /// Remove and return all inbound messages in arrival order.
    pub fn drain_inbox(&mut self) -> Vec<Message> {
        self.inbox.drain(..).collect()
    }

    /// Remove and return all queued outbound messages in post order.
    pub fn drain_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    #[inline]
    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    #[inline]
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
