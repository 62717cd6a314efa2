//! The message bus: one routing pass per tick.
//!
//! The bus never holds agent references — delivery goes through the narrow
//! [`Directory`] trait the world implements.  This keeps ownership acyclic:
//! the world owns agents; the bus borrows the directory for the duration of
//! one routing pass.

use rustc_hash::FxHashMap;

use mats_core::{AgentId, Point};

use crate::message::{Message, Performative, Recipient};

/// Default spatial broadcast radius in metres.
pub const DEFAULT_BROADCAST_RADIUS: f32 = 500.0;

/// What happened to a delivery attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// No agent with that id (or it left the simulation).  Best-effort
    /// delivery drops the message silently.
    UnknownRecipient,
}

/// The world surface the bus routes against.
pub trait Directory {
    /// Position of an agent, `None` if the agent is unknown or positionless.
    fn position_of(&self, id: AgentId) -> Option<Point>;

    /// Push a message into an agent's inbox.
    fn deliver(&mut self, id: AgentId, message: Message) -> DeliveryOutcome;

    /// Ids of all agents eligible to receive broadcasts, in id order.
    fn broadcast_targets(&self) -> Vec<AgentId>;
}

/// Cumulative bus counters, exposed for the observability surface.
#[derive(Clone, Debug, Default)]
pub struct BusStats {
    pub total_messages: u64,
    /// Indexed by `Performative::index()`.
    pub by_performative: [u64; Performative::ALL.len()],
    /// Unicasts to unknown receivers.
    pub dropped: u64,
    /// Broadcast fan-out: individual deliveries made for broadcast messages.
    pub broadcast_deliveries: u64,
}

impl BusStats {
    /// Per-performative counts as (name, count) pairs, zeros omitted.
    pub fn by_performative_named(&self) -> FxHashMap<&'static str, u64> {
        Performative::ALL
            .iter()
            .filter(|p| self.by_performative[p.index()] > 0)
            .map(|p| (p.as_str(), self.by_performative[p.index()]))
            .collect()
    }
}

/// Routes outbound messages into inboxes.
pub struct MessageBus {
    pub broadcast_radius: f32,
    stats: BusStats,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_radius(DEFAULT_BROADCAST_RADIUS)
    }

    pub fn with_radius(broadcast_radius: f32) -> Self {
        Self { broadcast_radius, stats: BusStats::default() }
    }

    #[inline]
    pub fn stats(&self) -> &BusStats {
        &self.stats
    }

    /// Route one message.  Unicast goes to the named agent; broadcast goes to
    /// every positioned agent within [`Self::broadcast_radius`] of the
    /// sender, excluding the sender itself.
    pub fn route<D: Directory>(&mut self, directory: &mut D, message: Message) {
        self.stats.total_messages += 1;
        self.stats.by_performative[message.performative.index()] += 1;

        match message.recipient {
            Recipient::Agent(id) => {
                if directory.deliver(id, message) == DeliveryOutcome::UnknownRecipient {
                    self.stats.dropped += 1;
                }
            }
            Recipient::Broadcast => self.broadcast(directory, message),
        }
    }

    fn broadcast<D: Directory>(&mut self, directory: &mut D, message: Message) {
        let Some(origin) = directory.position_of(message.sender) else {
            // A positionless sender has no broadcast neighborhood.
            self.stats.dropped += 1;
            return;
        };

        for id in directory.broadcast_targets() {
            if id == message.sender {
                continue;
            }
            let Some(pos) = directory.position_of(id) else { continue };
            if origin.distance(pos) <= self.broadcast_radius
                && directory.deliver(id, message.clone()) == DeliveryOutcome::Delivered
            {
                self.stats.broadcast_deliveries += 1;
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
