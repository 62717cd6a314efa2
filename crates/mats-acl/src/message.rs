//! FIPA-style message value type.
//!
//! A [`Message`] is immutable after creation.  Content is a closed tagged
//! union ([`Content`]) rather than a free-form map: handlers match on the
//! tag, and anything outside the known vocabulary travels as
//! [`Content::Opaque`] and is counted-but-ignored by receivers.

use mats_core::{AgentId, ConversationId, Direction, MessageId, Phase, Point, VehicleType};

// ── Performative ──────────────────────────────────────────────────────────────

/// The illocutionary tag of a message — what kind of speech act it performs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Performative {
    Inform,
    QueryRef,
    Request,
    Propose,
    AcceptProposal,
    RejectProposal,
    Agree,
    Refuse,
    Failure,
}

impl Performative {
    pub const ALL: [Performative; 9] = [
        Performative::Inform,
        Performative::QueryRef,
        Performative::Request,
        Performative::Propose,
        Performative::AcceptProposal,
        Performative::RejectProposal,
        Performative::Agree,
        Performative::Refuse,
        Performative::Failure,
    ];

    /// Dense index for per-performative counter arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Performative::Inform => 0,
            Performative::QueryRef => 1,
            Performative::Request => 2,
            Performative::Propose => 3,
            Performative::AcceptProposal => 4,
            Performative::RejectProposal => 5,
            Performative::Agree => 6,
            Performative::Refuse => 7,
            Performative::Failure => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Performative::Inform => "inform",
            Performative::QueryRef => "query-ref",
            Performative::Request => "request",
            Performative::Propose => "propose",
            Performative::AcceptProposal => "accept-proposal",
            Performative::RejectProposal => "reject-proposal",
            Performative::Agree => "agree",
            Performative::Refuse => "refuse",
            Performative::Failure => "failure",
        }
    }
}

// ── Protocol ──────────────────────────────────────────────────────────────────

/// Interaction protocol a message takes part in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    FipaRequest,
    FipaQuery,
    FipaContractNet,
    GreenWaveCoordination,
    TrafficManagement,
    EmergencyManagement,
    IncidentManagement,
}

// ── Content ───────────────────────────────────────────────────────────────────

/// Severity grade of a reported incident.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Structured message payloads.  One variant per known content type, plus an
/// opaque fallback for payloads the core does not interpret.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    /// Periodic state snapshot an intersection shares with its neighbors for
    /// green-wave coordination.
    NeighborState {
        phase: Phase,
        /// Seconds until the sender's current green phase is due to end.
        phase_timer_remaining: f32,
        /// Queue length per direction, indexed by `Direction::index()`.
        queue_lengths: [u32; 4],
        /// Vehicles expected to leave the sender before its phase ends.
        outflow_estimate: f32,
        position: Point,
        /// Sender-side simulated seconds at snapshot time.
        timestamp: f64,
    },

    /// An intersection warning nearby agents of congestion at its location.
    Congestion { level: f32, location: Point },

    /// A scenario or agent reporting a blocking incident.
    IncidentReport { location: Point, severity: Severity, road: String },

    /// Crisis manager asking an intersection to clear the path of an
    /// emergency vehicle.
    EmergencyPriority { vehicle: AgentId, vehicle_type: VehicleType, position: Point },

    /// Intersection confirming an emergency pre-emption took effect.
    EmergencyAck { green_direction: Direction, intersection: AgentId },

    /// Contract-Net call for proposals: take over priority handling around a
    /// congested intersection.
    CallForProposals {
        congested_intersection: AgentId,
        congestion_level: f32,
        /// The congested intersection's worst approach.
        direction: Direction,
    },

    /// Contract-Net bid from a candidate contractor.
    Proposal { availability: f32, current_load: u32, position: Point },

    /// Contract-Net award payload carried by `accept-proposal`.
    Award { direction: Direction },

    /// Anything the core does not interpret.  Receivers count and ignore it.
    Opaque,
}

// ── Recipient ─────────────────────────────────────────────────────────────────

/// Message addressing: a single agent or a spatial broadcast.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Recipient {
    Agent(AgentId),
    /// Delivered to every agent with a known position within the bus's
    /// broadcast radius of the sender.
    Broadcast,
}

// ── Message ───────────────────────────────────────────────────────────────────

/// An immutable agent message.
#[derive(Clone, Debug)]
pub struct Message {
    pub sender: AgentId,
    pub recipient: Recipient,
    pub performative: Performative,
    pub content: Content,
    pub protocol: Option<Protocol>,
    pub conversation_id: Option<ConversationId>,
    /// The `message_id` this message replies to, if any.
    pub reply_to: Option<MessageId>,
    /// Deadline (simulated seconds) by which a reply is expected, if any.
    pub reply_by: Option<f64>,
    /// Simulated seconds at creation.
    pub timestamp: f64,
    pub message_id: MessageId,
}

impl Message {
    /// Create a message.  `message_id` comes from the sender's mailbox
    /// sequence so ids stay unique and deterministic.
    pub fn new(
        message_id: MessageId,
        sender: AgentId,
        recipient: Recipient,
        performative: Performative,
        content: Content,
        timestamp: f64,
    ) -> Self {
        Self {
            sender,
            recipient,
            performative,
            content,
            protocol: None,
            conversation_id: None,
            reply_to: None,
            reply_by: None,
            timestamp,
            message_id,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_conversation(mut self, conversation: ConversationId) -> Self {
        self.conversation_id = Some(conversation);
        self
    }

    pub fn with_reply_to(mut self, original: MessageId) -> Self {
        self.reply_to = Some(original);
        self
    }

    pub fn with_reply_by(mut self, deadline: f64) -> Self {
        self.reply_by = Some(deadline);
        self
    }

    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.recipient == Recipient::Broadcast
    }

    /// Build a reply: sender and receiver swapped, `reply_to` pointing at
    /// this message, protocol and conversation carried over.
    ///
    /// Replying to a broadcast addresses the original sender.
    pub fn create_reply(
        &self,
        message_id: MessageId,
        performative: Performative,
        content: Content,
        timestamp: f64,
    ) -> Message {
        let sender = match self.recipient {
            Recipient::Agent(id) => id,
            // The replier's own id is the message_id's sender half.
            Recipient::Broadcast => message_id.sender(),
        };
        Message {
            sender,
            recipient: Recipient::Agent(self.sender),
            performative,
            content,
            protocol: self.protocol,
            conversation_id: self.conversation_id,
            reply_to: Some(self.message_id),
            reply_by: None,
            timestamp,
            message_id,
        }
    }
}
