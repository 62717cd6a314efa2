//! The `BdiAgent` trait and the shared reasoning-cycle driver.

use std::collections::VecDeque;

use mats_acl::{Content, Mailbox, Message, Performative, Recipient};
use mats_core::{AgentId, Point};

use crate::belief::{BeliefStore, DEFAULT_VALIDITY_WINDOW};
use crate::context::TickCtx;
use crate::desire::DesireSet;
use crate::intention::{Intention, IntentionStatus};

/// Executed intentions remembered per agent.
pub const ACTION_HISTORY_CAP: usize = 64;

/// One executed intention, for diagnostics and learning.
#[derive(Clone, Debug)]
pub struct ActionRecord {
    pub time: f64,
    pub action: &'static str,
    pub success: bool,
}

// ── BdiState ──────────────────────────────────────────────────────────────────

/// The mental state every agent kind embeds.
pub struct BdiState {
    pub id: AgentId,
    pub beliefs: BeliefStore,
    pub desires: DesireSet,
    pub intentions: Vec<Intention>,
    pub mailbox: Mailbox,
    /// The agent's own clock, advanced by `time_step` at each cycle end.
    pub current_time: f64,
    pub active: bool,
    /// Ring of the most recent executed intentions.
    pub history: VecDeque<ActionRecord>,
    /// Inbound messages whose content the agent did not interpret.
    pub unhandled_messages: u64,
}

impl BdiState {
    pub fn new(id: AgentId, now: f64) -> Self {
        Self {
            id,
            beliefs: BeliefStore::new(),
            desires: DesireSet::new(),
            intentions: Vec::new(),
            mailbox: Mailbox::new(id),
            current_time: now,
            active: true,
            history: VecDeque::new(),
            unhandled_messages: 0,
        }
    }

    /// Compose an outgoing message with a fresh id and the agent's clock.
    pub fn draft(
        &mut self,
        recipient: Recipient,
        performative: Performative,
        content: Content,
    ) -> Message {
        let id = self.mailbox.next_message_id();
        Message::new(id, self.id, recipient, performative, content, self.current_time)
    }

    /// Compose a reply to `original` with a fresh id.
    pub fn reply(
        &mut self,
        original: &Message,
        performative: Performative,
        content: Content,
    ) -> Message {
        let id = self.mailbox.next_message_id();
        original.create_reply(id, performative, content, self.current_time)
    }

    /// Queue a message for the bus.
    #[inline]
    pub fn post(&mut self, message: Message) {
        self.mailbox.post(message);
    }

    pub fn record_action(&mut self, time: f64, action: &'static str, success: bool) {
        if self.history.len() >= ACTION_HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(ActionRecord { time, action, success });
    }
}

// ── BdiAgent ──────────────────────────────────────────────────────────────────

/// The capability set the cycle driver dispatches on.  The three agent kinds
/// differ only in these bodies.
pub trait BdiAgent {
    fn state(&self) -> &BdiState;
    fn state_mut(&mut self) -> &mut BdiState;

    /// Where the agent is, for spatial broadcast delivery.
    fn position(&self) -> Point;

    /// Refresh beliefs from the world view.  Inbox draining happens in the
    /// driver, after this returns.
    fn perceive(&mut self, ctx: &mut TickCtx<'_>);

    /// Rebuild the desire set from current beliefs.
    fn generate_desires(&mut self);

    /// Commit to new intentions consistent with the top desires.
    fn deliberate(&mut self, ctx: &mut TickCtx<'_>) -> Vec<Intention>;

    /// Run one intention.  Returns `false` on failure; failures stay local —
    /// the driver marks the intention failed and the agent carries on.
    fn execute(&mut self, intention: &Intention, ctx: &mut TickCtx<'_>) -> bool;

    /// React to one inbound message.
    fn handle_message(&mut self, message: Message, ctx: &mut TickCtx<'_>);

    #[inline]
    fn id(&self) -> AgentId {
        self.state().id
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.state().active
    }
}

// ── Cycle driver ──────────────────────────────────────────────────────────────

/// Drive one agent through one reasoning cycle.
///
/// Inactive agents are skipped entirely (their mailbox still accumulates
/// until the bus gives up on them).
pub fn run_cycle<A: BdiAgent + ?Sized>(agent: &mut A, ctx: &mut TickCtx<'_>) {
    if !agent.is_active() {
        return;
    }

    // 1. Perceive: world-derived beliefs, then the inbox, then decay.
    agent.perceive(ctx);
    for message in agent.state_mut().mailbox.drain_inbox() {
        agent.handle_message(message, ctx);
    }
    let now = agent.state().current_time;
    agent.state_mut().beliefs.remove_stale(now, DEFAULT_VALIDITY_WINDOW);

    // 2. Desires.
    agent.generate_desires();
    agent.state_mut().desires.filter_and_sort();

    // 3. Deliberate.
    let new_intentions = agent.deliberate(ctx);
    agent.state_mut().intentions.extend(new_intentions);

    // 4. Execute pending intentions; purge terminal ones.
    let mut intentions = std::mem::take(&mut agent.state_mut().intentions);
    for intention in intentions.iter_mut() {
        if intention.status != IntentionStatus::Pending {
            continue;
        }
        intention.status = IntentionStatus::Executing;
        let ok = agent.execute(intention, ctx);
        intention.status = if ok { IntentionStatus::Completed } else { IntentionStatus::Failed };
        let t = agent.state().current_time;
        agent.state_mut().record_action(t, intention.kind.label(), ok);
    }
    intentions.retain(|i| !i.is_terminal());
    agent.state_mut().intentions = intentions;

    // The agent's clock advances at cycle end.
    agent.state_mut().current_time += ctx.time_step as f64;
}
