//! Unit tests for mats-bdi.

#[cfg(test)]
mod helpers {
    use mats_core::{config::RoutingAlgorithm, AgentId, Point, SimRng};
    use mats_routing::{DynamicRouter, RoadGraph};

    use mats_acl::Message;

    use crate::{BdiAgent, BdiState, Intention, IntentionKind, TickCtx, WorldView};

    /// Owns everything a `TickCtx` borrows.
    pub struct CtxHarness {
        pub view: WorldView,
        pub graph: RoadGraph,
        pub router: DynamicRouter,
        pub rng: SimRng,
    }

    impl CtxHarness {
        pub fn new() -> Self {
            Self {
                view: WorldView::default(),
                graph: RoadGraph::new(),
                router: DynamicRouter::new(RoutingAlgorithm::AStar),
                rng: SimRng::new(1),
            }
        }

        pub fn ctx(&mut self, now: f64) -> TickCtx<'_> {
            TickCtx {
                now,
                time_step: 1.0,
                view: &self.view,
                graph: &self.graph,
                router: &mut self.router,
                rng: &mut self.rng,
            }
        }
    }

    /// An agent that counts phase invocations and always emits one `Stop`
    /// intention whose execution succeeds or fails on command.
    pub struct StubAgent {
        pub state: BdiState,
        pub succeed: bool,
        pub perceives: u32,
        pub desires_generated: u32,
        pub executed: u32,
        pub messages_seen: Vec<Message>,
    }

    impl StubAgent {
        pub fn new(id: u32) -> Self {
            Self {
                state: BdiState::new(AgentId(id), 0.0),
                succeed: true,
                perceives: 0,
                desires_generated: 0,
                executed: 0,
                messages_seen: Vec::new(),
            }
        }
    }

    impl BdiAgent for StubAgent {
        fn state(&self) -> &BdiState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut BdiState {
            &mut self.state
        }

        fn position(&self) -> Point {
            Point::new(0.0, 0.0)
        }

        fn perceive(&mut self, _ctx: &mut TickCtx<'_>) {
            self.perceives += 1;
        }

        fn generate_desires(&mut self) {
            self.desires_generated += 1;
        }

        fn deliberate(&mut self, _ctx: &mut TickCtx<'_>) -> Vec<Intention> {
            vec![Intention::new(IntentionKind::Stop, 1.0)]
        }

        fn execute(&mut self, _intention: &Intention, _ctx: &mut TickCtx<'_>) -> bool {
            self.executed += 1;
            self.succeed
        }

        fn handle_message(&mut self, message: Message, _ctx: &mut TickCtx<'_>) {
            self.messages_seen.push(message);
        }
    }
}

#[cfg(test)]
mod beliefs {
    use mats_core::Point;

    use crate::{BeliefKind, BeliefSource, BeliefStore, BeliefValue, DEFAULT_VALIDITY_WINDOW};

    #[test]
    fn update_replaces_same_kind() {
        let mut store = BeliefStore::new();
        store.update(BeliefValue::Speed(3.0), 0.0, BeliefSource::Own);
        store.update(BeliefValue::Speed(5.0), 1.0, BeliefSource::Own);
        assert_eq!(store.len(), 1);
        assert_eq!(store.value(BeliefKind::Speed), Some(&BeliefValue::Speed(5.0)));
    }

    #[test]
    fn stale_beliefs_are_dropped() {
        let mut store = BeliefStore::new();
        store.update(BeliefValue::Position(Point::new(0.0, 0.0)), 0.0, BeliefSource::Own);
        store.update(BeliefValue::Speed(2.0), 8.0, BeliefSource::Own);

        // At t=10 the position belief is exactly window-old: gone.
        store.remove_stale(10.0, DEFAULT_VALIDITY_WINDOW);
        assert!(store.value(BeliefKind::Position).is_none());
        assert!(store.value(BeliefKind::Speed).is_some());
    }

    #[test]
    fn confidence_clamped() {
        let mut store = BeliefStore::new();
        store.update_with_confidence(BeliefValue::Speed(1.0), 3.0, 0.0, BeliefSource::Own);
        assert_eq!(store.get(BeliefKind::Speed).unwrap().confidence, 1.0);
    }
}

#[cfg(test)]
mod desires {
    use crate::{Desire, DesireKind, DesireSet};

    #[test]
    fn sorted_descending_after_filter() {
        let mut set = DesireSet::new();
        set.add(Desire::new(DesireKind::OptimizeFlow, 0.5));
        set.add(Desire::new(DesireKind::ReachDestination, 1.0));
        set.add(Desire::new(DesireKind::AvoidCongestion, 0.7));
        set.filter_and_sort();
        let priorities: Vec<f32> = set.iter().map(|d| d.priority).collect();
        assert_eq!(priorities, vec![1.0, 0.7, 0.5]);
        assert_eq!(set.top().unwrap().kind, DesireKind::ReachDestination);
    }

    #[test]
    fn duplicate_kind_ignored() {
        let mut set = DesireSet::new();
        set.add(Desire::new(DesireKind::OptimizeFlow, 0.5));
        set.add(Desire::new(DesireKind::OptimizeFlow, 0.9));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn satisfied_desires_filtered() {
        let mut set = DesireSet::new();
        let mut done = Desire::new(DesireKind::ReachDestination, 1.0);
        done.satisfied = true;
        set.add(done);
        set.add(Desire::new(DesireKind::OptimizeFlow, 0.5));
        set.filter_and_sort();
        assert_eq!(set.len(), 1);
        assert!(!set.contains(DesireKind::ReachDestination));
    }
}

#[cfg(test)]
mod cycle {
    use mats_acl::{Content, Performative, Recipient};
    use mats_core::AgentId;

    use super::helpers::{CtxHarness, StubAgent};
    use crate::{run_cycle, BdiAgent};

    #[test]
    fn phases_run_in_order_and_intentions_purge() {
        let mut harness = CtxHarness::new();
        let mut agent = StubAgent::new(0);
        run_cycle(&mut agent, &mut harness.ctx(0.0));

        assert_eq!(agent.perceives, 1);
        assert_eq!(agent.desires_generated, 1);
        assert_eq!(agent.executed, 1);
        // Completed intention purged at tick end.
        assert!(agent.state.intentions.is_empty());
        assert_eq!(agent.state.history.len(), 1);
        assert!(agent.state.history[0].success);
        // Local clock advanced by time_step.
        assert_eq!(agent.state.current_time, 1.0);
    }

    #[test]
    fn failed_intentions_purge_too() {
        let mut harness = CtxHarness::new();
        let mut agent = StubAgent::new(0);
        agent.succeed = false;
        run_cycle(&mut agent, &mut harness.ctx(0.0));
        assert!(agent.state.intentions.is_empty());
        assert!(!agent.state.history[0].success);
    }

    #[test]
    fn inactive_agents_are_skipped() {
        let mut harness = CtxHarness::new();
        let mut agent = StubAgent::new(0);
        agent.state.active = false;
        run_cycle(&mut agent, &mut harness.ctx(0.0));
        assert_eq!(agent.perceives, 0);
        assert_eq!(agent.state.current_time, 0.0);
    }

    #[test]
    fn inbox_drained_through_handle_message() {
        let mut harness = CtxHarness::new();
        let mut agent = StubAgent::new(0);

        let mut peer = StubAgent::new(1);
        let msg = peer.state.draft(
            Recipient::Agent(AgentId(0)),
            Performative::Inform,
            Content::Opaque,
        );
        agent.state.mailbox.accept(msg);

        run_cycle(&mut agent, &mut harness.ctx(0.0));
        assert_eq!(agent.messages_seen.len(), 1);
        assert_eq!(agent.state.mailbox.inbox_len(), 0);
    }

    #[test]
    fn draft_and_reply_identities() {
        let mut a = StubAgent::new(1);
        let mut b = StubAgent::new(2);
        let request = a.state.draft(
            Recipient::Agent(b.id()),
            Performative::Request,
            Content::Opaque,
        );
        let reply = b.state.reply(&request, Performative::Agree, Content::Opaque);
        assert_eq!(reply.reply_to, Some(request.message_id));
        assert_eq!(reply.sender, b.id());
        assert_eq!(reply.recipient, Recipient::Agent(a.id()));
    }
}

#[cfg(test)]
mod history {
    use crate::agent::ACTION_HISTORY_CAP;
    use super::helpers::StubAgent;

    #[test]
    fn ring_is_bounded() {
        let mut agent = StubAgent::new(0);
        for i in 0..(ACTION_HISTORY_CAP + 10) {
            agent.state.record_action(i as f64, "stop", true);
        }
        assert_eq!(agent.state.history.len(), ACTION_HISTORY_CAP);
        // Oldest entries were dropped.
        assert_eq!(agent.state.history.front().unwrap().time, 10.0);
    }
}
