//! `AgentKind` — the sum type the scheduler dispatches on.
//!
//! The three agent kinds differ only in their reasoning bodies, so the world
//! stores one flat `Vec<AgentKind>` and the cycle driver runs against the
//! `BdiAgent` impl below.  No inheritance, no boxing.

use mats_acl::Message;
use mats_bdi::{BdiAgent, BdiState, Intention, TickCtx};
use mats_core::{AgentId, Point};

use crate::crisis::CrisisManagerAgent;
use crate::intersection::IntersectionAgent;
use crate::vehicle::VehicleAgent;

pub enum AgentKind {
    Vehicle(VehicleAgent),
    Intersection(IntersectionAgent),
    Crisis(CrisisManagerAgent),
}

impl AgentKind {
    pub fn as_vehicle(&self) -> Option<&VehicleAgent> {
        match self {
            AgentKind::Vehicle(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vehicle_mut(&mut self) -> Option<&mut VehicleAgent> {
        match self {
            AgentKind::Vehicle(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_intersection(&self) -> Option<&IntersectionAgent> {
        match self {
            AgentKind::Intersection(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_intersection_mut(&mut self) -> Option<&mut IntersectionAgent> {
        match self {
            AgentKind::Intersection(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_crisis(&self) -> Option<&CrisisManagerAgent> {
        match self {
            AgentKind::Crisis(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_crisis_mut(&mut self) -> Option<&mut CrisisManagerAgent> {
        match self {
            AgentKind::Crisis(c) => Some(c),
            _ => None,
        }
    }
}

impl BdiAgent for AgentKind {
    fn state(&self) -> &BdiState {
        match self {
            AgentKind::Vehicle(a) => a.state(),
            AgentKind::Intersection(a) => a.state(),
            AgentKind::Crisis(a) => a.state(),
        }
    }

    fn state_mut(&mut self) -> &mut BdiState {
        match self {
            AgentKind::Vehicle(a) => a.state_mut(),
            AgentKind::Intersection(a) => a.state_mut(),
            AgentKind::Crisis(a) => a.state_mut(),
        }
    }

    fn position(&self) -> Point {
        match self {
            AgentKind::Vehicle(a) => a.position(),
            AgentKind::Intersection(a) => a.position(),
            AgentKind::Crisis(a) => a.position(),
        }
    }

    fn perceive(&mut self, ctx: &mut TickCtx<'_>) {
        match self {
            AgentKind::Vehicle(a) => a.perceive(ctx),
            AgentKind::Intersection(a) => a.perceive(ctx),
            AgentKind::Crisis(a) => a.perceive(ctx),
        }
    }

    fn generate_desires(&mut self) {
        match self {
            AgentKind::Vehicle(a) => a.generate_desires(),
            AgentKind::Intersection(a) => a.generate_desires(),
            AgentKind::Crisis(a) => a.generate_desires(),
        }
    }

    fn deliberate(&mut self, ctx: &mut TickCtx<'_>) -> Vec<Intention> {
        match self {
            AgentKind::Vehicle(a) => a.deliberate(ctx),
            AgentKind::Intersection(a) => a.deliberate(ctx),
            AgentKind::Crisis(a) => a.deliberate(ctx),
        }
    }

    fn execute(&mut self, intention: &Intention, ctx: &mut TickCtx<'_>) -> bool {
        match self {
            AgentKind::Vehicle(a) => a.execute(intention, ctx),
            AgentKind::Intersection(a) => a.execute(intention, ctx),
            AgentKind::Crisis(a) => a.execute(intention, ctx),
        }
    }

    fn handle_message(&mut self, message: Message, ctx: &mut TickCtx<'_>) {
        match self {
            AgentKind::Vehicle(a) => a.handle_message(message, ctx),
            AgentKind::Intersection(a) => a.handle_message(message, ctx),
            AgentKind::Crisis(a) => a.handle_message(message, ctx),
        }
    }

    fn id(&self) -> AgentId {
        self.state().id
    }
}
