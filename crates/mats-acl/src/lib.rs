//! `mats-acl` — agent communication for the `rust_mats` traffic simulator.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`message`] | `Performative`, `Protocol`, `Content`, `Recipient`, `Message` |
//! | [`mailbox`] | `Mailbox` — bounded inbox + outbox per agent                  |
//! | [`bus`]     | `MessageBus`, the `Directory` delivery seam, counters         |
//!
//! # Delivery model
//!
//! Agents only ever write to their own outbox.  Once per tick, after every
//! agent has stepped, the scheduler drains outboxes in activation order and
//! hands each message to [`bus::MessageBus::route`].  The bus is the sole
//! writer of inboxes.  Messages emitted at tick T are therefore observed by
//! `perceive` at tick T+1, and FIFO order is preserved within one sender's
//! outbox.

pub mod bus;
pub mod mailbox;
pub mod message;


pub use bus::{BusStats, DeliveryOutcome, Directory, MessageBus};
pub use mailbox::Mailbox;
pub use message::{Content, Message, Performative, Protocol, Recipient, Severity};
