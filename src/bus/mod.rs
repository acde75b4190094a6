//! Service bus - outbound delivery of change events.
//!
//! ```text
//! ┌────────────────┐   emit()   ┌──────────────┐  drain  ┌───────────────────────┐
//! │ upsert action  │ ─────────▶ │ EventOutbox  │ ──────▶ │ EventDispatcherThread │
//! └────────────────┘ (bounded)  └──────────────┘         └──────────┬────────────┘
//!                                                                   │ publish()
//!                                                                   ▼
//!                                           ┌─────────────────────────────────────┐
//!                                           │ Publisher (InMemoryQueue, broker...)│
//!                                           └─────────────────────────────────────┘
//! ```
//!
//! This module holds the bus side: the wire [`Event`], the [`Publisher`] and
//! [`Subscriber`] traits, and an [`InMemoryQueue`] implementing both for
//! tests and single-process deployments.

mod in_memory_queue;
mod publisher;

pub use in_memory_queue::InMemoryQueue;
pub use publisher::{Event, PublishError, Publisher, Subscriber};
