//! Core module - waitlist state and command routing.
//!
//! This module contains the heart of QueueBot's message processing:
//! - In-memory participant queue
//! - Command classification and authorization
//! - Opening-hours gate
//! - Reply variants and rendering

pub mod command;
pub mod queue;
pub mod reply;
pub mod router;
pub mod transport;
pub mod window;

pub use command::Command;
pub use queue::{Participant, ParticipantId, QueueStore};
pub use reply::Reply;
pub use router::{AdminSet, CommandRouter, InboundEvent, MessageBody, Notice, Routed};
pub use transport::Transport;
pub use window::{Clock, FixedClock, SystemClock, TimeWindow, WindowState};
