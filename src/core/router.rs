//! Command routing for QueueBot.
//!
//! One inbound event goes through a fixed pipeline:
//! - classify (non-text, non-command)
//! - `/start`, `/help` for everyone
//! - admin-only commands, for admins only
//! - `/howlong` for everyone
//! - opening-hours gate, then `/join` / `/leave`
//! - anything left is an invalid command
//!
//! Admins fall through to the user commands, so an operator can also
//! queue up. Non-admins sending an admin command get the same reply as any
//! unknown command.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::command::Command;
use super::queue::{
    BumpOutcome, JoinOutcome, LeaveOutcome, Participant, ParticipantId, PopOutcome, QueueStore,
};
use super::reply::{broadcast_message, your_turn_message, Reply};
use super::transport::Transport;
use super::window::{Clock, TimeWindow, WindowState};

/// Payload of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    /// Photos, stickers, documents... carries the transport's kind name.
    Unsupported(String),
}

/// One message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: ParticipantId,
    pub label: Option<String>,
    pub body: MessageBody,
}

impl InboundEvent {
    pub fn text(sender: impl Into<ParticipantId>, label: Option<&str>, text: &str) -> Self {
        Self {
            sender: sender.into(),
            label: label.map(str::to_string),
            body: MessageBody::Text(text.to_string()),
        }
    }
}

/// Operator identities, fixed at startup.
///
/// Keys are handles kept for contact and debugging; membership is decided
/// by the chat id values.
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    contacts: HashMap<String, ParticipantId>,
    ids: HashSet<ParticipantId>,
}

impl AdminSet {
    pub fn new(contacts: HashMap<String, ParticipantId>) -> Self {
        let ids = contacts.values().copied().collect();
        Self { contacts, ids }
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.ids.contains(&id)
    }

    pub fn contacts(&self) -> &HashMap<String, ParticipantId> {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// An extra message to someone other than the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub recipient: ParticipantId,
    pub text: String,
}

/// Everything one event produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub reply: Reply,
    pub notices: Vec<Notice>,
}

impl From<Reply> for Routed {
    fn from(reply: Reply) -> Self {
        Self {
            reply,
            notices: Vec::new(),
        }
    }
}

/// Who `/bump <target>` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BumpTarget {
    /// A 1-based position or a raw chat id; whichever matches first in line.
    Number(i64),
    /// A handle or display label, `@` optional, case-insensitive.
    Label(String),
}

impl BumpTarget {
    fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => BumpTarget::Number(n),
            Err(_) => BumpTarget::Label(raw.trim_start_matches('@').to_string()),
        }
    }

    fn matches(&self, position: usize, participant: &Participant) -> bool {
        match self {
            BumpTarget::Number(n) => {
                usize::try_from(*n).map_or(false, |n| n == position) || participant.id.0 == *n
            }
            BumpTarget::Label(label) => participant.label.as_deref().map_or(false, |l| {
                l.trim_start_matches('@').eq_ignore_ascii_case(label)
            }),
        }
    }
}

/// Maps inbound events onto queue operations.
pub struct CommandRouter {
    store: Arc<QueueStore>,
    admins: AdminSet,
    window: TimeWindow,
    clock: Arc<dyn Clock>,
    maintenance: Option<Maintenance>,
}

#[derive(Debug, Clone)]
struct Maintenance {
    debug_chat: Option<ParticipantId>,
}

impl CommandRouter {
    pub fn new(
        store: Arc<QueueStore>,
        admins: AdminSet,
        window: TimeWindow,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            admins,
            window,
            clock,
            maintenance: None,
        }
    }

    /// Answer every event with a maintenance notice and forward a summary
    /// of it to `debug_chat`.
    pub fn with_maintenance(mut self, debug_chat: Option<ParticipantId>) -> Self {
        self.maintenance = Some(Maintenance { debug_chat });
        self
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn is_admin(&self, id: ParticipantId) -> bool {
        self.admins.contains(id)
    }

    /// Decide the reply and any notices for one event.
    ///
    /// Pure with respect to I/O: the queue lock is only held inside the
    /// individual store calls.
    pub fn route(&self, event: &InboundEvent) -> Routed {
        if let Some(maintenance) = &self.maintenance {
            tracing::warn!("Maintenance mode active, deferring event from {}", event.sender);
            let notices = maintenance
                .debug_chat
                .map(|chat| Notice {
                    recipient: chat,
                    text: format!("{:?}", event),
                })
                .into_iter()
                .collect();
            return Routed {
                reply: Reply::UnderMaintenance,
                notices,
            };
        }

        let text = match &event.body {
            MessageBody::Text(text) => text,
            MessageBody::Unsupported(kind) => {
                tracing::info!("Message of unsupported format ({}) received", kind);
                return Reply::UnsupportedFormat.into();
            }
        };

        let Some(command) = Command::parse(text) else {
            tracing::info!("No command detected");
            return Reply::NoCommand.into();
        };

        let is_admin = self.admins.contains(event.sender);
        let routed: Routed = match &command {
            Command::Start => Reply::Start.into(),
            Command::Help => Reply::Help.into(),
            cmd if cmd.is_admin_only() && is_admin => self.run_admin(cmd, event.sender),
            Command::HowLong => match self.store.position_of(event.sender) {
                Some(pos) => Reply::Position(pos).into(),
                None => Reply::NotInQueue.into(),
            },
            cmd if cmd.is_time_gated() => match self.window.state(self.clock.now()) {
                WindowState::NotYetOpen(start) => Reply::QueueNotYetOpen(start).into(),
                WindowState::Closed(end) => Reply::QueueClosed(end).into(),
                WindowState::Open => self.run_user(cmd, event),
            },
            _ => Reply::InvalidCommand.into(),
        };

        tracing::info!(
            "{} command processed ({}{})",
            command.name(),
            routed.reply.kind(),
            if is_admin { ", admin" } else { "" }
        );
        routed
    }

    fn run_user(&self, command: &Command, event: &InboundEvent) -> Routed {
        match command {
            Command::Join => match self.store.join(event.sender, event.label.clone()) {
                JoinOutcome::Added(pos) => Reply::Joined(pos),
                JoinOutcome::AlreadyPresent(pos) => Reply::AlreadyInQueue(pos),
            },
            Command::Leave => match self.store.leave(event.sender) {
                LeaveOutcome::Removed => Reply::Left,
                LeaveOutcome::NotFound => Reply::NotInQueue,
            },
            _ => Reply::InvalidCommand,
        }
        .into()
    }

    fn run_admin(&self, command: &Command, sender: ParticipantId) -> Routed {
        match command {
            Command::ViewQueue => Reply::QueueView(self.store.snapshot()).into(),
            Command::Next => match self.store.pop_front() {
                PopOutcome::Popped {
                    participant,
                    remaining,
                } => Routed {
                    notices: vec![Notice {
                        recipient: participant.id,
                        text: your_turn_message().to_string(),
                    }],
                    reply: Reply::Served {
                        participant,
                        remaining,
                    },
                },
                PopOutcome::Empty => Reply::QueueEmpty.into(),
            },
            Command::Bump(None) => Reply::BumpUsage.into(),
            Command::Bump(Some(raw)) => {
                let target = BumpTarget::parse(raw);
                match self.store.bump_where(|pos, p| target.matches(pos, p)) {
                    BumpOutcome::Moved { participant, from } => {
                        Reply::Bumped { participant, from }.into()
                    }
                    BumpOutcome::NotFound => Reply::BumpNotFound(raw.clone()).into(),
                }
            }
            Command::Purge => Reply::Purged(self.store.purge()).into(),
            Command::Broadcast(text) if text.trim().is_empty() => Reply::BroadcastUsage.into(),
            Command::Broadcast(text) => {
                let body = broadcast_message(text);
                let notices: Vec<Notice> = self
                    .store
                    .snapshot()
                    .into_iter()
                    .filter(|p| p.id != sender)
                    .map(|p| Notice {
                        recipient: p.id,
                        text: body.clone(),
                    })
                    .collect();
                Routed {
                    reply: Reply::BroadcastSent(notices.len()),
                    notices,
                }
            }
            _ => Reply::InvalidCommand.into(),
        }
    }

    /// Route `event` and deliver the result.
    ///
    /// Notices go out first, one at a time; a failed send is logged and the
    /// rest continue. The sender's reply is sent last and returned.
    pub async fn dispatch(&self, event: &InboundEvent, transport: &dyn Transport) -> Reply {
        let Routed { reply, notices } = self.route(event);

        let mut failed = 0usize;
        for notice in &notices {
            if let Err(e) = transport.send_message(notice.recipient, &notice.text).await {
                failed += 1;
                tracing::warn!("Failed to notify {}: {}", notice.recipient, e);
            }
        }
        if failed > 0 {
            tracing::warn!("{} of {} notices could not be delivered", failed, notices.len());
        }

        if let Err(e) = transport.send_message(event.sender, &reply.to_string()).await {
            tracing::warn!("Failed to reply to {}: {}", event.sender, e);
        }

        reply
    }
}
