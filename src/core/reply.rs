//! Outbound replies.
//!
//! Each router outcome is a distinct [`Reply`] variant; [`Reply::kind`] is a
//! stable tag and `Display` renders the plain-text message.

use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt;

use super::queue::Participant;
use super::window::format_instant;

pub const START_MESSAGE: &str = "Welcome to the queue bot!\n\n\
Send /join to get a place in line, /howlong to check how many people are \
ahead of you, and /leave if you no longer need to wait. Send /help to see \
every command.";

pub const HELP_MESSAGE: &str = "Commands:\n\n\
/join - Join the queue\n\
/leave - Leave the queue\n\
/howlong - Check your position in the queue\n\
/help - Show this help";

pub const NO_COMMAND_MESSAGE: &str =
    "I only understand commands. Send /help to see what you can do.";

pub const INVALID_COMMAND_MESSAGE: &str =
    "Sorry, that is not a valid command. Send /help to see what you can do.";

pub const INVALID_FORMAT_MESSAGE: &str =
    "Sorry, I can only read text messages. Send /help to see what you can do.";

pub const UNDER_MAINTENANCE_MESSAGE: &str =
    "The queue bot is under maintenance. Please try again later.";

pub const QUEUE_UNOPENED_MESSAGE: &str = "The queue has not opened yet. It opens at ";

pub const QUEUE_CLOSED_MESSAGE: &str = "The queue is closed. It closed at ";

/// What the router answers the sender with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    UnsupportedFormat,
    NoCommand,
    InvalidCommand,
    UnderMaintenance,
    Start,
    Help,
    /// `/howlong` for a queued sender.
    Position(usize),
    /// `/howlong` or `/leave` from someone not in line.
    NotInQueue,
    QueueNotYetOpen(DateTime<Tz>),
    QueueClosed(DateTime<Tz>),
    Joined(usize),
    AlreadyInQueue(usize),
    Left,
    QueueView(Vec<Participant>),
    Served {
        participant: Participant,
        remaining: usize,
    },
    QueueEmpty,
    Bumped {
        participant: Participant,
        from: usize,
    },
    BumpNotFound(String),
    BumpUsage,
    Purged(usize),
    BroadcastSent(usize),
    BroadcastUsage,
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::UnsupportedFormat => "unsupported_format",
            Reply::NoCommand => "no_command",
            Reply::InvalidCommand => "invalid_command",
            Reply::UnderMaintenance => "under_maintenance",
            Reply::Start => "start",
            Reply::Help => "help",
            Reply::Position(_) => "position",
            Reply::NotInQueue => "not_in_queue",
            Reply::QueueNotYetOpen(_) => "queue_not_yet_open",
            Reply::QueueClosed(_) => "queue_closed",
            Reply::Joined(_) => "joined",
            Reply::AlreadyInQueue(_) => "already_in_queue",
            Reply::Left => "left",
            Reply::QueueView(_) => "queue_view",
            Reply::Served { .. } => "served",
            Reply::QueueEmpty => "queue_empty",
            Reply::Bumped { .. } => "bumped",
            Reply::BumpNotFound(_) => "bump_not_found",
            Reply::BumpUsage => "bump_usage",
            Reply::Purged(_) => "purged",
            Reply::BroadcastSent(_) => "broadcast_sent",
            Reply::BroadcastUsage => "broadcast_usage",
        }
    }
}

fn people(n: usize) -> &'static str {
    if n == 1 {
        "person"
    } else {
        "people"
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::UnsupportedFormat => f.write_str(INVALID_FORMAT_MESSAGE),
            Reply::NoCommand => f.write_str(NO_COMMAND_MESSAGE),
            Reply::InvalidCommand => f.write_str(INVALID_COMMAND_MESSAGE),
            Reply::UnderMaintenance => f.write_str(UNDER_MAINTENANCE_MESSAGE),
            Reply::Start => f.write_str(START_MESSAGE),
            Reply::Help => f.write_str(HELP_MESSAGE),
            Reply::Position(pos) => {
                let ahead = pos.saturating_sub(1);
                if ahead == 0 {
                    write!(f, "You are next in line!")
                } else {
                    write!(
                        f,
                        "You are number {} in the queue. There {} {} {} ahead of you.",
                        pos,
                        if ahead == 1 { "is" } else { "are" },
                        ahead,
                        people(ahead)
                    )
                }
            }
            Reply::NotInQueue => write!(f, "You are not in the queue. Send /join to join."),
            Reply::QueueNotYetOpen(start) => {
                write!(f, "{}{}", QUEUE_UNOPENED_MESSAGE, format_instant(start))
            }
            Reply::QueueClosed(end) => {
                write!(f, "{}{}", QUEUE_CLOSED_MESSAGE, format_instant(end))
            }
            Reply::Joined(pos) => write!(
                f,
                "You have joined the queue. You are number {} in line.",
                pos
            ),
            Reply::AlreadyInQueue(pos) => write!(
                f,
                "You are already in the queue. You are number {} in line.",
                pos
            ),
            Reply::Left => write!(f, "You have left the queue."),
            Reply::QueueView(participants) => {
                if participants.is_empty() {
                    return write!(f, "The queue is empty.");
                }
                write!(f, "Queue ({} waiting):", participants.len())?;
                for (idx, p) in participants.iter().enumerate() {
                    write!(f, "\n{}. {}", idx + 1, p.display_name())?;
                }
                Ok(())
            }
            Reply::Served {
                participant,
                remaining,
            } => write!(
                f,
                "Now serving {}. {} {} left in the queue.",
                participant.display_name(),
                remaining,
                people(*remaining)
            ),
            Reply::QueueEmpty => write!(f, "The queue is empty."),
            Reply::Bumped { participant, from } => write!(
                f,
                "Moved {} from number {} to the front of the queue.",
                participant.display_name(),
                from
            ),
            Reply::BumpNotFound(target) => {
                write!(f, "No one matching {} is in the queue.", target)
            }
            Reply::BumpUsage => write!(f, "Usage: /bump <position | @handle | id>"),
            Reply::Purged(count) => write!(
                f,
                "The queue has been purged. {} {} removed.",
                count,
                people(*count)
            ),
            Reply::BroadcastSent(count) => {
                write!(f, "Broadcast sent to {} {}.", count, people(*count))
            }
            Reply::BroadcastUsage => write!(f, "Usage: /broadcast <message>"),
        }
    }
}

/// Message sent to the participant who was just served.
pub fn your_turn_message() -> &'static str {
    "It's your turn! Please make your way to the counter."
}

/// Body of a broadcast as recipients see it.
pub fn broadcast_message(text: &str) -> String {
    format!("Announcement: {}", text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::ParticipantId;

    #[test]
    fn test_position_wording() {
        assert_eq!(Reply::Position(1).to_string(), "You are next in line!");
        assert_eq!(
            Reply::Position(2).to_string(),
            "You are number 2 in the queue. There is 1 person ahead of you."
        );
        assert!(Reply::Position(5).to_string().contains("4 people ahead"));
    }

    #[test]
    fn test_queue_view_lists_in_order() {
        let view = Reply::QueueView(vec![
            Participant::new(ParticipantId(1), Some("@alice".into())),
            Participant::new(ParticipantId(2), None),
        ]);
        assert_eq!(view.to_string(), "Queue (2 waiting):\n1. @alice\n2. 2");
        assert_eq!(Reply::QueueView(vec![]).to_string(), "The queue is empty.");
    }

    #[test]
    fn test_kinds_distinguish_join_outcomes() {
        assert_ne!(Reply::Joined(1).kind(), Reply::AlreadyInQueue(1).kind());
        assert_ne!(Reply::InvalidCommand.kind(), Reply::Purged(0).kind());
    }

    #[test]
    fn test_broadcast_message_trims_separator() {
        assert_eq!(broadcast_message(" hi"), "Announcement: hi");
    }
}
