//! Command classification.
//!
//! Inbound text is parsed once into a [`Command`]; the router then matches
//! on the enum. Commands are case-sensitive and must start with `/`.

/// Prefix every command starts with.
pub const COMMAND_PREFIX: char = '/';

const BROADCAST: &str = "/broadcast";
const BUMP: &str = "/bump";

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    HowLong,
    Join,
    Leave,
    ViewQueue,
    Next,
    /// `/bump <target>`; `None` when no target was given.
    Bump(Option<String>),
    Purge,
    /// Everything after `/broadcast`, leading separator included.
    Broadcast(String),
    /// Prefixed but unrecognized.
    Unknown(String),
}

impl Command {
    /// Classify `text`. Returns `None` when it is not a command at all.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with(COMMAND_PREFIX) {
            return None;
        }

        let command = match text {
            "/start" => Command::Start,
            "/help" => Command::Help,
            "/howlong" => Command::HowLong,
            "/join" => Command::Join,
            "/leave" => Command::Leave,
            "/viewqueue" => Command::ViewQueue,
            "/next" => Command::Next,
            "/purge" => Command::Purge,
            BUMP => Command::Bump(None),
            _ if text.starts_with(BROADCAST) => {
                Command::Broadcast(text[BROADCAST.len()..].to_string())
            }
            _ => match text.strip_prefix(BUMP) {
                Some(rest) if rest.starts_with(char::is_whitespace) => {
                    let target = rest.trim();
                    Command::Bump((!target.is_empty()).then(|| target.to_string()))
                }
                _ => Command::Unknown(text.to_string()),
            },
        };

        Some(command)
    }

    /// Commands only operators may run.
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::ViewQueue
                | Command::Next
                | Command::Bump(_)
                | Command::Purge
                | Command::Broadcast(_)
        )
    }

    /// Commands the opening hours apply to.
    pub fn is_time_gated(&self) -> bool {
        matches!(self, Command::Join | Command::Leave)
    }

    /// Short stable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::HowLong => "howlong",
            Command::Join => "join",
            Command::Leave => "leave",
            Command::ViewQueue => "viewqueue",
            Command::Next => "next",
            Command::Bump(_) => "bump",
            Command::Purge => "purge",
            Command::Broadcast(_) => "broadcast",
            Command::Unknown(_) => "unknown",
        }
    }
}
