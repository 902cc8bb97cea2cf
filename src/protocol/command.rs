//! Command definitions
//!
//! Represents commands read from job files.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Write,
    Read,
    Delete,
    Show,
    Wait,
    Backup,
    Help,
    Empty,
    Invalid,
    End,
}

impl CommandType {
    /// Keyword that introduces this command in a job file
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            CommandType::Write => Some("WRITE"),
            CommandType::Read => Some("READ"),
            CommandType::Delete => Some("DELETE"),
            CommandType::Show => Some("SHOW"),
            CommandType::Wait => Some("WAIT"),
            CommandType::Backup => Some("BACKUP"),
            CommandType::Help => Some("HELP"),
            CommandType::Empty | CommandType::Invalid | CommandType::End => None,
        }
    }

    /// Case-sensitive keyword lookup
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "WRITE" => Some(CommandType::Write),
            "READ" => Some(CommandType::Read),
            "DELETE" => Some(CommandType::Delete),
            "SHOW" => Some(CommandType::Show),
            "WAIT" => Some(CommandType::Wait),
            "BACKUP" => Some(CommandType::Backup),
            "HELP" => Some(CommandType::Help),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upsert pairs, applied in order
    Write { pairs: Vec<(String, String)> },

    /// Look up keys
    Read { keys: Vec<String> },

    /// Remove keys
    Delete { keys: Vec<String> },

    /// Dump the whole table
    Show,

    /// Pause the worker running this job
    Wait { delay_ms: u64 },

    /// Snapshot the table to a numbered file
    Backup,

    /// Print the command summary
    Help,

    /// Blank line or comment
    Empty,

    /// Unrecognized or malformed line
    Invalid { reason: String },

    /// No more commands in this job
    End,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Write { .. } => CommandType::Write,
            Command::Read { .. } => CommandType::Read,
            Command::Delete { .. } => CommandType::Delete,
            Command::Show => CommandType::Show,
            Command::Wait { .. } => CommandType::Wait,
            Command::Backup => CommandType::Backup,
            Command::Help => CommandType::Help,
            Command::Empty => CommandType::Empty,
            Command::Invalid { .. } => CommandType::Invalid,
            Command::End => CommandType::End,
        }
    }
}
