//! Response definitions
//!
//! Everything a job writes to its `.out` file, plus the fixed diagnostic
//! strings reported on the error channel.

use std::fmt;
use std::io::Write;

use crate::error::Result;

// =============================================================================
// Fixed Strings
// =============================================================================

/// Placeholder value for a READ of an absent key
pub const KEY_NOT_FOUND: &str = "KVSERROR";

/// Placeholder value for a DELETE of an absent key
pub const KEY_MISSING: &str = "KVSMISSING";

/// Notice written before a WAIT blocks
pub const WAITING: &str = "Waiting...";

/// Command summary written by HELP
pub const HELP_TEXT: &str = "Available commands:\n  \
WRITE [(key,value)(key2,value2),...]\n  \
READ [key,key2,...]\n  \
DELETE [key,key2,...]\n  \
SHOW\n  \
WAIT <delay_ms>\n  \
BACKUP\n  \
HELP";

/// Diagnostic for unparseable commands
pub const INVALID_COMMAND: &str = "Invalid command. See HELP for usage";

/// Diagnostic for a BACKUP that could not be started
pub const BACKUP_FAILED: &str = "Failed to perform backup.";

pub const WRITE_FAILED: &str = "Failed to write pair";
pub const READ_FAILED: &str = "Failed to read pair";
pub const DELETE_FAILED: &str = "Failed to delete pair";

/// A line (or block) of job output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `[(k,v)(k2,KVSERROR)]`
    Read(Vec<(String, Option<String>)>),

    /// `[(k,KVSMISSING)]`
    Missing(Vec<String>),

    /// `Waiting...`
    Waiting,

    /// The command summary
    Help,
}

impl Response {
    /// Response for a READ, one entry per requested key
    pub fn read(results: Vec<(String, Option<String>)>) -> Self {
        Response::Read(results)
    }

    /// Response for a DELETE; `None` when every key was present
    pub fn missing(keys: Vec<String>) -> Option<Self> {
        if keys.is_empty() {
            None
        } else {
            Some(Response::Missing(keys))
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Read(results) => {
                f.write_str("[")?;
                for (key, value) in results {
                    write!(f, "({},{})", key, value.as_deref().unwrap_or(KEY_NOT_FOUND))?;
                }
                f.write_str("]")
            }
            Response::Missing(keys) => {
                f.write_str("[")?;
                for key in keys {
                    write!(f, "({},{})", key, KEY_MISSING)?;
                }
                f.write_str("]")
            }
            Response::Waiting => f.write_str(WAITING),
            Response::Help => f.write_str(HELP_TEXT),
        }
    }
}

/// Write a response as its own line and flush
pub fn write_response<W: Write + ?Sized>(writer: &mut W, response: &Response) -> Result<()> {
    writeln!(writer, "{}", response)?;
    writer.flush()?;
    Ok(())
}
