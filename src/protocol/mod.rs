//! Protocol Module
//!
//! Defines the text format of job files and of their outputs.
//!
//! ## Job File Format
//! One command per line:
//! ```text
//! WRITE [(a,1)(b,2)]
//! READ [a,b,c]
//! DELETE [a]
//! SHOW
//! WAIT 500
//! BACKUP
//! HELP
//! ```
//!
//! ## Output Format
//! ```text
//! [(a,1)(b,2)(c,KVSERROR)]     READ
//! [(a,KVSMISSING)]             DELETE, only when a key was missing
//! (b,2)                        SHOW, one line per entry
//! Waiting...                   WAIT with a non-zero delay
//! ```

mod command;
mod parser;
mod response;

pub use command::{Command, CommandType};
pub use parser::{parse_line, CommandReader};
pub use response::{
    write_response, Response, BACKUP_FAILED, DELETE_FAILED, HELP_TEXT, INVALID_COMMAND,
    KEY_MISSING, KEY_NOT_FOUND, READ_FAILED, WAITING, WRITE_FAILED,
};
