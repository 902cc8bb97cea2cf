//! Job file parser
//!
//! Turns the lines of a job file into `Command`s, one per call.
//!
//! ## Line Grammar
//! ```text
//! WRITE  [(key,value)(key2,value2)...]   brackets optional
//! READ   [key,key2,...]                  brackets optional
//! DELETE [key,key2,...]                  brackets optional
//! SHOW | BACKUP | HELP                   no arguments
//! WAIT   <delay_ms>
//! # comment, or blank line              -> Empty
//! ```
//!
//! Keys and values are trimmed, non-empty, at most `MAX_STRING_SIZE` bytes
//! and may not contain `(`, `)`, `[`, `]` or `,`. Lines longer than
//! `MAX_LINE_SIZE` are never buffered whole; they come back as `Invalid`.

use std::io::{BufRead, Read};

use crate::config::{MAX_LINE_SIZE, MAX_STRING_SIZE, MAX_WRITE_SIZE};
use crate::error::{KvsError, Result};

use super::{Command, CommandType};

/// Characters that delimit tokens and so cannot appear inside one
const RESERVED: &[char] = &['(', ')', '[', ']', ','];

/// Reads commands from a job's input, one line at a time
pub struct CommandReader<R> {
    reader: R,

    /// Raw bytes of the current line (reused between calls)
    line: Vec<u8>,

    /// 1-based number of the last line read
    line_number: usize,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
        }
    }

    /// Read and parse the next command
    ///
    /// Returns `Command::End` once the input is exhausted. Only I/O failures
    /// are errors; bad lines come back as `Command::Invalid`.
    pub fn next_command(&mut self) -> Result<Command> {
        self.line.clear();
        let limit = MAX_LINE_SIZE as u64 + 1;
        if (&mut self.reader).take(limit).read_until(b'\n', &mut self.line)? == 0 {
            return Ok(Command::End);
        }
        self.line_number += 1;

        if self.line.len() > MAX_LINE_SIZE && self.line.last() != Some(&b'\n') {
            self.skip_rest_of_line()?;
            return Ok(Command::Invalid {
                reason: format!("line longer than {} bytes", MAX_LINE_SIZE),
            });
        }

        match std::str::from_utf8(&self.line) {
            Ok(line) => Ok(parse_line(line)),
            Err(_) => Ok(Command::Invalid {
                reason: "line is not valid UTF-8".to_string(),
            }),
        }
    }

    /// Number of the line the last command came from
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Consume input up to and including the next newline
    fn skip_rest_of_line(&mut self) -> Result<()> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let newline = buf.iter().position(|&b| b == b'\n');
            let available = buf.len();

            match newline {
                Some(pos) => {
                    self.reader.consume(pos + 1);
                    return Ok(());
                }
                None => self.reader.consume(available),
            }
        }
    }
}

/// Parse a single job file line
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Command::Empty;
    }

    let split = line
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(line.len());
    let (word, args) = line.split_at(split);
    let args = args.trim();

    let parsed = match CommandType::from_keyword(word) {
        Some(CommandType::Write) => parse_pairs(args).map(|pairs| Command::Write { pairs }),
        Some(CommandType::Read) => parse_keys(args).map(|keys| Command::Read { keys }),
        Some(CommandType::Delete) => parse_keys(args).map(|keys| Command::Delete { keys }),
        Some(CommandType::Wait) => parse_delay(args).map(|delay_ms| Command::Wait { delay_ms }),
        Some(CommandType::Show) => expect_no_args(word, args).map(|()| Command::Show),
        Some(CommandType::Backup) => expect_no_args(word, args).map(|()| Command::Backup),
        Some(CommandType::Help) => expect_no_args(word, args).map(|()| Command::Help),
        _ => Err(malformed(format!("unknown command `{}`", word))),
    };

    match parsed {
        Ok(command) => command,
        Err(KvsError::MalformedCommand(reason)) => Command::Invalid { reason },
        Err(e) => Command::Invalid {
            reason: e.to_string(),
        },
    }
}

// =============================================================================
// Argument Parsers
// =============================================================================

/// `(k,v)(k2,v2)...`, optionally bracketed
fn parse_pairs(args: &str) -> Result<Vec<(String, String)>> {
    let mut rest = strip_brackets(args)?;
    let mut pairs = Vec::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let body = rest
            .strip_prefix('(')
            .ok_or_else(|| malformed("expected `(` before a pair"))?;
        let close = body
            .find(')')
            .ok_or_else(|| malformed("unterminated pair"))?;
        let (key, value) = body[..close]
            .split_once(',')
            .ok_or_else(|| malformed("pair is missing its `,`"))?;

        pairs.push((token(key)?, token(value)?));
        if pairs.len() > MAX_WRITE_SIZE {
            return Err(malformed(format!("more than {} pairs", MAX_WRITE_SIZE)));
        }

        rest = &body[close + 1..];
    }

    if pairs.is_empty() {
        return Err(malformed("WRITE needs at least one pair"));
    }
    Ok(pairs)
}

/// `k,k2,...`, optionally bracketed
fn parse_keys(args: &str) -> Result<Vec<String>> {
    let inner = strip_brackets(args)?;
    if inner.trim().is_empty() {
        return Err(malformed("at least one key is required"));
    }

    let keys = inner.split(',').map(token).collect::<Result<Vec<_>>>()?;
    if keys.len() > MAX_WRITE_SIZE {
        return Err(malformed(format!("more than {} keys", MAX_WRITE_SIZE)));
    }
    Ok(keys)
}

/// Non-negative delay in milliseconds
fn parse_delay(args: &str) -> Result<u64> {
    if args.is_empty() {
        return Err(malformed("WAIT needs a delay"));
    }
    args.parse::<u64>()
        .map_err(|_| malformed(format!("invalid delay `{}`", args)))
}

fn expect_no_args(word: &str, args: &str) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(malformed(format!("{} takes no arguments", word)))
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Drop one surrounding `[...]` if present
fn strip_brackets(args: &str) -> Result<&str> {
    match args.strip_prefix('[') {
        Some(inner) => inner
            .strip_suffix(']')
            .ok_or_else(|| malformed("unterminated `[`")),
        None => Ok(args),
    }
}

/// Validate and own a key or value
fn token(raw: &str) -> Result<String> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(malformed("empty key or value"));
    }
    if token.len() > MAX_STRING_SIZE {
        return Err(malformed(format!(
            "`{}` is longer than {} bytes",
            token, MAX_STRING_SIZE
        )));
    }
    if token.contains(RESERVED) {
        return Err(malformed(format!("`{}` contains a reserved character", token)));
    }
    Ok(token.to_string())
}

fn malformed(reason: impl Into<String>) -> KvsError {
    KvsError::MalformedCommand(reason.into())
}
