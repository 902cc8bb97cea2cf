//! Job file parser and response tests
//!
//! Tests verify:
//! - Each command keyword and its argument grammar
//! - Malformed lines become Invalid (never errors)
//! - CommandReader line handling
//! - Output rendering of responses

use std::io::Cursor;

use batchkv::config::{MAX_LINE_SIZE, MAX_STRING_SIZE, MAX_WRITE_SIZE};
use batchkv::protocol::{
    parse_line, write_response, Command, CommandReader, CommandType, Response, HELP_TEXT,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(|k| k.to_string()).collect()
}

fn assert_invalid(line: &str) {
    let command = parse_line(line);
    assert_eq!(
        command.command_type(),
        CommandType::Invalid,
        "`{}` parsed as {:?}",
        line,
        command
    );
}

// =============================================================================
// WRITE Tests
// =============================================================================

#[test]
fn test_parse_write_bracketed() {
    assert_eq!(
        parse_line("WRITE [(a,1)(b,2)]"),
        Command::Write {
            pairs: pairs(&[("a", "1"), ("b", "2")])
        }
    );
}

#[test]
fn test_parse_write_without_brackets_or_space() {
    assert_eq!(
        parse_line("WRITE(k,v1)"),
        Command::Write {
            pairs: pairs(&[("k", "v1")])
        }
    );
}

#[test]
fn test_parse_write_pairs_separated_by_commas_and_spaces() {
    assert_eq!(
        parse_line("WRITE [(a,1), (b,2) (c,3)]"),
        Command::Write {
            pairs: pairs(&[("a", "1"), ("b", "2"), ("c", "3")])
        }
    );
}

#[test]
fn test_parse_write_trims_tokens() {
    assert_eq!(
        parse_line("  WRITE [( key , value )]  \n"),
        Command::Write {
            pairs: pairs(&[("key", "value")])
        }
    );
}

#[test]
fn test_parse_write_keeps_duplicate_keys_in_order() {
    assert_eq!(
        parse_line("WRITE [(k,v1)(k,v2)]"),
        Command::Write {
            pairs: pairs(&[("k", "v1"), ("k", "v2")])
        }
    );
}

#[test]
fn test_parse_write_malformed() {
    assert_invalid("WRITE");
    assert_invalid("WRITE []");
    assert_invalid("WRITE [(a,1)");
    assert_invalid("WRITE [(a,1]");
    assert_invalid("WRITE [(a)]");
    assert_invalid("WRITE [(,1)]");
    assert_invalid("WRITE [(a,)]");
    assert_invalid("WRITE [(a,1,2)]");
    assert_invalid("WRITE [a,1]");
}

#[test]
fn test_parse_write_token_length_limit() {
    let max = "k".repeat(MAX_STRING_SIZE);
    let too_long = "k".repeat(MAX_STRING_SIZE + 1);

    assert_eq!(
        parse_line(&format!("WRITE [({},v)]", max)),
        Command::Write {
            pairs: pairs(&[(max.as_str(), "v")])
        }
    );
    assert_invalid(&format!("WRITE [({},v)]", too_long));
    assert_invalid(&format!("WRITE [(k,{})]", too_long));
}

#[test]
fn test_parse_write_pair_count_limit() {
    let batch = |n: usize| {
        let body: String = (0..n).map(|i| format!("(k{},v)", i)).collect();
        format!("WRITE [{}]", body)
    };

    match parse_line(&batch(MAX_WRITE_SIZE)) {
        Command::Write { pairs } => assert_eq!(pairs.len(), MAX_WRITE_SIZE),
        other => panic!("expected WRITE, got {:?}", other),
    }
    assert_invalid(&batch(MAX_WRITE_SIZE + 1));
}

// =============================================================================
// READ / DELETE Tests
// =============================================================================

#[test]
fn test_parse_read() {
    assert_eq!(
        parse_line("READ [a,b,c]"),
        Command::Read {
            keys: keys(&["a", "b", "c"])
        }
    );
    assert_eq!(parse_line("READ[k]"), Command::Read { keys: keys(&["k"]) });
    assert_eq!(
        parse_line("READ a, b"),
        Command::Read {
            keys: keys(&["a", "b"])
        }
    );
}

#[test]
fn test_parse_delete() {
    assert_eq!(
        parse_line("DELETE [x]"),
        Command::Delete { keys: keys(&["x"]) }
    );
    assert_eq!(
        parse_line("DELETE [a, a]"),
        Command::Delete {
            keys: keys(&["a", "a"])
        }
    );
}

#[test]
fn test_parse_keys_malformed() {
    assert_invalid("READ");
    assert_invalid("READ []");
    assert_invalid("READ [a,,b]");
    assert_invalid("READ [a,b");
    assert_invalid("DELETE [(a)]");
    assert_invalid("DELETE");
}

// =============================================================================
// Argument-less Commands and WAIT
// =============================================================================

#[test]
fn test_parse_simple_commands() {
    assert_eq!(parse_line("SHOW"), Command::Show);
    assert_eq!(parse_line("BACKUP"), Command::Backup);
    assert_eq!(parse_line("HELP\n"), Command::Help);
}

#[test]
fn test_parse_simple_commands_reject_arguments() {
    assert_invalid("SHOW all");
    assert_invalid("BACKUP now");
    assert_invalid("HELP [x]");
}

#[test]
fn test_parse_wait() {
    assert_eq!(parse_line("WAIT 500"), Command::Wait { delay_ms: 500 });
    assert_eq!(parse_line("WAIT 0"), Command::Wait { delay_ms: 0 });
}

#[test]
fn test_parse_wait_malformed() {
    assert_invalid("WAIT");
    assert_invalid("WAIT -5");
    assert_invalid("WAIT soon");
    assert_invalid("WAIT 1 2");
}

// =============================================================================
// Empty / Invalid Lines
// =============================================================================

#[test]
fn test_parse_blank_and_comment_lines() {
    assert_eq!(parse_line(""), Command::Empty);
    assert_eq!(parse_line("   \t"), Command::Empty);
    assert_eq!(parse_line("\n"), Command::Empty);
    assert_eq!(parse_line("# WRITE [(a,1)]"), Command::Empty);
}

#[test]
fn test_parse_unknown_and_lowercase_keywords() {
    assert_invalid("PUT [(a,1)]");
    assert_invalid("write [(a,1)]");
    assert_invalid("SHOWME");
    assert_invalid("42");
}

#[test]
fn test_invalid_carries_reason() {
    match parse_line("FROB") {
        Command::Invalid { reason } => assert!(reason.contains("FROB"), "{}", reason),
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_command_type_keywords() {
    assert_eq!(CommandType::from_keyword("WRITE"), Some(CommandType::Write));
    assert_eq!(CommandType::from_keyword("Write"), None);
    assert_eq!(CommandType::Backup.keyword(), Some("BACKUP"));
    assert_eq!(CommandType::End.keyword(), None);
    assert_eq!(Command::End.command_type(), CommandType::End);
}

// =============================================================================
// CommandReader Tests
// =============================================================================

#[test]
fn test_reader_reads_commands_in_order() {
    let input = "WRITE [(a,1)]\n\nREAD [a]\nSHOW\n";
    let mut reader = CommandReader::new(Cursor::new(input));

    assert_eq!(
        reader.next_command().unwrap(),
        Command::Write {
            pairs: pairs(&[("a", "1")])
        }
    );
    assert_eq!(reader.line_number(), 1);
    assert_eq!(reader.next_command().unwrap(), Command::Empty);
    assert_eq!(
        reader.next_command().unwrap(),
        Command::Read { keys: keys(&["a"]) }
    );
    assert_eq!(reader.line_number(), 3);
    assert_eq!(reader.next_command().unwrap(), Command::Show);
    assert_eq!(reader.next_command().unwrap(), Command::End);
    assert_eq!(reader.next_command().unwrap(), Command::End);
    assert_eq!(reader.line_number(), 4);
}

#[test]
fn test_reader_last_line_without_newline() {
    let mut reader = CommandReader::new(Cursor::new("SHOW\nREAD[k]"));

    assert_eq!(reader.next_command().unwrap(), Command::Show);
    assert_eq!(
        reader.next_command().unwrap(),
        Command::Read { keys: keys(&["k"]) }
    );
    assert_eq!(reader.next_command().unwrap(), Command::End);
}

#[test]
fn test_reader_handles_crlf() {
    let mut reader = CommandReader::new(Cursor::new("SHOW\r\nWAIT 5\r\n"));

    assert_eq!(reader.next_command().unwrap(), Command::Show);
    assert_eq!(reader.next_command().unwrap(), Command::Wait { delay_ms: 5 });
}

#[test]
fn test_reader_invalid_utf8_is_invalid_command() {
    let mut reader = CommandReader::new(Cursor::new(&b"\xff\xfe\nSHOW\n"[..]));

    assert_eq!(
        reader.next_command().unwrap().command_type(),
        CommandType::Invalid
    );
    assert_eq!(reader.next_command().unwrap(), Command::Show);
}

#[test]
fn test_reader_empty_input() {
    let mut reader = CommandReader::new(Cursor::new(""));

    assert_eq!(reader.next_command().unwrap(), Command::End);
    assert_eq!(reader.line_number(), 0);
}

#[test]
fn test_reader_overlong_line_is_invalid_and_skipped() {
    let input = format!("READ [{}]\nSHOW\n", "k,".repeat(MAX_LINE_SIZE));
    let mut reader = CommandReader::new(Cursor::new(input));

    match reader.next_command().unwrap() {
        Command::Invalid { reason } => assert!(reason.contains("longer than"), "{}", reason),
        other => panic!("expected Invalid, got {:?}", other),
    }
    assert_eq!(reader.line_number(), 1);
    assert_eq!(reader.next_command().unwrap(), Command::Show);
    assert_eq!(reader.line_number(), 2);
    assert_eq!(reader.next_command().unwrap(), Command::End);
}

#[test]
fn test_reader_overlong_last_line_without_newline() {
    let input = format!("SHOW\n{}", "x".repeat(MAX_LINE_SIZE * 2));
    let mut reader = CommandReader::new(Cursor::new(input));

    assert_eq!(reader.next_command().unwrap(), Command::Show);
    assert_eq!(
        reader.next_command().unwrap().command_type(),
        CommandType::Invalid
    );
    assert_eq!(reader.next_command().unwrap(), Command::End);
}

#[test]
fn test_reader_accepts_full_batch_of_longest_tokens() {
    let key = "k".repeat(MAX_STRING_SIZE);
    let value = "v".repeat(MAX_STRING_SIZE);
    let body = format!("({},{})", key, value).repeat(MAX_WRITE_SIZE);
    let input = format!("WRITE [{}]\n", body);
    let mut reader = CommandReader::new(Cursor::new(input));

    match reader.next_command().unwrap() {
        Command::Write { pairs } => assert_eq!(pairs.len(), MAX_WRITE_SIZE),
        other => panic!("expected WRITE, got {:?}", other),
    }
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_read_response_format() {
    let response = Response::read(vec![
        ("a".to_string(), Some("1".to_string())),
        ("b".to_string(), None),
    ]);

    assert_eq!(response.to_string(), "[(a,1)(b,KVSERROR)]");
}

#[test]
fn test_missing_response_format() {
    let response = Response::missing(keys(&["x", "y"])).unwrap();

    assert_eq!(response.to_string(), "[(x,KVSMISSING)(y,KVSMISSING)]");
}

#[test]
fn test_missing_response_empty_is_none() {
    assert_eq!(Response::missing(Vec::new()), None);
}

#[test]
fn test_waiting_and_help_responses() {
    assert_eq!(Response::Waiting.to_string(), "Waiting...");
    assert_eq!(Response::Help.to_string(), HELP_TEXT);
    assert!(HELP_TEXT.starts_with("Available commands:"));
    for keyword in ["WRITE", "READ", "DELETE", "SHOW", "WAIT", "BACKUP", "HELP"] {
        assert!(HELP_TEXT.contains(keyword), "help is missing {}", keyword);
    }
}

#[test]
fn test_write_response_appends_newline() {
    let mut out = Vec::new();

    write_response(&mut out, &Response::read(vec![("k".to_string(), Some("v".to_string()))]))
        .unwrap();
    write_response(&mut out, &Response::Waiting).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "[(k,v)]\nWaiting...\n");
}
