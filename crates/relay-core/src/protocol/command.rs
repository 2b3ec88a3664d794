//! Parser for the line-oriented command grammar.
//!
//! A request payload is UTF-8 text. Lines are separated by `\n`; the first
//! line is the command keyword and the remaining lines are positional
//! arguments. The final argument of `add` (the display name) and of
//! `find_peer` (the system) may contain embedded spaces – it is the
//! remainder of the argument list joined back together.
//!
//! ```text
//! add\n1.2.3.4\n6000\nSolSystem\nMy Server
//! ```
//!
//! Parsing distinguishes three failure classes, which the dispatcher handles
//! differently:
//!
//! - [`DecodeError::Malformed`] – the payload is not valid UTF-8 or is
//!   empty. There is no reliable command token to echo, so the message is
//!   dropped and logged, never answered.
//! - [`DecodeError::Invalid`] – a known command with the wrong argument
//!   count or a non-numeric port. Answered as `<cmd> error <message>`.
//! - [`DecodeError::Unknown`] – an unrecognized keyword. Answered as
//!   `<cmd> error Unknown command`.

use thiserror::Error;

/// A fully parsed request.
///
/// Server identifiers arrive as opaque strings and stay strings here; the
/// registry decides whether they name a known record. This keeps the
/// permissive protocol semantics intact: any peer may `ping` or `remove`
/// any record it can name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register a server with an explicit address and port.
    Add {
        addr: String,
        port: u16,
        system: String,
        name: String,
    },
    /// Return the full registry snapshot. Sent as `list` or `update`.
    List,
    /// Refresh the heartbeat of a registered server.
    Ping { server_id: String },
    /// Delete a registered server by identifier.
    Remove { server_id: String },
    /// Register a server using the sender's own reported address, and
    /// announce it to all other peers.
    Advertise { system: String },
    /// Remove an advertised server owned by the sender, and announce the
    /// removal to all other peers.
    Deadvertise { system: String },
    /// Look up the first server hosting the given system
    /// (case-insensitive).
    FindPeer { system: String },
}

/// Errors produced while decoding a request payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload cannot be interpreted at all; dropped without a reply.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A known command carried invalid arguments; replied as
    /// `<command> error <message>`.
    #[error("{command}: {message}")]
    Invalid { command: String, message: String },

    /// The command keyword is not part of the protocol; replied as
    /// `<command> error Unknown command`.
    #[error("unknown command: {command}")]
    Unknown { command: String },
}

/// Decodes one request payload into a [`Command`].
///
/// Leading and trailing whitespace is trimmed before splitting, so a client
/// that terminates its payload with a newline parses the same as one that
/// does not.
///
/// # Errors
///
/// Returns a [`DecodeError`] classifying the failure; see the module docs
/// for how each class is answered.
pub fn decode_command(payload: &[u8]) -> Result<Command, DecodeError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| DecodeError::Malformed(format!("invalid UTF-8: {e}")))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::Malformed("empty payload".to_string()));
    }

    let mut lines = text.split('\n');
    // `text` is non-empty, so the first line always exists.
    let keyword = lines.next().unwrap_or_default();
    let args: Vec<&str> = lines.collect();

    match keyword {
        "add" => decode_add(&args),
        "list" | "update" => Ok(Command::List),
        "ping" => decode_single_arg(&args, "ping", "expected server_id")
            .map(|server_id| Command::Ping { server_id }),
        "remove" => decode_single_arg(&args, "remove", "expected server_id")
            .map(|server_id| Command::Remove { server_id }),
        "advertise" => decode_single_arg(&args, "advertise", "expected system")
            .map(|system| Command::Advertise { system }),
        "deadvertise" => decode_single_arg(&args, "deadvertise", "expected system")
            .map(|system| Command::Deadvertise { system }),
        "find_peer" => decode_find_peer(&args),
        other => Err(DecodeError::Unknown {
            command: other.to_string(),
        }),
    }
}

// ── Per-command decoding ──────────────────────────────────────────────────────

fn decode_add(args: &[&str]) -> Result<Command, DecodeError> {
    if args.len() < 4 {
        return Err(invalid("add", "too few arguments: expected addr, port, system, name"));
    }
    let port: u16 = args[1]
        .parse()
        .map_err(|_| invalid("add", "port must be an integer between 0 and 65535"))?;
    Ok(Command::Add {
        addr: args[0].to_string(),
        port,
        system: args[2].to_string(),
        // The display name may contain spaces; everything after the third
        // argument belongs to it.
        name: args[3..].join(" "),
    })
}

fn decode_find_peer(args: &[&str]) -> Result<Command, DecodeError> {
    if args.is_empty() {
        return Err(invalid("find_peer", "expected system"));
    }
    // The system name may contain spaces.
    Ok(Command::FindPeer {
        system: args.join(" "),
    })
}

/// Decodes a command that takes exactly one argument.
fn decode_single_arg(args: &[&str], command: &str, message: &str) -> Result<String, DecodeError> {
    if args.len() != 1 {
        return Err(invalid(command, message));
    }
    Ok(args[0].to_string())
}

fn invalid(command: &str, message: &str) -> DecodeError {
    DecodeError::Invalid {
        command: command.to_string(),
        message: message.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_add_with_all_fields() {
        // Arrange
        let payload = b"add\n1.2.3.4\n6000\nSolSystem\nMy Server";

        // Act
        let cmd = decode_command(payload).expect("valid add");

        // Assert
        assert_eq!(
            cmd,
            Command::Add {
                addr: "1.2.3.4".to_string(),
                port: 6000,
                system: "SolSystem".to_string(),
                name: "My Server".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_add_joins_name_remainder_with_spaces() {
        // A name split across extra argument lines is re-joined with spaces.
        let payload = b"add\n1.2.3.4\n6000\nSolSystem\nMy\nGreat\nServer";
        let cmd = decode_command(payload).expect("valid add");
        assert_eq!(
            cmd,
            Command::Add {
                addr: "1.2.3.4".to_string(),
                port: 6000,
                system: "SolSystem".to_string(),
                name: "My Great Server".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_add_with_too_few_arguments_is_invalid() {
        let result = decode_command(b"add\n1.2.3.4\n6000");
        assert!(matches!(
            result,
            Err(DecodeError::Invalid { command, .. }) if command == "add"
        ));
    }

    #[test]
    fn test_decode_add_with_non_numeric_port_is_invalid() {
        let result = decode_command(b"add\n1.2.3.4\nsixty\nSolSystem\nName");
        assert!(matches!(
            result,
            Err(DecodeError::Invalid { command, .. }) if command == "add"
        ));
    }

    #[test]
    fn test_decode_add_with_port_out_of_range_is_invalid() {
        let result = decode_command(b"add\n1.2.3.4\n70000\nSolSystem\nName");
        assert!(matches!(result, Err(DecodeError::Invalid { .. })));
    }

    #[test]
    fn test_decode_list_and_update_are_equivalent() {
        assert_eq!(decode_command(b"list"), Ok(Command::List));
        assert_eq!(decode_command(b"update"), Ok(Command::List));
    }

    #[test]
    fn test_decode_ping_with_id() {
        let cmd = decode_command(b"ping\nabc-123").expect("valid ping");
        assert_eq!(
            cmd,
            Command::Ping {
                server_id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_decode_ping_without_id_is_invalid() {
        assert!(matches!(
            decode_command(b"ping"),
            Err(DecodeError::Invalid { command, .. }) if command == "ping"
        ));
    }

    #[test]
    fn test_decode_ping_with_extra_arguments_is_invalid() {
        assert!(matches!(
            decode_command(b"ping\nid\nextra"),
            Err(DecodeError::Invalid { .. })
        ));
    }

    #[test]
    fn test_decode_remove_with_id() {
        let cmd = decode_command(b"remove\nsome-id").expect("valid remove");
        assert_eq!(
            cmd,
            Command::Remove {
                server_id: "some-id".to_string()
            }
        );
    }

    #[test]
    fn test_decode_advertise_with_system() {
        let cmd = decode_command(b"advertise\nSolSystem").expect("valid advertise");
        assert_eq!(
            cmd,
            Command::Advertise {
                system: "SolSystem".to_string()
            }
        );
    }

    #[test]
    fn test_decode_deadvertise_without_system_is_invalid() {
        assert!(matches!(
            decode_command(b"deadvertise"),
            Err(DecodeError::Invalid { command, .. }) if command == "deadvertise"
        ));
    }

    #[test]
    fn test_decode_find_peer_joins_system_remainder() {
        let cmd = decode_command(b"find_peer\nAlpha Centauri").expect("valid find_peer");
        assert_eq!(
            cmd,
            Command::FindPeer {
                system: "Alpha Centauri".to_string()
            }
        );
    }

    #[test]
    fn test_decode_find_peer_without_system_is_invalid() {
        assert!(matches!(
            decode_command(b"find_peer"),
            Err(DecodeError::Invalid { command, .. }) if command == "find_peer"
        ));
    }

    #[test]
    fn test_decode_unknown_command_reports_keyword() {
        let result = decode_command(b"foo\nbar");
        assert_eq!(
            result,
            Err(DecodeError::Unknown {
                command: "foo".to_string()
            })
        );
    }

    #[test]
    fn test_decode_empty_payload_is_malformed() {
        assert!(matches!(
            decode_command(b""),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_whitespace_only_payload_is_malformed() {
        assert!(matches!(
            decode_command(b"  \n \n"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_invalid_utf8_is_malformed() {
        assert!(matches!(
            decode_command(&[0xFF, 0xFE, 0x6C]),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_trims_trailing_newline() {
        // A payload terminated with `\n` parses the same as one without.
        let cmd = decode_command(b"advertise\nSolSystem\n").expect("valid advertise");
        assert_eq!(
            cmd,
            Command::Advertise {
                system: "SolSystem".to_string()
            }
        );
    }
}
