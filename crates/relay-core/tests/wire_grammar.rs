//! Integration tests exercising the full request→registry→reply pipeline
//! through the crate's public API, the way the relay daemon drives it.

use std::time::{Duration, Instant};

use relay_core::protocol::framing::{encode_frame, payload_len, HEADER_LEN};
use relay_core::{decode_command, Command, ConnectionId, Notification, Response, ServerRegistry};

/// Drives an `add` request through decode, registration, and reply encoding,
/// then verifies a `list` from another peer reports the submitted fields.
#[test]
fn test_add_then_list_reports_submitted_fields() {
    // Arrange
    let mut registry = ServerRegistry::new();

    // Act – connection A registers a server
    let cmd = decode_command(b"add\n1.2.3.4\n6000\nSolSystem\nMy Server").expect("decode add");
    let Command::Add {
        addr,
        port,
        system,
        name,
    } = cmd
    else {
        panic!("expected Command::Add");
    };
    let id = registry.register(addr, port, system, name, ConnectionId(1));
    let reply = Response::AddOk(id.to_string()).encode();

    // Assert – the ack carries the generated id
    assert_eq!(reply, format!("add {id} ok").into_bytes());

    // Act – connection B lists
    assert_eq!(decode_command(b"list"), Ok(Command::List));
    let listing = String::from_utf8(Response::List(registry.snapshot()).encode()).unwrap();

    // Assert – exactly the submitted fields appear
    assert_eq!(listing, format!("list {id} 1.2.3.4 6000 SolSystem My Server"));
}

/// The advertise flow: the record takes the sender's reported address, the
/// name defaults to `Unknown`, and the broadcast payload names the system.
#[test]
fn test_advertise_uses_sender_address_and_unknown_name() {
    let mut registry = ServerRegistry::new();

    let cmd = decode_command(b"advertise\nSolSystem").expect("decode advertise");
    let Command::Advertise { system } = cmd else {
        panic!("expected Command::Advertise");
    };

    // The daemon fills in the sender's observed address and port.
    let id = registry.register(
        "192.168.1.50".to_string(),
        54321,
        system.clone(),
        "Unknown".to_string(),
        ConnectionId(3),
    );

    let record = &registry.snapshot()[0];
    assert_eq!(record.id, id);
    assert_eq!(record.addr, "192.168.1.50");
    assert_eq!(record.name, "Unknown");

    let broadcast = Notification::Advertise { system }.encode();
    assert_eq!(broadcast, b"advertise\nSolSystem\n");
}

/// A stale record is evicted and its deadvertise notification round-trips
/// back through the command decoder on the receiving side.
#[test]
fn test_evicted_record_produces_decodable_deadvertise() {
    let mut registry = ServerRegistry::new();
    registry.register(
        "1.2.3.4".to_string(),
        6000,
        "SolSystem".to_string(),
        "My Server".to_string(),
        ConnectionId(1),
    );

    let timeout = Duration::from_secs(5);
    let evicted = registry.evict_stale(timeout, Instant::now() + Duration::from_secs(6));
    assert_eq!(evicted.len(), 1);

    let payload = Notification::Deadvertise {
        system: evicted[0].system.clone(),
    }
    .encode();

    // A peer receiving the broadcast sees a well-formed two-line message.
    let text = String::from_utf8(payload).unwrap();
    let lines: Vec<&str> = text.trim_end().split('\n').collect();
    assert_eq!(lines, vec!["deadvertise", "SolSystem"]);
}

/// `find_peer` decodes a multi-word system, matches case-insensitively, and
/// misses cleanly.
#[test]
fn test_find_peer_end_to_end() {
    let mut registry = ServerRegistry::new();
    registry.register(
        "1.2.3.4".to_string(),
        6000,
        "Alpha Centauri".to_string(),
        "Frontier".to_string(),
        ConnectionId(1),
    );

    let Command::FindPeer { system } = decode_command(b"find_peer\nALPHA centauri").unwrap()
    else {
        panic!("expected Command::FindPeer");
    };

    let reply = match registry.find_system(&system) {
        Some(record) => Response::FindPeerMatch(record.clone()),
        None => Response::FindPeerMiss,
    };
    let text = String::from_utf8(reply.encode()).unwrap();
    assert!(text.starts_with("find_peer "));
    assert!(text.ends_with("1.2.3.4 6000 Alpha Centauri Frontier"));

    // A miss yields the fixed error line.
    assert!(registry.find_system("Vega").is_none());
    assert_eq!(
        Response::FindPeerMiss.encode(),
        b"find_peer error System not hosted"
    );
}

/// Frames produced by `encode_frame` survive header validation, so the
/// transport reader accepts everything the writer emits.
#[test]
fn test_frame_round_trip_for_every_reply_shape() {
    let replies = [
        Response::AddOk("id".into()).encode(),
        Response::List(Vec::new()).encode(),
        Response::FindPeerMiss.encode(),
        Response::CommandError {
            command: "foo".into(),
            message: "Unknown command".into(),
        }
        .encode(),
        Notification::Deadvertise {
            system: "SolSystem".into(),
        }
        .encode(),
    ];

    for payload in replies {
        let frame = encode_frame(&payload);
        let header: [u8; HEADER_LEN] = frame[..HEADER_LEN].try_into().unwrap();
        let len = payload_len(header).expect("writer-produced frames are always valid");
        assert_eq!(&frame[HEADER_LEN..HEADER_LEN + len], payload.as_slice());
    }
}
