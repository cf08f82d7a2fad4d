use crate::error::Error;
use crate::packet::Packet;
use crate::time::{Duration, Instant};
use crate::wire::{Ipv4Address, TcpFlags, TcpSeqNumber};
use super::*;

const CLIENT_A: Ipv4Address = Ipv4Address::new(192, 168, 0, 10);
const CLIENT_B: Ipv4Address = Ipv4Address::new(192, 168, 0, 11);
const SERVER: Ipv4Address = Ipv4Address::new(10, 0, 0, 80);
const LOCALHOST: Ipv4Address = Ipv4Address::new(127, 0, 0, 1);

fn packet(src: (Ipv4Address, u16), dst: (Ipv4Address, u16), flags: TcpFlags, seq: u32, millis: i64)
    -> Packet
{
    Packet {
        timestamp: Instant::from_millis(millis),
        src_addr: src.0,
        dst_addr: dst.0,
        src_port: src.1,
        dst_port: dst.1,
        seq_number: TcpSeqNumber::from_u32(seq),
        ack_number: TcpSeqNumber(0),
        payload_len: 0,
        flags,
        timestamps: None,
    }
}

fn syn(src: (Ipv4Address, u16), dst: (Ipv4Address, u16)) -> Packet {
    packet(src, dst, TcpFlags::SYN, 100, 0)
}

#[test]
fn open_starts_sample() {
    let connection = Connection::open(&syn((CLIENT_A, 1234), (SERVER, 80)));
    assert_eq!(connection.tuple(), FourTuple {
        src_addr: CLIENT_A,
        src_port: 1234,
        dst_addr: SERVER,
        dst_port: 80,
    });
    assert_eq!(connection.start(), Instant::from_millis(0));
    assert!(!connection.is_established());
    assert_eq!(connection.initial_rtt(), None);

    let samples = connection.samples(Direction::SrcToDst);
    assert_eq!(samples.len(), 1);
    assert!(samples.contains(TcpSeqNumber(101)));
    assert!(connection.samples(Direction::DstToSrc).is_empty());
}

#[test]
fn packet_relations() {
    let connection = Connection::open(&syn((CLIENT_A, 1234), (SERVER, 80)));
    let outgoing = packet((CLIENT_A, 1234), (SERVER, 80), TcpFlags::ACK, 101, 10);
    let incoming = packet((SERVER, 80), (CLIENT_A, 1234), TcpFlags::ACK, 500, 10);
    let other_peer = packet((SERVER, 80), (CLIENT_B, 4321), TcpFlags::ACK, 500, 10);
    let other_port = packet((CLIENT_A, 1235), (SERVER, 443), TcpFlags::ACK, 500, 10);

    assert!(connection.belongs_to(&outgoing));
    assert!(connection.belongs_to(&incoming));
    assert!(connection.belongs_to(&other_peer));
    assert!(!connection.belongs_to(&other_port));

    assert!(connection.is_outgoing(&outgoing));
    assert!(!connection.is_incoming(&outgoing));
    assert!(connection.is_incoming(&incoming));
    assert!(!connection.is_outgoing(&incoming));
    assert!(!connection.is_outgoing(&other_peer));
    assert!(!connection.is_incoming(&other_peer));

    assert_eq!(connection.direction_of(&outgoing), Some(Direction::SrcToDst));
    assert_eq!(connection.direction_of(&incoming), Some(Direction::DstToSrc));
    assert_eq!(connection.direction_of(&other_peer), None);
    // Same addresses but a different client port is still attributed by address.
    assert_eq!(connection.direction_of(&other_port), Some(Direction::SrcToDst));
}

#[test]
fn direction_on_one_host() {
    let connection = Connection::open(&syn((LOCALHOST, 1234), (LOCALHOST, 80)));
    let reply = packet((LOCALHOST, 80), (LOCALHOST, 1234), TcpFlags::ACK, 500, 10);
    assert!(connection.is_outgoing(&reply));
    assert!(connection.is_incoming(&reply));
    assert_eq!(connection.direction_of(&reply), Some(Direction::DstToSrc));
}

#[test]
fn samples_per_direction() {
    let mut connection = Connection::open(&syn((CLIENT_A, 1234), (SERVER, 80)));
    connection.add_sample(Direction::DstToSrc, TcpSeqNumber(501), Instant::from_millis(50))
        .unwrap();
    // The same key in the other direction is independent.
    connection.add_sample(Direction::SrcToDst, TcpSeqNumber(501), Instant::from_millis(60))
        .unwrap();

    match connection.add_sample(Direction::DstToSrc, TcpSeqNumber(501), Instant::from_millis(70)) {
        Err(Error::DuplicateSample(_)) => (),
        other => panic!("expected a duplicate sample, got {:?}", other),
    }

    let sample = connection.find_sample(Direction::DstToSrc, TcpSeqNumber(501)).unwrap();
    assert_eq!(sample.sent_at(), Instant::from_millis(50));
    assert_eq!(sample.complete(Instant::from_millis(100)), Some(Duration::from_millis(50)));
    assert!(connection.find_sample(Direction::DstToSrc, TcpSeqNumber(502)).is_none());
}

#[test]
fn establish_once() {
    let mut connection = Connection::open(&syn((CLIENT_A, 1234), (SERVER, 80)));
    assert_eq!(connection.establish(Instant::from_millis(100)), Some(Duration::from_millis(100)));
    assert!(connection.is_established());
    assert_eq!(connection.establish(Instant::from_millis(300)), None);
    assert_eq!(connection.initial_rtt(), Some(Duration::from_millis(100)));
}

#[test]
fn table_four_tuple() {
    let mut table = ConnectionTable::new(MatchMode::FourTuple);
    assert_eq!(table.append(Connection::open(&syn((CLIENT_A, 1000), (SERVER, 80)))), 0);
    assert_eq!(table.append(Connection::open(&syn((CLIENT_B, 2000), (SERVER, 80)))), 1);

    let to_b = packet((SERVER, 80), (CLIENT_B, 2000), TcpFlags::ACK, 1, 10);
    let from_a = packet((CLIENT_A, 1000), (SERVER, 80), TcpFlags::ACK, 1, 10);
    let stray = packet((CLIENT_A, 1001), (SERVER, 80), TcpFlags::ACK, 1, 10);
    assert_eq!(table.find(&to_b), Some(1));
    assert_eq!(table.find(&from_a), Some(0));
    assert_eq!(table.find(&stray), None);
    assert_eq!(table.find_mut(&to_b).map(|c| c.src_addr()), Some(CLIENT_B));
}

#[test]
fn table_port_only() {
    let mut table = ConnectionTable::new(MatchMode::PortOnly);
    assert_eq!(table.mode(), MatchMode::PortOnly);
    table.append(Connection::open(&syn((CLIENT_A, 1000), (SERVER, 80))));
    table.append(Connection::open(&syn((CLIENT_B, 2000), (SERVER, 80))));

    // Any packet from the server port is attributed to the first connection.
    let to_b = packet((SERVER, 80), (CLIENT_B, 2000), TcpFlags::ACK, 1, 10);
    assert_eq!(table.find(&to_b), Some(0));
    // Only the source port counts.
    let from_b = packet((CLIENT_B, 2000), (SERVER, 80), TcpFlags::ACK, 1, 10);
    assert_eq!(table.find(&from_b), Some(1));
    let unrelated = packet((CLIENT_B, 3000), (SERVER, 8080), TcpFlags::ACK, 1, 10);
    assert_eq!(table.find(&unrelated), None);
}

#[test]
fn table_reopened_flow() {
    let mut table = ConnectionTable::new(MatchMode::default());
    table.append(Connection::open(&syn((CLIENT_A, 1000), (SERVER, 80))));
    table.append(Connection::open(&syn((CLIENT_A, 1000), (SERVER, 80))));
    assert_eq!(table.len(), 2);

    let reply = packet((SERVER, 80), (CLIENT_A, 1000), TcpFlags::ACK, 1, 10);
    assert_eq!(table.find(&reply), Some(0));
}

#[test]
fn table_simultaneous_open() {
    let mut table = ConnectionTable::new(MatchMode::FourTuple);
    table.append(Connection::open(&syn((SERVER, 80), (CLIENT_A, 1000))));
    table.append(Connection::open(&syn((CLIENT_A, 1000), (SERVER, 80))));

    // Both orientations match, the first discovered connection wins.
    let from_a = packet((CLIENT_A, 1000), (SERVER, 80), TcpFlags::ACK, 1, 10);
    assert_eq!(table.find(&from_a), Some(0));
}

#[test]
fn tuple_display() {
    let connection = Connection::open(&syn((CLIENT_A, 1234), (SERVER, 80)));
    assert_eq!(format!("{}", connection.tuple()), "192.168.0.10:1234 -> 10.0.0.80:80");
    assert_eq!(format!("{}", connection.tuple().reverse()), "10.0.0.80:80 -> 192.168.0.10:1234");
}
