use mtp_core::request::{
    MESSAGE_BODY_POSITION, SerializedRequest, constructor_needs_ack, padding_words,
};
use mtp_tl_types::mtproto::functions::Ping;
use mtp_tl_types::mtproto::types::{MsgsAck, MsgsStateReq};
use mtp_tl_types::{Boxed, Deserializable, ids};

fn ping(ping_id: u64) -> SerializedRequest {
    SerializedRequest::serialize(&Boxed(Ping { ping_id }))
}

// ── Layout ───────────────────────────────────────────────────────────────────

#[test]
fn prepare_reserves_header_and_declares_length() {
    let request = SerializedRequest::prepare(5);
    assert_eq!(request.len(), MESSAGE_BODY_POSITION);
    assert_eq!(request.as_slice()[7], 20);
    assert_eq!(request.msg_id(), 0);
}

#[test]
fn serialize_appends_body_after_header() {
    let request = ping(0x0102_0304_0506_0708);
    assert_eq!(request.len(), MESSAGE_BODY_POSITION + 3);
    assert_eq!(request.inner_length(), 12);
    assert_eq!(request.message_size(), 4 + 3);
    assert_eq!(request.body_constructor(), Some(ids::PING));

    let mut body = Vec::new();
    request.write(&mut body);
    assert_eq!(Boxed::<Ping>::from_primes(&body).unwrap().ping_id, 0x0102_0304_0506_0708);
}

#[test]
fn msg_id_and_seq_no_live_in_the_header() {
    let mut request = ping(1);
    request.set_msg_id(0xAABB_CCDD_0000_0004);
    request.set_seq_no(7);
    assert_eq!(request.msg_id(), 0xAABB_CCDD_0000_0004);
    assert_eq!(request.seq_no(), 7);
    assert_eq!(request.as_slice()[4], 4);
}

// ── Padding ──────────────────────────────────────────────────────────────────

#[test]
fn old_padding_rounds_to_blocks() {
    assert_eq!(padding_words(0, false, true), 0);
    assert_eq!(padding_words(1, false, true), 3);
    assert_eq!(padding_words(3, false, true), 1);
    assert_eq!(padding_words(4, false, true), 0);
}

#[test]
fn new_padding_adds_at_least_three_words() {
    for words in 0..32 {
        let padding = padding_words(words, false, false);
        assert!((3..=6).contains(&padding), "{words} words → {padding}");
        assert_eq!((MESSAGE_BODY_POSITION + words + padding) % 4, 0);
    }
}

#[test]
fn extended_padding_stays_block_aligned() {
    for words in 0..64 {
        let padding = padding_words(words, true, false);
        assert!(padding >= 3 && padding <= 6 + 60);
        assert_eq!((MESSAGE_BODY_POSITION + words + padding) % 4, 0);
    }
}

#[test]
fn add_padding_keeps_body_and_aligns() {
    let mut request = ping(5);
    let before: Vec<_> = request.as_slice().to_vec();
    request.add_padding(false, false);

    assert_eq!(request.len() % 4, 0);
    assert!(request.len() >= before.len() + 3);
    assert_eq!(&request.as_slice()[..before.len()], &before[..]);
    assert_eq!(request.inner_length(), 12);

    // Repadding in old mode trims back to the minimum.
    request.add_padding(false, true);
    assert_eq!(request.len(), 12);
}

#[test]
fn randomize_header_leaves_msg_id_alone() {
    let mut request = ping(5);
    request.set_msg_id(400);
    request.randomize_header();
    assert_eq!(request.msg_id(), 400);
    assert_eq!(request.inner_length(), 12);
}

// ── Predicates ───────────────────────────────────────────────────────────────

#[test]
fn service_constructors_need_no_ack() {
    for cons in [
        ids::MSG_CONTAINER,
        ids::MSGS_ACK,
        ids::HTTP_WAIT,
        ids::BAD_MSG_NOTIFICATION,
        ids::MSGS_ALL_INFO,
        ids::MSGS_STATE_INFO,
        ids::MSG_DETAILED_INFO,
        ids::MSG_NEW_DETAILED_INFO,
    ] {
        assert!(!constructor_needs_ack(cons), "{cons:#x}");
    }
    assert!(constructor_needs_ack(ids::PING));
    assert!(constructor_needs_ack(ids::MSGS_STATE_REQ));
}

#[test]
fn need_ack_and_state_request_read_the_body() {
    let ack = SerializedRequest::serialize(&Boxed(MsgsAck { msg_ids: Boxed(vec![4u64].into()) }));
    assert!(!ack.need_ack());
    assert!(!ack.is_state_request());

    let state = SerializedRequest::serialize(&Boxed(MsgsStateReq { msg_ids: Boxed(vec![8u64].into()) }));
    assert!(state.need_ack());
    assert!(state.is_state_request());

    assert!(ping(1).need_ack());
}

#[test]
fn short_buffers_are_no_ops() {
    let empty = SerializedRequest::default();
    let header_only = SerializedRequest::prepare(0);
    for request in [&empty, &header_only] {
        assert_eq!(request.inner_length(), 0);
        assert_eq!(request.message_size(), 0);
        assert!(!request.is_sent_container());
        assert!(!request.is_state_request());
        assert!(!request.need_ack());
        let mut out = Vec::new();
        request.write(&mut out);
        assert!(out.is_empty());
    }
    let mut empty = empty;
    empty.set_msg_id(4);
    assert_eq!(empty.msg_id(), 0);
}

// ── Containers ───────────────────────────────────────────────────────────────

#[test]
fn sent_container_records_ids() {
    let wrap = SerializedRequest::sent_container(&[4, 8, 1 << 40]);
    assert!(wrap.is_sent_container());
    assert_eq!(wrap.contained_msg_ids(), vec![4, 8, 1 << 40]);

    let mut sent = ping(1);
    sent.set_seq_no(1);
    assert!(!sent.is_sent_container());

    let mut sent = ping(1);
    sent.last_sent_time = 1_000;
    assert!(!sent.is_sent_container());
}

#[test]
fn sent_container_ids_can_be_replaced() {
    let mut wrap = SerializedRequest::sent_container(&[4, 8]);
    assert!(wrap.replace_contained_msg_id(8, 12));
    assert!(!wrap.replace_contained_msg_id(100, 104));
    assert_eq!(wrap.contained_msg_ids(), vec![4, 12]);
}

#[test]
fn container_body_holds_inner_messages() {
    let mut a = ping(1);
    a.set_msg_id(100);
    a.set_seq_no(1);
    a.add_padding(false, false);
    let mut b = ping(2);
    b.set_msg_id(104);
    b.set_seq_no(3);

    let container = SerializedRequest::container(&[a.clone(), b.clone()]);
    assert_eq!(container.body_constructor(), Some(ids::MSG_CONTAINER));
    assert!(!container.need_ack());
    assert_eq!(container.inner_length(), (2 + a.message_size() + b.message_size()) * 4);

    let body = &container.as_slice()[MESSAGE_BODY_POSITION..];
    assert_eq!(body[1], 2);
    // msg_id, seq_no, length, then the unpadded body of `a`.
    assert_eq!(&body[2..6], &[100, 0, 1, 12]);
    assert_eq!(body[6] as u32, ids::PING);
    assert_eq!(&body[9..13], &[104, 0, 3, 12]);
    assert_eq!(body.len(), 2 + 7 + 7);
}
