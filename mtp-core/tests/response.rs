use mtp_core::RpcError;
use mtp_tl_types::mtproto::types;
use mtp_tl_types::{Boxed, Serializable};

// ── Classification of the message text ───────────────────────────────────────

#[test]
fn type_and_description_are_split() {
    let err = RpcError::new(420, "FLOOD_WAIT_30: retry later");
    assert_eq!(err.code(), 420);
    assert_eq!(err.kind(), "FLOOD_WAIT_30");
    assert_eq!(err.description(), "retry later");
}

#[test]
fn bare_type_has_empty_description() {
    let err = RpcError::new(400, "PEER_ID_INVALID");
    assert_eq!(err.kind(), "PEER_ID_INVALID");
    assert_eq!(err.description(), "");
}

#[test]
fn malformed_server_side_text_is_internal() {
    let err = RpcError::new(500, "something broke");
    assert_eq!(err.kind(), "INTERNAL_SERVER_ERROR");
    assert_eq!(err.description(), "something broke");

    let err = RpcError::new(-1, "");
    assert_eq!(err.kind(), "INTERNAL_SERVER_ERROR");
}

#[test]
fn malformed_client_side_text_is_bad_rpc_error() {
    let err = RpcError::new(400, "not an error type");
    assert_eq!(err.kind(), "CLIENT_BAD_RPC_ERROR");
    assert_eq!(err.description(), "Bad rpc error received, text = 'not an error type'");
}

// ── Taxonomy ─────────────────────────────────────────────────────────────────

#[test]
fn flood_wait_is_flood_and_temporary() {
    let err = RpcError::new(420, "FLOOD_WAIT_30");
    assert!(err.is_flood());
    assert!(err.is_temporary());
    assert!(err.is_default_handled());
    assert_eq!(err.flood_wait_seconds(), Some(30));
}

#[test]
fn premium_flood_wait_is_flood() {
    let err = RpcError::new(420, "FLOOD_PREMIUM_WAIT_7");
    assert!(err.is_flood());
    assert_eq!(err.flood_wait_seconds(), Some(7));
}

#[test]
fn encrypted_message_invalid_is_permanent() {
    let err = RpcError::new(400, "ENCRYPTED_MESSAGE_INVALID");
    assert!(!err.is_flood());
    assert!(!err.is_temporary());
    assert!(!err.is_default_handled());
    assert_eq!(err.flood_wait_seconds(), None);
}

#[test]
fn negative_codes_are_temporary_whatever_the_text() {
    for text in ["", "ENCRYPTED_MESSAGE_INVALID", "lowercase"] {
        assert!(RpcError::new(-1, text).is_temporary(), "{text:?}");
    }
    assert!(RpcError::new(503, "RPC_CALL_FAIL").is_temporary());
}

#[test]
fn wildcard_matching() {
    let err = RpcError::new(400, "PHONE_CODE_INVALID");
    assert!(err.is("PHONE_CODE_INVALID"));
    assert!(err.is("PHONE_CODE_*"));
    assert!(err.is("*_INVALID"));
    assert!(!err.is("PHONE_CODE"));
}

// ── Local errors and reply parsing ───────────────────────────────────────────

#[test]
fn local_errors_are_marked() {
    let err = RpcError::local("RESPONSE_PARSE_FAILED", "bad reply");
    assert_eq!(err.code(), 0);
    assert_eq!(err.kind(), "CLIENT_RESPONSE_PARSE_FAILED");
    assert!(err.is_local());
    assert!(!err.is_temporary());
    assert!(!RpcError::new(400, "CLIENT_LOOKALIKE").is_local());
}

#[test]
fn from_reply_parses_rpc_error() {
    let reply = Boxed(types::RpcError { error_code: 303, error_message: "USER_MIGRATE_4".into() })
        .to_primes();
    let err = RpcError::from_reply(&reply);
    assert_eq!(err.code(), 303);
    assert_eq!(err.kind(), "USER_MIGRATE_4");
}

#[test]
fn from_reply_falls_back_to_parse_failure() {
    let err = RpcError::from_reply(&[0x0bad_cafe, 1]);
    assert_eq!(err.kind(), "CLIENT_RESPONSE_PARSE_FAILED");
    assert_eq!(err.code(), 0);

    let truncated = Boxed(types::RpcError { error_code: 400, error_message: "X".into() }).to_primes();
    assert!(RpcError::from_reply(&truncated[..2]).is_local());
}

#[test]
fn display_includes_description() {
    assert_eq!(RpcError::new(420, "FLOOD_WAIT_5: 5").to_string(), "RPC 420: FLOOD_WAIT_5 (5)");
    assert_eq!(RpcError::new(400, "PEER_ID_INVALID").to_string(), "RPC 400: PEER_ID_INVALID");
}
