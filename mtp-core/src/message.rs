//! Message and request identifiers.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A 64-bit MTProto message identifier.
pub type MsgId = u64;

/// Identifier of one logical request, unique among outstanding requests.
pub type RequestId = i32;

static LAST_MSG_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_REQUEST_ID: AtomicI32 = AtomicI32::new(1);

fn since_epoch() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// Current unix time in seconds.
pub fn unixtime() -> i64 {
    since_epoch().as_secs() as i64
}

/// Current unix time in milliseconds.
pub fn now_ms() -> i64 {
    since_epoch().as_millis() as i64
}

/// Allocate a new message id.
///
/// The high 32 bits are the unix time shifted by `time_offset` seconds, the
/// low 32 bits the sub-second fraction. Ids are divisible by 4 and strictly
/// increasing across the whole process, even if the clock steps back.
pub fn next_msg_id(time_offset: i32) -> MsgId {
    let now = since_epoch();
    let secs = (now.as_secs() as i64 + i64::from(time_offset)).max(0) as u64;
    let candidate = (secs << 32) | (u64::from(now.subsec_nanos()) << 2);

    let next = |last: MsgId| candidate.max(last + 4);
    match LAST_MSG_ID.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(next(last))) {
        Ok(last) | Err(last) => next(last),
    }
}

/// Allocate a new request id: positive, starting at 1, wrapping back to 1.
pub fn next_request_id() -> RequestId {
    let bump = |id: RequestId| if id == RequestId::MAX { 1 } else { id + 1 };
    match NEXT_REQUEST_ID.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| Some(bump(id))) {
        Ok(id) | Err(id) => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_ids_are_aligned_and_increasing() {
        let mut last = 0;
        for _ in 0..1000 {
            let id = next_msg_id(0);
            assert_eq!(id % 4, 0);
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn time_offset_moves_the_high_word() {
        let plain = next_msg_id(0) >> 32;
        let shifted = next_msg_id(3600) >> 32;
        assert!(shifted >= plain + 3599);
    }

    #[test]
    fn request_ids_are_positive() {
        let a = next_request_id();
        let b = next_request_id();
        assert!(a > 0 && b > 0);
        assert_ne!(a, b);
    }
}
