//! In-memory MTProto request layer demo.
//!
//! # What this does
//!
//! 1. Starts a loopback [`Instance`] that answers requests itself
//! 2. Sends `ping` through a [`ConcurrentSender`] and awaits the `pong`
//! 3. Sends a `ping` the loopback answers with `FLOOD_WAIT_1` once:
//!    - with the default policy the instance retries and the caller only
//!      sees the final `pong`
//!    - with `handle_flood_errors` the caller gets the error
//! 4. Binds a temporary key with a [`DcKeyChecker`], then tries again with
//!    a persistent key the loopback does not know
//!
//! # Run
//! ```text
//! RUST_LOG=debug cargo run -p mtp-loopback
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mtp_core::message::next_msg_id;
use mtp_core::{
    Config, ConcurrentSender, DcKeyChecker, Instance, InstanceRef, RequestId, Response,
    ResponseHandler, RpcError, Runner, SerializedRequest, ShiftedDcId, dc,
};
use mtp_crypto::{AuthKey, Side, decrypt_oldmtp};
use mtp_tl_types::mtproto::functions::Ping;
use mtp_tl_types::mtproto::functions::auth::BindTempAuthKey;
use mtp_tl_types::mtproto::types::{self, Pong};
use mtp_tl_types::{Boxed, Buffer, Deserializable, Serializable, dump, ids};

/// `ping_id` the loopback answers with a flood wait the first time.
const FLOODED_PING: u64 = 0xF100D;

const MAIN_DC: i32 = 2;

// ── Loopback instance ─────────────────────────────────────────────────────────

struct Loopback {
    known_key: Arc<AuthKey>,
    flooded: AtomicBool,
}

impl Loopback {
    fn new(known_key: Arc<AuthKey>) -> Self {
        Self { known_key, flooded: AtomicBool::new(false) }
    }

    /// Play the server: compute the reply to one request body.
    fn answer(&self, body: &[i32]) -> Result<Buffer, RpcError> {
        match body.first().map(|&p| p as u32) {
            Some(ids::PING) => {
                let ping = Boxed::<Ping>::from_primes(body)
                    .map_err(|e| RpcError::new(400, &format!("INPUT_METHOD_INVALID: {e}")))?;
                if ping.ping_id == FLOODED_PING && !self.flooded.swap(true, Ordering::SeqCst) {
                    return Err(RpcError::new(420, "FLOOD_WAIT_1: 1"));
                }
                Ok(Boxed(Pong { msg_id: next_msg_id(0), ping_id: ping.ping_id }).to_primes())
            }
            Some(ids::AUTH_BIND_TEMP_AUTH_KEY) => Ok(self.bind(body)),
            _ => Err(RpcError::new(400, "INPUT_METHOD_INVALID")),
        }
    }

    fn bind(&self, body: &[i32]) -> Buffer {
        let invalid = || {
            Boxed(types::RpcError {
                error_code: 400,
                error_message: "ENCRYPTED_MESSAGE_INVALID".into(),
            })
            .to_primes()
        };
        let Ok(Boxed(bind)) = Boxed::<BindTempAuthKey>::from_primes(body) else {
            return invalid();
        };
        match decrypt_oldmtp(&self.known_key, &bind.encrypted_message, Side::Client) {
            Ok(plain) => {
                tracing::info!("[loopback] bind accepted, {} bytes of inner message", plain.len());
                Boxed(true).to_primes()
            }
            Err(e) => {
                tracing::info!("[loopback] bind rejected: {e}");
                invalid()
            }
        }
    }
}

impl Instance for Loopback {
    fn send_serialized(
        &self,
        request_id: RequestId,
        request: SerializedRequest,
        mut handler: ResponseHandler,
        dc: ShiftedDcId,
        can_wait: Duration,
        after: Option<RequestId>,
    ) {
        tracing::debug!(
            "[loopback] request {request_id} → dc {dc} (wait {can_wait:?}, after {after:?})"
        );
        let mut body = Vec::new();
        request.write(&mut body);
        tracing::trace!("[loopback] body: {}", dump::dump_lossy(&body));

        loop {
            let respond = |reply| Response { reply, outer_msg_id: next_msg_id(0), request_id };
            match self.answer(&body) {
                Ok(reply) => {
                    (handler.done)(&respond(reply));
                    return;
                }
                Err(error) => {
                    if (handler.fail)(&error, &respond(Vec::new())) {
                        return;
                    }
                    let wait = error.flood_wait_seconds().unwrap_or(1);
                    tracing::info!("[loopback] {error} left to default handling, retrying in {wait}s");
                    std::thread::sleep(Duration::from_secs(wait));
                }
            }
        }
    }

    fn cancel(&self, request_id: RequestId) {
        tracing::debug!("[loopback] cancel {request_id}");
    }

    fn kill_session(&self, dc: ShiftedDcId) {
        tracing::info!("[loopback] session to dc {dc} killed");
    }

    fn key_destroyed_on_server(&self, dc: ShiftedDcId, key_id: u64) {
        tracing::warn!("[loopback] key {key_id} destroyed on dc {dc}");
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn random_key() -> AuthKey {
    let mut data = [0u8; 256];
    mtp_crypto::random::fill(&mut data);
    AuthKey::from_bytes(data)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("\n✗ {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let persistent = Arc::new(random_key());
    let loopback = Arc::new(Loopback::new(Arc::clone(&persistent)));
    let runtime = tokio::runtime::Handle::current();
    let instance = InstanceRef::new(&loopback, Runner::tokio(runtime.clone()));
    let sender = ConcurrentSender::new(instance.clone(), Runner::tokio(runtime));

    // ── 1. Plain ping ─────────────────────────────────────────────────────────
    let pong = sender
        .request(Ping { ping_id: 42 })
        .to_dc(MAIN_DC)
        .send_awaitable()
        .await?;
    println!("✓ pong for ping {}", pong.ping_id);

    // ── 2. Flood wait, default policy ─────────────────────────────────────────
    let pong = sender
        .request(Ping { ping_id: FLOODED_PING })
        .to_dc(MAIN_DC)
        .send_awaitable()
        .await?;
    println!("✓ flooded ping retried by the instance, pong for {:#x}", pong.ping_id);

    // ── 3. Flood wait surfaced to the caller ──────────────────────────────────
    loopback.flooded.store(false, Ordering::SeqCst);
    match sender
        .request(Ping { ping_id: FLOODED_PING })
        .to_dc(MAIN_DC)
        .handle_flood_errors()
        .send_awaitable()
        .await
    {
        Ok(_) => println!("✗ expected a flood wait"),
        Err(e) => println!("✓ caller saw {e}, wait {:?}s", e.flood_wait_seconds()),
    }

    // ── 4. Temp key binding ───────────────────────────────────────────────────
    let bind_dc = dc::shift_dc_id(MAIN_DC, 0);
    let temporary = random_key();
    let session_id = mtp_crypto::random::u64();

    for (label, key) in [("known", persistent), ("unknown", Arc::new(random_key()))] {
        let mut checker = DcKeyChecker::new(Config::default(), instance.clone(), bind_dc, key);
        let request = checker.prepare_request(&temporary, session_id);
        let mut body = Vec::new();
        request.write(&mut body);
        let reply = loopback.answer(&body)?;
        let handled = checker.handle_response(request.msg_id(), &reply);
        println!("✓ bind with {label} persistent key handled: {handled}");
    }

    // Let the posted kill_session / key_destroyed calls run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
