//! Shared fixtures for the integration tests.

use rand::rngs::StdRng;
use rand::SeedableRng;
use signet::RsaKeyHandler;
use std::sync::OnceLock;

/// The happy-path transaction: one input stream, one output stream.
#[allow(dead_code)]
pub const HAPPY_PATH_TX: &str = r#"{"$tx":{"$namespace":"ns","$contract":"c","$i":{"stream_A":{"amount":10}},"$o":{"stream_B":{}}},"$sigs":{}}"#;

/// A fixed keypair, generated once per test binary from a seeded RNG.
#[allow(dead_code)]
pub fn test_key() -> &'static RsaKeyHandler {
    static KEY: OnceLock<RsaKeyHandler> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaKeyHandler::generate_with(&mut StdRng::seed_from_u64(0x7e57_4b3f)).unwrap()
    })
}
