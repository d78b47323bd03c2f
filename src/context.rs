use secp256k1::{All, Secp256k1};
use std::sync::OnceLock;

static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();

/// Shared signing/verification context, created on first use.
pub fn context() -> &'static Secp256k1<All> {
    CONTEXT.get_or_init(Secp256k1::new)
}
