//! Curve-level constants used by key validation and signature checks.

use crate::u256;
use crate::Uint256;

/// Order of the secp256k1 group.
pub const SECPK1N: Uint256 =
    u256!(0xfffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141);

/// floor(n / 2); a signature with `s` above this is non-canonical.
pub const SECPK1N_HALF: Uint256 =
    u256!(0x7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0);

#[test]
fn half_order_is_half() {
    assert_eq!(SECPK1N_HALF.shl1().unwrap().wrapping_add(u256!(1)), SECPK1N);
}
