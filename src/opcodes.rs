//! Intrinsic gas constants from the fee schedule.

/// Paid for every transaction.
pub const GTXCOST: u32 = 21_000;
/// Paid for every zero byte of transaction data.
pub const GTXDATAZERO: u32 = 4;
/// Paid for every non-zero byte of transaction data.
pub const GTXDATANONZERO: u32 = 68;
