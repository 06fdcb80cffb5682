//! Bitcoin utilities: address classification, key/payment derivation, PSBT hand-off

pub mod address;
pub mod keys;
pub mod psbt;

pub use address::*;
pub use keys::*;
pub use psbt::*;
