//! Sync protocol adapters.

pub mod bincode_codec;

pub use bincode_codec::BincodeCodec;
