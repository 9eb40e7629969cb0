pub mod block;
pub mod model;
pub mod payload;

pub use block::Block;
pub use model::Blockchain;

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// A SHA-256 hex digest has 64 characters; anything above can never be mined.
pub const MAX_DIFFICULTY: u32 = 64;

/// Hash and previous hash of the genesis block. Never a real SHA-256 digest.
pub const GENESIS_HASH: &str = "0";
