//! Crate-wide error type.
//!
//! The wire-level contract is a single pass/fail signal, but internally we
//! keep the failure kinds distinguishable for diagnostics and for tests
//! that assert a specific cause, even though most callers only care whether
//! the overall operation succeeded.

/// All failure kinds the codec can report.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Input is shorter than the 4-byte master header.
    #[error("input too short to contain a master header")]
    InputTooShort,
    /// Caller-provided output buffer is smaller than the announced decoded size.
    #[error("output buffer smaller than the announced decoded size")]
    OutputTooSmall,
    /// Input exceeds the 4-byte master header's `u32` decoded-size range.
    #[error("input exceeds the maximum decoded size representable in a master header")]
    InputTooLarge,
    /// A checked bit-stream read would run past the end of its block.
    #[error("truncated input: read past end of block payload")]
    TruncatedInput,
    /// Block header declares an encoding mode outside {0,1,2}.
    #[error("block declares an invalid encoding mode")]
    InvalidMode,
    /// Recovering a Huffman tree required more than `MAX_TREE_NODES` nodes.
    #[error("huffman tree exceeds the maximum node count")]
    TreeTooLarge,
    /// A decoded symbol fell outside the valid alphabet `0..=260`.
    #[error("decoded symbol is out of range for the alphabet")]
    SymbolOutOfRange,
    /// A block's declared `encoded_size` extends past the input buffer.
    #[error("block's encoded_size extends past the input buffer")]
    EncodedSizePastEnd,
    /// CRC-32C mismatch between a block's header and its payload.
    #[error("CRC-32C mismatch on block payload")]
    ChecksumMismatch,
    /// Decoding a literal or RLE run would overflow the caller's output buffer.
    #[error("decoded output would overflow the caller's output buffer")]
    OutputOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
