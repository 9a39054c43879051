//! Single-pass adaptive Huffman compression (FGK).
//!
//! The code tree is built and rebalanced symbol by symbol from the data
//! itself, so no statistics pass and no code table are needed: encoder and
//! decoder reproduce the same tree from the same symbol sequence.
//!
//! ```
//! let packed = fgk::compress_bytes(b"abracadabra")?;
//! let unpacked = fgk::decompress_bytes(&packed)?;
//! assert_eq!(unpacked, b"abracadabra");
//! # Ok::<(), fgk::StreamError>(())
//! ```

use std::io;

use thiserror::Error;

pub mod bitio;
pub mod codec;
pub mod container;
pub mod observer;
pub mod tree;

#[cfg(test)]
mod validation;

pub use bitio::BitOrder;
pub use codec::{
    compress, compress_bytes, compress_observed, decompress, decompress_bytes,
    decompress_with_options, DecompressOptions, Decoder, Encoder,
};
pub use observer::{NoopObserver, TracingObserver, TreeObserver};
pub use tree::{AdaptiveTree, Node, NodeId};

/// Error types for FGK tree and codec operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FgkError {
    /// The 4-byte length header could not be read in full.
    #[error("truncated header: expected 4 bytes, found {found}")]
    TruncatedHeader { found: usize },
    /// The bit stream ended before the declared number of symbols.
    #[error("bit stream exhausted after {decoded} of {expected} symbols")]
    UnexpectedEof { decoded: u32, expected: u32 },
    /// Neither candidate bit order reproduces a valid first code.
    #[error("unable to determine the bit order of the stream")]
    UnknownBitOrder,
    /// Input does not fit the 32-bit length header.
    #[error("input of {0} bytes does not fit a 32-bit length header")]
    InputTooLarge(u64),
    /// The source yielded a different number of bytes than it reported.
    #[error("source length changed: header declares {declared} bytes, read {actual}")]
    LengthMismatch { declared: u32, actual: u64 },
    /// The decoder reached a leaf that carries no symbol.
    #[error("invalid code in bit stream")]
    InvalidCode,
    /// A node id does not name a node of the tree.
    #[error("node {0} does not exist in the tree")]
    InvalidNode(usize),
    /// `split_nyt` was asked to introduce a symbol that already has a leaf.
    #[error("symbol {0:#04x} is already present in the tree")]
    SymbolAlreadyPresent(u8),
    /// All 256 symbols have been introduced; there is no NYT left to split.
    #[error("all 256 symbols are already present in the tree")]
    AlphabetExhausted,
    /// A structural tree invariant does not hold.
    #[error("tree invariant violated: {0}")]
    BrokenInvariant(String),
}

pub type FgkResult<T> = Result<T, FgkError>;

/// Error type for whole-stream operations.
///
/// Wraps both codec errors (`FgkError`) and I/O errors. Kept separate from
/// `FgkError` so that `FgkError` retains `Clone + PartialEq`.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Format or tree error.
    #[error(transparent)]
    Fgk(#[from] FgkError),
    /// I/O error from the source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for whole-stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
