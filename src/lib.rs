//! # lzwc
//!
//! Compress or expand files with a variable-width LZW codec.
//! * `lzw` is the encoder/decoder pair, backed by a de-la-Briandais trie on the
//!   encode side and a back-pointer symbol table on the decode side.
//! * `tools::bitio` is the bit-level reader/writer shared by both directions.
//! * `tools::dlb` is the arena-backed trie used by the encoder.
//!
//! The compression/expansion functions are generics that operate on `Read`/`Write`
//! trait objects. There are convenience functions for working directly with files
//! and with in-memory buffers.
//!
//! ## File Example
//!
//! ```rs
//! use lzwc::lzw;
//! let (in_size, out_size) = lzw::compress_file(std::path::Path::new("some_input.txt"), false)
//!     .expect("compression failed");
//! eprintln!("compressed {} into {}", in_size, out_size);
//! ```
//!
//! ## Buffer Example
//!
//! ```rs
//! use lzwc::lzw;
//! let test_data = "This is the chaunt of the priests.".as_bytes();
//! let compressed = lzw::compress_slice(test_data, false).expect("compression failed");
//! ```

mod tools;
pub mod lzw;

/// Reserved EOF codeword.
pub const R: usize = 256;
/// Minimum codeword width in bits.
pub const L_MIN: u8 = 9;
/// Maximum codeword width in bits.
pub const L_MAX: u8 = 16;

/// Extension written for compressed output.
pub const EXT_COMPRESSED: &str = "lzwc";
/// Extension written for decompressed output.
pub const EXT_EXPANDED: &str = "lzwd";

/// Errors produced by the codec core.
///
/// These are the only errors the core can raise; I/O failures from the
/// underlying source/sink are wrapped rather than leaking a bare `std::io::Error`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open input: {0}")]
    IoOpen(std::io::Error),
    #[error("read error: {0}")]
    IoRead(std::io::Error),
    #[error("write error: {0}")]
    IoWrite(std::io::Error),
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("invalid bit width {0}")]
    InvalidBitWidth(usize),
    #[error("malformed compressed stream: {0}")]
    MalformedStream(String),
}
