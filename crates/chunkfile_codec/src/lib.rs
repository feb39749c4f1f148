//! # chunkfile Codec
//!
//! Compression transforms applied to chunk data payloads.
//!
//! Each chunk records the tag of the codec that produced its stored bytes, so
//! a single container may mix codecs. Headers are never compressed.
//!
//! ## Codec Tags
//!
//! | Tag | Codec                    |
//! |-----|--------------------------|
//! | 0   | none (passthrough)       |
//! | 1   | zstd                     |
//!
//! ## Usage
//!
//! ```
//! use chunkfile_codec::{CodecRegistry, Compression};
//!
//! let registry = CodecRegistry::default();
//! let codec = registry.get(Compression::Zstd.tag()).unwrap();
//!
//! let packed = codec.compress(b"aaaaaaaaaaaaaaaa").unwrap();
//! let unpacked = codec.decompress(&packed, 16).unwrap();
//! assert_eq!(unpacked, b"aaaaaaaaaaaaaaaa");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod registry;

pub use codec::{Codec, Compression, PassThrough, ZstdCodec, DEFAULT_ZSTD_LEVEL};
pub use error::{CodecError, CodecResult};
pub use registry::CodecRegistry;
