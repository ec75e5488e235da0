//! Particle is the value codec of a distributed key-value database client.
//!
//! Core concepts:
//! - **Natural**: An application-level value before classification
//! - **Value**: A value in wire form, tagged with its particle type
//! - **Particle type**: The server's one-byte type discriminant
//! - **Packer**: Append-only MessagePack encoder for collection values
//! - **Opaque**: Any other serializable object, stored as a blob
//!
//! Every `Value` has two encodings. The flat encoding is produced in two
//! phases: `estimate_size` across a whole batch, then `write` into a buffer
//! of exactly the summed size. The packed encoding streams into a
//! [`Packer`] and is used for collection operations.
//!
//! # Example
//!
//! ```
//! use particle_core::{CodecConfig, Natural, ParticleType, Value};
//!
//! let config = CodecConfig::default();
//! let values = [
//!     Value::from_natural("hello", &config),
//!     Value::from_natural(Natural::list([1i64, 2, 3]), &config),
//! ];
//!
//! let size: usize = values
//!     .iter()
//!     .map(|v| v.estimate_size(&config))
//!     .sum::<Result<_, _>>()
//!     .unwrap();
//! let mut buffer = vec![0u8; size];
//! let mut offset = 0;
//! for value in &values {
//!     offset += value.write(&mut buffer, offset);
//! }
//! assert_eq!(offset, size);
//! assert_eq!(values[1].particle_type().unwrap(), ParticleType::List);
//! ```

extern crate self as particle_core;

pub mod blob;
pub mod buffer;
mod config;
mod dispatch;
mod error;
mod natural;
mod packer;
mod particle;
mod partition;
mod script;
mod value;

pub use blob::{BlobObject, Opaque};
pub use config::{CodecConfig, CodecConfigBuilder};
pub use error::{ResultCode, ValueError};
pub use natural::{Natural, Symbol};
pub use packer::Packer;
pub use particle::{MapOrder, ParticleType};
pub use partition::PartitionStatus;
pub use script::ScriptEngine;
pub use value::{Encoded, MapEntries, Value};

#[cfg(feature = "derive")]
pub use particle_derive::Symbol;
