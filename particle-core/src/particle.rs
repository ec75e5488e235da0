use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire type discriminant the server uses for a single bin value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParticleType {
    Null = 0,
    Integer = 1,
    Double = 2,
    String = 3,
    Blob = 4,
    JBlob = 7,
    CSharpBlob = 8,
    PythonBlob = 9,
    RubyBlob = 10,
    PhpBlob = 11,
    ErlangBlob = 12,
    Bool = 17,
    Hll = 18,
    Map = 19,
    List = 20,
    GeoJson = 23,
}

impl ParticleType {
    /// Returns the single-byte wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the server's name for this particle type.
    pub fn name(self) -> &'static str {
        match self {
            ParticleType::Null => "NULL",
            ParticleType::Integer => "INTEGER",
            ParticleType::Double => "DOUBLE",
            ParticleType::String => "STRING",
            ParticleType::Blob => "BLOB",
            ParticleType::JBlob => "JBLOB",
            ParticleType::CSharpBlob => "CSHARP_BLOB",
            ParticleType::PythonBlob => "PYTHON_BLOB",
            ParticleType::RubyBlob => "RUBY_BLOB",
            ParticleType::PhpBlob => "PHP_BLOB",
            ParticleType::ErlangBlob => "ERLANG_BLOB",
            ParticleType::Bool => "BOOL",
            ParticleType::Hll => "HLL",
            ParticleType::Map => "MAP",
            ParticleType::List => "LIST",
            ParticleType::GeoJson => "GEOJSON",
        }
    }
}

impl TryFrom<u8> for ParticleType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => ParticleType::Null,
            1 => ParticleType::Integer,
            2 => ParticleType::Double,
            3 => ParticleType::String,
            4 => ParticleType::Blob,
            7 => ParticleType::JBlob,
            8 => ParticleType::CSharpBlob,
            9 => ParticleType::PythonBlob,
            10 => ParticleType::RubyBlob,
            11 => ParticleType::PhpBlob,
            12 => ParticleType::ErlangBlob,
            17 => ParticleType::Bool,
            18 => ParticleType::Hll,
            19 => ParticleType::Map,
            20 => ParticleType::List,
            23 => ParticleType::GeoJson,
            other => return Err(other),
        })
    }
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage order of a map collection on the server.
///
/// The order travels with packed map payloads so the server can pick its
/// internal representation without re-sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapOrder {
    /// Entries are kept in arbitrary order.
    #[default]
    Unordered,
    /// Entries are kept sorted by key.
    KeyOrdered,
    /// Entries are kept sorted by key and indexed by value.
    KeyValueOrdered,
}

impl MapOrder {
    /// Attribute byte carried inside the packed map header extension.
    pub fn attributes(self) -> u8 {
        match self {
            MapOrder::Unordered => 0,
            MapOrder::KeyOrdered => 1,
            MapOrder::KeyValueOrdered => 3,
        }
    }

    /// Flag used by map-create operations.
    pub fn flag(self) -> u8 {
        match self {
            MapOrder::Unordered => 0x40,
            MapOrder::KeyOrdered => 0x80,
            MapOrder::KeyValueOrdered => 0xc0,
        }
    }
}
