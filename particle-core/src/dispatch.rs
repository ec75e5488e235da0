//! Classification of application values into wire values.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::blob::{BlobObject, Opaque};
use crate::config::CodecConfig;
use crate::natural::Natural;
use crate::particle::{MapOrder, ParticleType};
use crate::value::{Encoded, MapEntries, Value};

impl<'a> Value<'a> {
    /// Classifies an application value.
    ///
    /// Never fails: `Null` (including `None`) yields [`Value::Null`], and
    /// anything the closed set does not cover is already a
    /// [`Natural::Object`] and becomes an opaque blob. Booleans follow
    /// `config.use_bool_bin`.
    pub fn from_natural(value: impl Into<Natural<'a>>, config: &CodecConfig) -> Value<'a> {
        match value.into() {
            Natural::Null => Value::Null,
            Natural::Value(v) => *v,
            Natural::Bytes(v) => Value::bytes(v),
            Natural::String(v) => Value::String(v),
            Natural::Int(v) => Value::Int(v),
            Natural::Long(v) => Value::Long(v),
            Natural::Double(v) => Value::Double(v),
            Natural::Float(v) => Value::Float(v),
            Natural::Bool(v) => Value::boolean(v, config),
            Natural::Byte(v) => Value::Byte(v),
            Natural::Char(v) => Value::Int(u32::from(v) as i32),
            Natural::Symbol(v) => Value::String(v),
            Natural::Uuid(v) => Value::uuid(v),
            Natural::List(v) => Value::list(v),
            Natural::Map(v) => Value::map(v),
            Natural::SortedMap(v) => Value::sorted(v),
            Natural::Buffer(v) => Value::bytes(v.to_vec()),
            Natural::Object(v) => {
                log::trace!("{} falls back to an opaque blob", v.type_name());
                Value::Blob { object: v, encoded: Encoded::new() }
            }
        }
    }

    pub fn null() -> Self {
        Value::Null
    }

    /// Owned bytes sent as BLOB.
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Value::Bytes { bytes, particle: ParticleType::Blob }
    }

    /// Owned bytes with a language-specific blob type.
    pub fn bytes_with_type(bytes: Vec<u8>, particle: ParticleType) -> Self {
        Value::Bytes { bytes, particle }
    }

    /// Borrows `bytes` without copying. The slice must stay unchanged until
    /// the command holding this value has been sent.
    pub fn segment(bytes: &'a [u8]) -> Self {
        Value::Segment(bytes)
    }

    pub fn byte(value: u8) -> Self {
        Value::Byte(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn int(value: i32) -> Self {
        Value::Int(value)
    }

    pub fn long(value: i64) -> Self {
        Value::Long(value)
    }

    pub fn double(value: f64) -> Self {
        Value::Double(value)
    }

    pub fn float(value: f32) -> Self {
        Value::Float(value)
    }

    /// [`Value::Bool`] when the server supports boolean bins, else [`Value::BoolInt`].
    pub fn boolean(value: bool, config: &CodecConfig) -> Self {
        if config.use_bool_bin {
            Value::Bool(value)
        } else {
            Value::BoolInt(value)
        }
    }

    pub fn uuid(value: Uuid) -> Self {
        Value::String(value.to_string())
    }

    pub fn list(list: Vec<Natural<'a>>) -> Self {
        Value::List { list, encoded: Encoded::new() }
    }

    /// Unordered map.
    pub fn map(map: IndexMap<Natural<'a>, Natural<'a>>) -> Self {
        Value::map_with_order(MapEntries::Unordered(map), MapOrder::Unordered)
    }

    /// Key-ordered map.
    pub fn sorted(map: BTreeMap<Natural<'a>, Natural<'a>>) -> Self {
        Value::map_with_order(MapEntries::Sorted(map), MapOrder::KeyOrdered)
    }

    /// Map with an explicit order tag, whatever the collection kind.
    pub fn map_with_order(map: MapEntries<'a>, order: MapOrder) -> Self {
        Value::Map { map, order, encoded: Encoded::new() }
    }

    /// Entry list already in `order`; packed as given.
    pub fn sorted_map(entries: Vec<(Natural<'a>, Natural<'a>)>, order: MapOrder) -> Self {
        Value::SortedMap { entries, order, encoded: Encoded::new() }
    }

    pub fn array(values: Vec<Value<'a>>) -> Self {
        Value::Array { values, encoded: Encoded::new() }
    }

    /// Stores `object` through the generic serializer, whatever its type.
    pub fn as_blob<T: BlobObject>(object: T) -> Self {
        Value::Blob { object: Opaque::new(object), encoded: Encoded::new() }
    }

    pub fn geo_json(value: impl Into<String>) -> Self {
        Value::GeoJson(value.into())
    }

    pub fn hll(bytes: Vec<u8>) -> Self {
        Value::Hll(bytes)
    }

    pub fn infinity() -> Self {
        Value::Infinity
    }

    pub fn wildcard() -> Self {
        Value::Wildcard
    }
}
