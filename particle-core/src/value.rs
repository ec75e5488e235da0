use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::blob::{self, Opaque};
use crate::buffer::{
    bytes_to_hex_string, copy_bytes, double_to_bytes, estimate_size_utf8, long_to_bytes,
    short_to_bytes, string_to_utf8,
};
use crate::config::CodecConfig;
use crate::error::ValueError;
use crate::natural::{cmp_unordered, hash_unordered, write_list, write_map, Natural};
use crate::packer::Packer;
use crate::particle::{MapOrder, ParticleType};

/// Bytes computed by `estimate_size` and flushed verbatim by `write`.
///
/// Filled at most once per value. Ignored by equality and hashing.
#[derive(Debug, Clone, Default)]
pub struct Encoded(OnceLock<Vec<u8>>);

impl Encoded {
    pub fn new() -> Self {
        Encoded(OnceLock::new())
    }

    /// Returns the cached bytes, if `estimate_size` has run.
    pub fn get(&self) -> Option<&[u8]> {
        self.0.get().map(Vec::as_slice)
    }

    fn fill(&self, encode: impl FnOnce() -> Result<Vec<u8>, ValueError>) -> Result<usize, ValueError> {
        if let Some(bytes) = self.0.get() {
            return Ok(bytes.len());
        }
        let bytes = encode()?;
        Ok(self.0.get_or_init(|| bytes).len())
    }

    fn bytes(&self) -> &[u8] {
        match self.0.get() {
            Some(bytes) => bytes,
            None => panic!("write called before estimate_size"),
        }
    }
}

/// Entries of a map value, keeping the collection kind it was built from.
#[derive(Debug, Clone)]
pub enum MapEntries<'a> {
    Unordered(IndexMap<Natural<'a>, Natural<'a>>),
    Sorted(BTreeMap<Natural<'a>, Natural<'a>>),
}

impl<'a> MapEntries<'a> {
    pub fn len(&self) -> usize {
        match self {
            MapEntries::Unordered(map) => map.len(),
            MapEntries::Sorted(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The order implied by the collection kind.
    pub fn natural_order(&self) -> MapOrder {
        match self {
            MapEntries::Unordered(_) => MapOrder::Unordered,
            MapEntries::Sorted(_) => MapOrder::KeyOrdered,
        }
    }

    fn to_natural(&self) -> Natural<'a> {
        match self {
            MapEntries::Unordered(map) => Natural::Map(map.clone()),
            MapEntries::Sorted(map) => Natural::SortedMap(map.clone()),
        }
    }

    fn pack(&self, packer: &mut Packer, order: MapOrder) -> Result<(), ValueError> {
        match self {
            MapEntries::Unordered(map) => packer.pack_map(map, order),
            MapEntries::Sorted(map) => packer.pack_map(map, order),
        }
    }
}

impl PartialEq for MapEntries<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MapEntries<'_> {}

impl PartialOrd for MapEntries<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MapEntries<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MapEntries::Unordered(a), MapEntries::Unordered(b)) => cmp_unordered(a, b),
            (MapEntries::Sorted(a), MapEntries::Sorted(b)) => a.cmp(b),
            (MapEntries::Unordered(_), MapEntries::Sorted(_)) => Ordering::Less,
            (MapEntries::Sorted(_), MapEntries::Unordered(_)) => Ordering::Greater,
        }
    }
}

impl Hash for MapEntries<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            MapEntries::Unordered(map) => {
                state.write_u8(0);
                hash_unordered(map, state);
            }
            MapEntries::Sorted(map) => {
                state.write_u8(1);
                map.hash(state);
            }
        }
    }
}

/// A value in wire form.
///
/// Every variant supports both encodings: the flat particle encoding
/// (`estimate_size` then `write`) and the packed collection encoding
/// (`pack`). Composite variants and opaque blobs compute their bytes in
/// `estimate_size` and cache them, so `write` always emits exactly the
/// estimated length.
///
/// `Segment` borrows caller memory; the borrow keeps that memory alive and
/// unchanged until the value is dropped.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Null,
    /// Owned bytes with their particle type (BLOB unless stated otherwise).
    Bytes { bytes: Vec<u8>, particle: ParticleType },
    /// Borrowed bytes, sent as BLOB.
    Segment(&'a [u8]),
    /// Single byte, widened to an 8-byte integer on the wire.
    Byte(u8),
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    /// Sent as an 8-byte double.
    Float(f32),
    /// Boolean with the BOOL particle type.
    Bool(bool),
    /// Boolean sent as an 8-byte INTEGER for servers without BOOL support.
    BoolInt(bool),
    /// Object stored through the generic serializer.
    Blob { object: Opaque, encoded: Encoded },
    GeoJson(String),
    /// HyperLogLog sketch.
    Hll(Vec<u8>),
    /// Raw list of already-classified values.
    Array { values: Vec<Value<'a>>, encoded: Encoded },
    List { list: Vec<Natural<'a>>, encoded: Encoded },
    Map { map: MapEntries<'a>, order: MapOrder, encoded: Encoded },
    /// Map given as an entry list; sorted into `order` when packed.
    SortedMap { entries: Vec<(Natural<'a>, Natural<'a>)>, order: MapOrder, encoded: Encoded },
    /// Upper bound for collection range queries.
    Infinity,
    /// Matches anything in collection range queries.
    Wildcard,
}

impl<'a> Value<'a> {
    /// Number of bytes `write` will emit.
    ///
    /// Opaque blobs and collections are encoded here and the bytes are
    /// cached for `write`. Fails if the generic serializer is disabled or
    /// rejects the object.
    pub fn estimate_size(&self, config: &CodecConfig) -> Result<usize, ValueError> {
        Ok(match self {
            Value::Null | Value::Infinity | Value::Wildcard => 0,
            Value::Bytes { bytes, .. } | Value::Hll(bytes) => bytes.len(),
            Value::Segment(bytes) => bytes.len(),
            Value::Byte(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Double(_)
            | Value::Float(_)
            | Value::BoolInt(_) => 8,
            Value::Bool(_) => 1,
            Value::String(v) => estimate_size_utf8(v),
            // flags + ncells + json
            Value::GeoJson(v) => 1 + 2 + estimate_size_utf8(v),
            Value::Blob { object, encoded } => {
                self.check_serializer(config)?;
                encoded.fill(|| blob::serialize(object, config))?
            }
            Value::Array { encoded, .. }
            | Value::List { encoded, .. }
            | Value::Map { encoded, .. }
            | Value::SortedMap { encoded, .. } => {
                self.check_serializer(config)?;
                encoded.fill(|| self.pack_to_vec(config))?
            }
        })
    }

    // Runs ahead of the cache: a disabled serializer refuses every call,
    // even when the bytes were cached while it was enabled.
    fn check_serializer(&self, config: &CodecConfig) -> Result<(), ValueError> {
        if config.disable_serializer && self.holds_object() {
            log::warn!("refusing to encode {}: serializer disabled", self.type_name());
            return Err(ValueError::SerializerDisabled);
        }
        Ok(())
    }

    /// Whether encoding this value runs the generic serializer.
    pub(crate) fn holds_object(&self) -> bool {
        match self {
            Value::Blob { .. } => true,
            Value::Array { values, .. } => values.iter().any(Value::holds_object),
            Value::List { list, .. } => list.iter().any(Natural::holds_object),
            Value::Map { map: MapEntries::Unordered(map), .. } => {
                map.iter().any(|(k, v)| k.holds_object() || v.holds_object())
            }
            Value::Map { map: MapEntries::Sorted(map), .. } => {
                map.iter().any(|(k, v)| k.holds_object() || v.holds_object())
            }
            Value::SortedMap { entries, .. } => {
                entries.iter().any(|(k, v)| k.holds_object() || v.holds_object())
            }
            _ => false,
        }
    }

    /// Writes the flat encoding into `buffer` at `offset` and returns the
    /// byte count, which always equals the preceding `estimate_size`.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is too short, or if a blob or collection value is
    /// written without a successful `estimate_size` first.
    pub fn write(&self, buffer: &mut [u8], offset: usize) -> usize {
        match self {
            Value::Null | Value::Infinity | Value::Wildcard => 0,
            Value::Bytes { bytes, .. } | Value::Hll(bytes) => copy_bytes(bytes, buffer, offset),
            Value::Segment(bytes) => copy_bytes(bytes, buffer, offset),
            Value::Byte(v) => long_to_bytes(i64::from(*v), buffer, offset),
            Value::String(v) => string_to_utf8(v, buffer, offset),
            Value::Int(v) => long_to_bytes(i64::from(*v), buffer, offset),
            Value::Long(v) => long_to_bytes(*v, buffer, offset),
            Value::Double(v) => double_to_bytes(*v, buffer, offset),
            Value::Float(v) => double_to_bytes(f64::from(*v), buffer, offset),
            Value::Bool(v) => {
                buffer[offset] = u8::from(*v);
                1
            }
            Value::BoolInt(v) => long_to_bytes(i64::from(*v), buffer, offset),
            Value::GeoJson(v) => {
                buffer[offset] = 0;
                short_to_bytes(0, buffer, offset + 1);
                3 + string_to_utf8(v, buffer, offset + 3)
            }
            Value::Blob { encoded, .. }
            | Value::Array { encoded, .. }
            | Value::List { encoded, .. }
            | Value::Map { encoded, .. }
            | Value::SortedMap { encoded, .. } => copy_bytes(encoded.bytes(), buffer, offset),
        }
    }

    /// Appends the packed encoding to `packer`.
    pub fn pack(&self, packer: &mut Packer) -> Result<(), ValueError> {
        match self {
            Value::Null => packer.pack_nil(),
            Value::Bytes { bytes, particle } => packer.pack_particle_bytes(bytes, *particle),
            Value::Segment(bytes) => packer.pack_particle_bytes(bytes, ParticleType::Blob),
            Value::Byte(v) => packer.pack_byte(*v),
            Value::String(v) => packer.pack_particle_string(v),
            Value::Int(v) => packer.pack_int(*v),
            Value::Long(v) => packer.pack_long(*v),
            Value::Double(v) => packer.pack_double(*v),
            Value::Float(v) => packer.pack_float(*v),
            Value::Bool(v) | Value::BoolInt(v) => packer.pack_boolean(*v),
            Value::Blob { object, .. } => packer.pack_blob(object)?,
            Value::GeoJson(v) => packer.pack_geo_json(v),
            Value::Hll(bytes) => packer.pack_particle_bytes(bytes, ParticleType::Blob),
            Value::Array { values, .. } => packer.pack_value_array(values)?,
            Value::List { list, .. } => packer.pack_list(list)?,
            Value::Map { map, order, .. } => map.pack(packer, *order)?,
            Value::SortedMap { entries, order, .. } => {
                packer.pack_map(entries.iter().map(|(k, v)| (k, v)), *order)?
            }
            Value::Infinity => packer.pack_infinity(),
            Value::Wildcard => packer.pack_wildcard(),
        }
        Ok(())
    }

    /// Packs this value alone into a fresh buffer.
    pub fn pack_to_vec(&self, config: &CodecConfig) -> Result<Vec<u8>, ValueError> {
        let mut packer = Packer::new(*config);
        self.pack(&mut packer)?;
        Ok(packer.into_bytes())
    }

    /// Wire type discriminant. The range sentinels have none.
    pub fn particle_type(&self) -> Result<ParticleType, ValueError> {
        Ok(match self {
            Value::Null => ParticleType::Null,
            Value::Bytes { particle, .. } => *particle,
            Value::Segment(_) => ParticleType::Blob,
            Value::Byte(_) | Value::Int(_) | Value::Long(_) | Value::BoolInt(_) => ParticleType::Integer,
            Value::String(_) => ParticleType::String,
            Value::Double(_) | Value::Float(_) => ParticleType::Double,
            Value::Bool(_) => ParticleType::Bool,
            Value::Blob { .. } => ParticleType::JBlob,
            Value::GeoJson(_) => ParticleType::GeoJson,
            Value::Hll(_) => ParticleType::Hll,
            Value::Array { .. } | Value::List { .. } => ParticleType::List,
            Value::Map { .. } | Value::SortedMap { .. } => ParticleType::Map,
            Value::Infinity => return Err(ValueError::InvalidParticleType("INF")),
            Value::Wildcard => return Err(ValueError::InvalidParticleType("wildcard")),
        })
    }

    /// Returns the application-level payload this value was built from.
    pub fn as_native(&self) -> Natural<'a> {
        match self {
            Value::Null | Value::Infinity | Value::Wildcard => Natural::Null,
            Value::Bytes { bytes, .. } | Value::Hll(bytes) => Natural::Bytes(bytes.clone()),
            Value::Segment(_) => Natural::Value(Box::new(self.clone())),
            Value::Byte(v) => Natural::Byte(*v),
            Value::String(v) | Value::GeoJson(v) => Natural::String(v.clone()),
            Value::Int(v) => Natural::Int(*v),
            Value::Long(v) => Natural::Long(*v),
            Value::Double(v) => Natural::Double(*v),
            Value::Float(v) => Natural::Float(*v),
            Value::Bool(v) | Value::BoolInt(v) => Natural::Bool(*v),
            Value::Blob { object, .. } => Natural::Object(object.clone()),
            Value::Array { values, .. } => Natural::List(values.iter().cloned().map(Natural::from).collect()),
            Value::List { list, .. } => Natural::List(list.clone()),
            Value::Map { map, .. } => map.to_natural(),
            Value::SortedMap { entries, .. } => Natural::List(
                entries
                    .iter()
                    .map(|(k, v)| Natural::List(vec![k.clone(), v.clone()]))
                    .collect(),
            ),
        }
    }

    /// Fails for types the server cannot index as a record key.
    pub fn validate_key(&self) -> Result<(), ValueError> {
        match self {
            Value::Null
            | Value::Bool(_)
            | Value::BoolInt(_)
            | Value::Blob { .. }
            | Value::GeoJson(_)
            | Value::Hll(_)
            | Value::Array { .. }
            | Value::List { .. }
            | Value::Map { .. }
            | Value::SortedMap { .. }
            | Value::Infinity
            | Value::Wildcard => Err(ValueError::InvalidKeyType(self.type_name())),
            Value::Bytes { .. }
            | Value::Segment(_)
            | Value::Byte(_)
            | Value::String(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Double(_)
            | Value::Float(_) => Ok(()),
        }
    }

    /// Short name of the variant as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bytes { .. } => "bytes",
            Value::Segment(_) => "byte segment",
            Value::Byte(_) => "byte",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::BoolInt(_) => "boolean int",
            Value::Blob { .. } => "jblob",
            Value::GeoJson(_) => "geojson",
            Value::Hll(_) => "hll",
            Value::Array { .. } => "value[]",
            Value::List { .. } => "list",
            Value::Map { .. } | Value::SortedMap { .. } => "map",
            Value::Infinity => "INF",
            Value::Wildcard => "wildcard",
        }
    }

    /// Numeric view of the value; 0 for non-numeric variants.
    pub fn to_long(&self) -> i64 {
        match self {
            Value::Byte(v) => i64::from(*v),
            Value::Int(v) => i64::from(*v),
            Value::Long(v) => *v,
            Value::Double(v) => *v as i64,
            Value::Float(v) => *v as i64,
            Value::Bool(v) | Value::BoolInt(v) => i64::from(*v),
            _ => 0,
        }
    }

    /// Like [`Value::to_long`], truncated to 32 bits.
    pub fn to_int(&self) -> i32 {
        match self {
            Value::Double(v) => *v as i32,
            Value::Float(v) => *v as i32,
            other => other.to_long() as i32,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bytes { .. } => 1,
            Value::Segment(_) => 2,
            Value::Byte(_) => 3,
            Value::String(_) => 4,
            Value::Int(_) => 5,
            Value::Long(_) => 6,
            Value::Double(_) => 7,
            Value::Float(_) => 8,
            Value::Bool(_) => 9,
            Value::BoolInt(_) => 10,
            Value::Blob { .. } => 11,
            Value::GeoJson(_) => 12,
            Value::Hll(_) => 13,
            Value::Array { .. } => 14,
            Value::List { .. } => 15,
            Value::Map { .. } => 16,
            Value::SortedMap { .. } => 17,
            Value::Infinity => 18,
            Value::Wildcard => 19,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value<'_> {}

impl PartialOrd for Value<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bytes { bytes: a, particle: pa }, Value::Bytes { bytes: b, particle: pb }) => {
                pa.cmp(pb).then_with(|| a.cmp(b))
            }
            (Value::Segment(a), Value::Segment(b)) => a.cmp(b),
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::BoolInt(a), Value::BoolInt(b)) => a.cmp(b),
            (Value::Blob { object: a, .. }, Value::Blob { object: b, .. }) => a.cmp(b),
            (Value::GeoJson(a), Value::GeoJson(b)) => a.cmp(b),
            (Value::Hll(a), Value::Hll(b)) => a.cmp(b),
            (Value::Array { values: a, .. }, Value::Array { values: b, .. }) => a.cmp(b),
            (Value::List { list: a, .. }, Value::List { list: b, .. }) => a.cmp(b),
            (
                Value::Map { map: a, order: oa, .. },
                Value::Map { map: b, order: ob, .. },
            ) => oa.cmp(ob).then_with(|| a.cmp(b)),
            (
                Value::SortedMap { entries: a, order: oa, .. },
                Value::SortedMap { entries: b, order: ob, .. },
            ) => oa.cmp(ob).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Value::Null | Value::Infinity | Value::Wildcard => {}
            Value::Bytes { bytes, particle } => {
                particle.hash(state);
                bytes.hash(state);
            }
            Value::Hll(bytes) => bytes.hash(state),
            Value::Segment(bytes) => bytes.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::String(v) | Value::GeoJson(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Bool(v) | Value::BoolInt(v) => v.hash(state),
            Value::Blob { object, .. } => object.hash(state),
            Value::Array { values, .. } => values.hash(state),
            Value::List { list, .. } => list.hash(state),
            Value::Map { map, order, .. } => {
                order.hash(state);
                map.hash(state);
            }
            Value::SortedMap { entries, order, .. } => {
                order.hash(state);
                entries.hash(state);
            }
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bytes { bytes, .. } | Value::Hll(bytes) => f.write_str(&bytes_to_hex_string(bytes)),
            Value::Segment(bytes) => f.write_str(&bytes_to_hex_string(bytes)),
            Value::Byte(v) => write!(f, "{}", v),
            Value::String(v) | Value::GeoJson(v) => f.write_str(v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) | Value::BoolInt(v) => write!(f, "{}", v),
            Value::Blob { object, encoded } => match encoded.get() {
                Some(bytes) => f.write_str(&bytes_to_hex_string(bytes)),
                None => write!(f, "{:?}", object),
            },
            Value::Array { values, .. } => write_list(f, values),
            Value::List { list, .. } => write_list(f, list),
            Value::Map { map: MapEntries::Unordered(map), .. } => write_map(f, map),
            Value::Map { map: MapEntries::Sorted(map), .. } => write_map(f, map),
            Value::SortedMap { entries, .. } => write_map(f, entries.iter().map(|(k, v)| (k, v))),
            Value::Infinity => f.write_str("INF"),
            Value::Wildcard => f.write_str("*"),
        }
    }
}
