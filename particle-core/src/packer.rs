//! MessagePack-compatible encoder for collection data types.
//!
//! Scalars follow standard MessagePack. Two private extensions apply:
//! strings and byte payloads carry a leading particle-type byte inside
//! their str-family header, and ordered maps start with an ext8 entry
//! holding the map order attributes.

use crate::blob::{self, Opaque};
use crate::config::CodecConfig;
use crate::error::ValueError;
use crate::natural::{key_order, Natural};
use crate::particle::{MapOrder, ParticleType};
use crate::value::Value;

/// Append-only packer that owns its growable buffer.
#[derive(Debug, Clone)]
pub struct Packer {
    buffer: Vec<u8>,
    config: CodecConfig,
}

impl Packer {
    /// Creates an empty packer. The config gates the generic serializer
    /// for opaque objects nested in collections.
    pub fn new(config: CodecConfig) -> Self {
        Packer {
            buffer: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn pack_nil(&mut self) {
        self.buffer.push(0xc0);
    }

    pub fn pack_boolean(&mut self, value: bool) {
        self.buffer.push(if value { 0xc3 } else { 0xc2 });
    }

    pub fn pack_byte(&mut self, value: u8) {
        self.pack_long(i64::from(value));
    }

    pub fn pack_int(&mut self, value: i32) {
        self.pack_long(i64::from(value));
    }

    /// Packs an integer in the smallest MessagePack form that holds it.
    pub fn pack_long(&mut self, value: i64) {
        if value >= 0 {
            if value < 0x80 {
                self.buffer.push(value as u8);
            } else if value <= i64::from(u8::MAX) {
                self.buffer.push(0xcc);
                self.buffer.push(value as u8);
            } else if value <= i64::from(u16::MAX) {
                self.buffer.push(0xcd);
                self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
            } else if value <= i64::from(u32::MAX) {
                self.buffer.push(0xce);
                self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
            } else {
                self.buffer.push(0xcf);
                self.buffer.extend_from_slice(&(value as u64).to_be_bytes());
            }
        } else if value >= -32 {
            self.buffer.push(value as i8 as u8);
        } else if value >= i64::from(i8::MIN) {
            self.buffer.push(0xd0);
            self.buffer.push(value as i8 as u8);
        } else if value >= i64::from(i16::MIN) {
            self.buffer.push(0xd1);
            self.buffer.extend_from_slice(&(value as i16).to_be_bytes());
        } else if value >= i64::from(i32::MIN) {
            self.buffer.push(0xd2);
            self.buffer.extend_from_slice(&(value as i32).to_be_bytes());
        } else {
            self.buffer.push(0xd3);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }

    pub fn pack_double(&mut self, value: f64) {
        self.buffer.push(0xcb);
        self.buffer.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    pub fn pack_float(&mut self, value: f32) {
        self.buffer.push(0xca);
        self.buffer.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    pub fn pack_particle_string(&mut self, value: &str) {
        self.pack_particle_bytes(value.as_bytes(), ParticleType::String);
    }

    /// Packs a byte payload prefixed by its particle type.
    pub fn pack_particle_bytes(&mut self, bytes: &[u8], particle: ParticleType) {
        self.pack_byte_array_begin(bytes.len() + 1);
        self.buffer.push(particle.code());
        self.buffer.extend_from_slice(bytes);
    }

    pub fn pack_geo_json(&mut self, value: &str) {
        self.pack_particle_bytes(value.as_bytes(), ParticleType::GeoJson);
    }

    /// Serializes an opaque object and packs it as a JBLOB.
    pub fn pack_blob(&mut self, object: &Opaque) -> Result<(), ValueError> {
        let bytes = blob::serialize(object, &self.config)?;
        self.pack_particle_bytes(&bytes, ParticleType::JBlob);
        Ok(())
    }

    pub fn pack_array_begin(&mut self, size: usize) {
        if size < 16 {
            self.buffer.push(0x90 | size as u8);
        } else if size <= usize::from(u16::MAX) {
            self.buffer.push(0xdc);
            self.buffer.extend_from_slice(&(size as u16).to_be_bytes());
        } else {
            self.buffer.push(0xdd);
            self.buffer.extend_from_slice(&(size as u32).to_be_bytes());
        }
    }

    pub fn pack_map_begin(&mut self, size: usize) {
        if size < 16 {
            self.buffer.push(0x80 | size as u8);
        } else if size <= usize::from(u16::MAX) {
            self.buffer.push(0xde);
            self.buffer.extend_from_slice(&(size as u16).to_be_bytes());
        } else {
            self.buffer.push(0xdf);
            self.buffer.extend_from_slice(&(size as u32).to_be_bytes());
        }
    }

    /// Starts a map of `size` entries. Ordered maps get an extra leading
    /// entry: an ext8 key carrying the order attributes, with a nil value.
    pub fn pack_map_begin_ordered(&mut self, size: usize, order: MapOrder) {
        if order == MapOrder::Unordered {
            self.pack_map_begin(size);
        } else {
            self.pack_map_begin(size + 1);
            self.buffer.extend_from_slice(&[0xc7, 0x00, order.attributes(), 0xc0]);
        }
    }

    /// Range upper bound used in collection range operations.
    pub fn pack_infinity(&mut self) {
        self.buffer.extend_from_slice(&[0xd4, 0xff, 0x01]);
    }

    /// Matches any value in collection range operations.
    pub fn pack_wildcard(&mut self) {
        self.buffer.extend_from_slice(&[0xd4, 0xff, 0x00]);
    }

    /// Packs an unclassified application value.
    pub fn pack_natural(&mut self, value: &Natural<'_>) -> Result<(), ValueError> {
        match value {
            Natural::Null => self.pack_nil(),
            Natural::Value(v) => v.pack(self)?,
            Natural::Bytes(v) => self.pack_particle_bytes(v, ParticleType::Blob),
            Natural::String(v) | Natural::Symbol(v) => self.pack_particle_string(v),
            Natural::Int(v) => self.pack_int(*v),
            Natural::Long(v) => self.pack_long(*v),
            Natural::Double(v) => self.pack_double(*v),
            Natural::Float(v) => self.pack_float(*v),
            Natural::Bool(v) => self.pack_boolean(*v),
            Natural::Byte(v) => self.pack_byte(*v),
            Natural::Char(v) => self.pack_long(i64::from(u32::from(*v))),
            Natural::Uuid(v) => self.pack_particle_string(&v.to_string()),
            Natural::List(v) => self.pack_list(v)?,
            Natural::Map(v) => self.pack_map(v, MapOrder::Unordered)?,
            Natural::SortedMap(v) => self.pack_map(v, MapOrder::KeyOrdered)?,
            Natural::Buffer(v) => self.pack_particle_bytes(v, ParticleType::Blob),
            Natural::Object(v) => self.pack_blob(v)?,
        }
        Ok(())
    }

    pub fn pack_list(&mut self, list: &[Natural<'_>]) -> Result<(), ValueError> {
        self.pack_array_begin(list.len());
        for item in list {
            self.pack_natural(item)?;
        }
        Ok(())
    }

    /// Packs a map under the given order. Unordered maps keep iteration
    /// order; ordered maps are sorted into server key order (then value
    /// order for [`MapOrder::KeyValueOrdered`]).
    pub fn pack_map<'n, 'a: 'n, I>(&mut self, entries: I, order: MapOrder) -> Result<(), ValueError>
    where
        I: IntoIterator<Item = (&'n Natural<'a>, &'n Natural<'a>), IntoIter: ExactSizeIterator>,
    {
        let entries = entries.into_iter();
        self.pack_map_begin_ordered(entries.len(), order);
        match order {
            MapOrder::Unordered => self.pack_entries(entries),
            MapOrder::KeyOrdered => {
                let mut sorted: Vec<_> = entries.collect();
                sorted.sort_by(|(a, _), (b, _)| key_order(a, b));
                self.pack_entries(sorted)
            }
            MapOrder::KeyValueOrdered => {
                let mut sorted: Vec<_> = entries.collect();
                sorted.sort_by(|(ak, av), (bk, bv)| key_order(ak, bk).then_with(|| key_order(av, bv)));
                self.pack_entries(sorted)
            }
        }
    }

    fn pack_entries<'n, 'a: 'n>(
        &mut self,
        entries: impl IntoIterator<Item = (&'n Natural<'a>, &'n Natural<'a>)>,
    ) -> Result<(), ValueError> {
        for (key, value) in entries {
            self.pack_natural(key)?;
            self.pack_natural(value)?;
        }
        Ok(())
    }

    pub fn pack_value_array(&mut self, values: &[Value<'_>]) -> Result<(), ValueError> {
        self.pack_array_begin(values.len());
        for value in values {
            value.pack(self)?;
        }
        Ok(())
    }

    /// Str-family header; byte arrays share it with strings on the wire.
    fn pack_byte_array_begin(&mut self, size: usize) {
        if size < 32 {
            self.buffer.push(0xa0 | size as u8);
        } else if size <= usize::from(u8::MAX) {
            self.buffer.push(0xd9);
            self.buffer.push(size as u8);
        } else if size <= usize::from(u16::MAX) {
            self.buffer.push(0xda);
            self.buffer.extend_from_slice(&(size as u16).to_be_bytes());
        } else {
            self.buffer.push(0xdb);
            self.buffer.extend_from_slice(&(size as u32).to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;

    fn packed(f: impl FnOnce(&mut Packer)) -> Vec<u8> {
        let mut packer = Packer::new(CodecConfig::default());
        f(&mut packer);
        packer.into_bytes()
    }

    #[test]
    fn integers_use_smallest_form() {
        assert_eq!(packed(|p| p.pack_long(0)), [0x00]);
        assert_eq!(packed(|p| p.pack_long(127)), [0x7f]);
        assert_eq!(packed(|p| p.pack_long(128)), [0xcc, 0x80]);
        assert_eq!(packed(|p| p.pack_long(256)), [0xcd, 0x01, 0x00]);
        assert_eq!(packed(|p| p.pack_long(65536)), [0xce, 0, 1, 0, 0]);
        assert_eq!(packed(|p| p.pack_long(1 << 32)), [0xcf, 0, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(packed(|p| p.pack_long(-1)), [0xff]);
        assert_eq!(packed(|p| p.pack_long(-32)), [0xe0]);
        assert_eq!(packed(|p| p.pack_long(-33)), [0xd0, 0xdf]);
        assert_eq!(packed(|p| p.pack_long(-129)), [0xd1, 0xff, 0x7f]);
        assert_eq!(packed(|p| p.pack_long(-32769)), [0xd2, 0xff, 0xff, 0x7f, 0xff]);
        assert_eq!(
            packed(|p| p.pack_long(i64::MIN)),
            [0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn strings_carry_particle_type() {
        assert_eq!(packed(|p| p.pack_particle_string("ab")), [0xa3, 0x03, b'a', b'b']);
        assert_eq!(packed(|p| p.pack_particle_string("")), [0xa1, 0x03]);
        assert_eq!(
            packed(|p| p.pack_particle_bytes(&[9], ParticleType::Blob)),
            [0xa2, 0x04, 0x09]
        );
        assert_eq!(packed(|p| p.pack_geo_json("{}")), [0xa3, 23, b'{', b'}']);
    }

    #[test]
    fn long_string_header() {
        let text = "x".repeat(40);
        let bytes = packed(|p| p.pack_particle_string(&text));
        assert_eq!(&bytes[..3], &[0xd9, 41, 0x03]);
        assert_eq!(bytes.len(), 3 + 40);

        let text = "y".repeat(300);
        let bytes = packed(|p| p.pack_particle_string(&text));
        assert_eq!(&bytes[..4], &[0xda, 0x01, 0x2d, 0x03]);
    }

    #[test]
    fn scalars() {
        assert_eq!(packed(|p| p.pack_nil()), [0xc0]);
        assert_eq!(packed(|p| p.pack_boolean(true)), [0xc3]);
        assert_eq!(packed(|p| p.pack_boolean(false)), [0xc2]);
        assert_eq!(packed(|p| p.pack_double(1.0)), [0xcb, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(packed(|p| p.pack_float(1.0)), [0xca, 0x3f, 0x80, 0, 0]);
        assert_eq!(packed(|p| p.pack_byte(200)), [0xcc, 200]);
    }

    #[test]
    fn sentinels() {
        assert_eq!(packed(|p| p.pack_infinity()), [0xd4, 0xff, 0x01]);
        assert_eq!(packed(|p| p.pack_wildcard()), [0xd4, 0xff, 0x00]);
    }

    #[test]
    fn ordered_map_header() {
        assert_eq!(packed(|p| p.pack_map_begin_ordered(2, MapOrder::Unordered)), [0x82]);
        assert_eq!(
            packed(|p| p.pack_map_begin_ordered(2, MapOrder::KeyOrdered)),
            [0x83, 0xc7, 0x00, 0x01, 0xc0]
        );
        assert_eq!(
            packed(|p| p.pack_map_begin_ordered(0, MapOrder::KeyValueOrdered)),
            [0x81, 0xc7, 0x00, 0x03, 0xc0]
        );
    }

    #[test]
    fn collection_headers() {
        assert_eq!(packed(|p| p.pack_array_begin(15)), [0x9f]);
        assert_eq!(packed(|p| p.pack_array_begin(16)), [0xdc, 0x00, 0x10]);
        assert_eq!(packed(|p| p.pack_array_begin(70000)), [0xdd, 0, 1, 0x11, 0x70]);
        assert_eq!(packed(|p| p.pack_map_begin(16)), [0xde, 0x00, 0x10]);
    }

    #[test]
    fn nested_list() {
        let list = vec![Natural::Long(1), Natural::from("a"), Natural::list([true])];
        let bytes = packed(|p| p.pack_list(&list).unwrap());
        assert_eq!(bytes, [0x93, 0x01, 0xa2, 0x03, b'a', 0x91, 0xc3]);
    }

    #[test]
    fn sorted_map_packs_key_ordered() {
        let map = Natural::sorted_map([(2i64, "b"), (1i64, "a")]);
        let bytes = packed(|p| p.pack_natural(&map).unwrap());
        assert_eq!(
            bytes,
            [0x83, 0xc7, 0x00, 0x01, 0xc0, 0x01, 0xa2, 0x03, b'a', 0x02, 0xa2, 0x03, b'b']
        );
    }

    #[test]
    fn nested_blob_respects_config() {
        let list = vec![Natural::object(5u32)];
        let mut packer = Packer::new(CodecConfig::builder().disable_serializer(true).build());
        assert!(matches!(packer.pack_list(&list), Err(ValueError::SerializerDisabled)));

        let bytes = packed(|p| p.pack_list(&list).unwrap());
        // CBOR encodes 5u32 as the single byte 0x05.
        assert_eq!(bytes, [0x91, 0xa2, 0x07, 0x05]);
    }

    #[test]
    fn key_ordered_map_uses_server_key_order() {
        let map = Natural::SortedMap(BTreeMap::from([
            (Natural::Int(5), Natural::Null),
            (Natural::Long(3), Natural::Null),
            (Natural::from("a"), Natural::Null),
        ]));
        let bytes = packed(|p| p.pack_natural(&map).unwrap());
        assert_eq!(
            bytes,
            [0x84, 0xc7, 0x00, 0x01, 0xc0, 0x03, 0xc0, 0x05, 0xc0, 0xa2, 0x03, b'a', 0xc0]
        );
    }

    #[test]
    fn key_value_ordered_breaks_ties_on_value() {
        let entries = [
            (Natural::Long(1), Natural::Long(9)),
            (Natural::Int(1), Natural::Long(2)),
        ];
        let bytes = packed(|p| {
            p.pack_map(entries.iter().map(|(k, v)| (k, v)), MapOrder::KeyValueOrdered)
                .unwrap()
        });
        assert_eq!(bytes, [0x83, 0xc7, 0x00, 0x03, 0xc0, 0x01, 0x02, 0x01, 0x09]);
    }

    #[test]
    fn map_header_counts_entries_packed() {
        let map = IndexMap::from([
            (Natural::Long(1), Natural::Long(1)),
            (Natural::Long(2), Natural::Long(2)),
        ]);
        let bytes = packed(|p| p.pack_map(map.iter().take(1), MapOrder::Unordered).unwrap());
        assert_eq!(bytes, [0x81, 0x01, 0x01]);
    }
}
