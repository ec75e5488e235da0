//! Opaque application objects and the generic serializer behind them.
//!
//! Anything the dispatcher cannot classify travels as a JBLOB: the object
//! is serialized to CBOR and the server stores the bytes untouched.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::config::CodecConfig;
use crate::error::ValueError;

/// An application object that can be stored as an opaque blob.
///
/// Implemented for every `Serialize + Debug + Ord + Hash` type. Equality,
/// ordering and hashing go through the concrete type so opaque values can
/// sit inside maps and sets like any other natural value.
pub trait BlobObject: fmt::Debug + Send + Sync + 'static {
    /// Name of the concrete type, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Serializes the object with the generic serializer.
    fn to_blob(&self) -> Result<Vec<u8>, ValueError>;

    fn as_any(&self) -> &dyn Any;

    fn blob_eq(&self, other: &dyn BlobObject) -> bool;

    fn blob_cmp(&self, other: &dyn BlobObject) -> Ordering;

    fn blob_hash(&self, state: &mut dyn Hasher);
}

impl<T> BlobObject for T
where
    T: Serialize + fmt::Debug + Ord + Hash + Send + Sync + 'static,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_blob(&self) -> Result<Vec<u8>, ValueError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)?;
        Ok(bytes)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn blob_eq(&self, other: &dyn BlobObject) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn blob_cmp(&self, other: &dyn BlobObject) -> Ordering {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.cmp(other),
            None => self
                .type_name()
                .cmp(other.type_name())
                .then_with(|| TypeId::of::<T>().cmp(&other.as_any().type_id())),
        }
    }

    fn blob_hash(&self, mut state: &mut dyn Hasher) {
        self.type_name().hash(&mut state);
        self.hash(&mut state);
    }
}

/// Shared handle to an opaque object.
#[derive(Clone)]
pub struct Opaque(Arc<dyn BlobObject>);

impl Opaque {
    pub fn new<T: BlobObject>(object: T) -> Self {
        Opaque(Arc::new(object))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Returns the object if it is a `T`.
    pub fn downcast_ref<T: BlobObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn object(&self) -> &dyn BlobObject {
        self.0.as_ref()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.0.blob_eq(other.0.as_ref())
    }
}

impl Eq for Opaque {}

impl PartialOrd for Opaque {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Opaque {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.blob_cmp(other.0.as_ref())
    }
}

impl Hash for Opaque {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.blob_hash(state);
    }
}

/// Runs the generic serializer, unless the config disables it.
pub fn serialize(object: &Opaque, config: &CodecConfig) -> Result<Vec<u8>, ValueError> {
    if config.disable_serializer {
        log::warn!("refusing to serialize {}: serializer disabled", object.type_name());
        return Err(ValueError::SerializerDisabled);
    }
    log::debug!("serializing {} with the generic serializer", object.type_name());
    object.0.to_blob()
}

/// Decodes a generically serialized payload, unless the config disables it.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8], config: &CodecConfig) -> Result<T, ValueError> {
    if config.disable_deserializer {
        log::warn!("refusing to deserialize {} bytes: deserializer disabled", bytes.len());
        return Err(ValueError::DeserializerDisabled);
    }
    Ok(ciborium::from_reader(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::hash_map::DefaultHasher;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn hash_of(value: &Opaque) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn serialize_roundtrip() {
        let config = CodecConfig::default();
        let object = Opaque::new(Point { x: 1, y: -2 });
        let bytes = serialize(&object, &config).unwrap();
        let back: Point = deserialize(&bytes, &config).unwrap();
        assert_eq!(back, Point { x: 1, y: -2 });
    }

    #[test]
    fn disabled_serializer_refuses() {
        let config = CodecConfig::builder().disable_serializer(true).build();
        let err = serialize(&Opaque::new(Point { x: 0, y: 0 }), &config).unwrap_err();
        assert!(matches!(err, ValueError::SerializerDisabled));
    }

    #[test]
    fn disabled_deserializer_refuses() {
        let bytes = serialize(&Opaque::new(7u8), &CodecConfig::default()).unwrap();
        let config = CodecConfig::builder().disable_deserializer(true).build();
        let err = deserialize::<u8>(&bytes, &config).unwrap_err();
        assert!(matches!(err, ValueError::DeserializerDisabled));
    }

    #[test]
    fn equality_goes_through_concrete_type() {
        let a = Opaque::new(Point { x: 1, y: 1 });
        let b = Opaque::new(Point { x: 1, y: 1 });
        let c = Opaque::new(Point { x: 2, y: 1 });
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert!(a < c);
        assert_ne!(a, Opaque::new(1i64));
    }

    #[test]
    fn downcast() {
        let a = Opaque::new(Point { x: 3, y: 4 });
        assert_eq!(a.downcast_ref::<Point>().map(|p| p.x), Some(3));
        assert!(a.downcast_ref::<String>().is_none());
        assert!(a.type_name().ends_with("Point"));
    }

    /// Not serializable, so it implements `BlobObject` by hand under another
    /// type's name.
    #[derive(Debug, PartialEq)]
    struct NamedLikeU8(u8);

    impl BlobObject for NamedLikeU8 {
        fn type_name(&self) -> &'static str {
            std::any::type_name::<u8>()
        }
        fn to_blob(&self) -> Result<Vec<u8>, ValueError> {
            Ok(vec![self.0])
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn blob_eq(&self, other: &dyn BlobObject) -> bool {
            other.as_any().downcast_ref::<Self>() == Some(self)
        }
        fn blob_cmp(&self, other: &dyn BlobObject) -> Ordering {
            match other.as_any().downcast_ref::<Self>() {
                Some(other) => self.0.cmp(&other.0),
                None => self
                    .type_name()
                    .cmp(other.type_name())
                    .then_with(|| TypeId::of::<Self>().cmp(&other.as_any().type_id())),
            }
        }
        fn blob_hash(&self, mut state: &mut dyn Hasher) {
            self.0.hash(&mut state);
        }
    }

    #[test]
    fn shared_type_name_does_not_compare_equal() {
        let a = Opaque::new(5u8);
        let b = Opaque::new(NamedLikeU8(5));
        assert_eq!(a.type_name(), b.type_name());
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }
}
