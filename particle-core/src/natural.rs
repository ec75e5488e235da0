use bytes::Bytes;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::blob::{BlobObject, Opaque};
use crate::buffer::bytes_to_hex_string;
use crate::value::Value;

/// An application-level value before it is classified into a wire [`Value`].
///
/// This is the closed set of inputs the dispatcher understands. Anything
/// outside it is carried as [`Natural::Object`] and stored as an opaque blob.
///
/// Equality, ordering and hashing are structural. Floats compare by bit
/// pattern, and [`Natural::Map`] compares its entries regardless of
/// insertion order.
#[derive(Debug, Clone)]
pub enum Natural<'a> {
    Null,
    /// Already classified; dispatch passes it through.
    Value(Box<Value<'a>>),
    Bytes(Vec<u8>),
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Bool(bool),
    Byte(u8),
    Char(char),
    /// Name of an enumerated value.
    Symbol(String),
    Uuid(Uuid),
    List(Vec<Natural<'a>>),
    /// Map without a meaningful key order.
    Map(IndexMap<Natural<'a>, Natural<'a>>),
    /// Map whose iteration order is its key order.
    SortedMap(BTreeMap<Natural<'a>, Natural<'a>>),
    /// Byte-buffer wrapper; copied on dispatch.
    Buffer(Bytes),
    Object(Opaque),
}

/// An enumerated value that travels as its name.
///
/// Derive it for unit-only enums with `#[derive(Symbol)]`.
pub trait Symbol {
    fn symbol(&self) -> &'static str;
}

impl<'a> Natural<'a> {
    /// Wraps an arbitrary object for opaque storage.
    pub fn object<T: BlobObject>(object: T) -> Self {
        Natural::Object(Opaque::new(object))
    }

    pub fn symbol<S: Symbol + ?Sized>(value: &S) -> Self {
        Natural::Symbol(value.symbol().to_string())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Natural<'a>>,
    {
        Natural::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds an unordered map.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Natural<'a>>,
        V: Into<Natural<'a>>,
    {
        Natural::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds a key-ordered map.
    pub fn sorted_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Natural<'a>>,
        V: Into<Natural<'a>>,
    {
        Natural::SortedMap(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Natural::Null)
    }

    pub(crate) fn holds_object(&self) -> bool {
        match self {
            Natural::Object(_) => true,
            Natural::Value(v) => v.holds_object(),
            Natural::List(v) => v.iter().any(Natural::holds_object),
            Natural::Map(v) => v.iter().any(|(k, v)| k.holds_object() || v.holds_object()),
            Natural::SortedMap(v) => v.iter().any(|(k, v)| k.holds_object() || v.holds_object()),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Natural::Null => 0,
            Natural::Value(_) => 1,
            Natural::Bytes(_) => 2,
            Natural::String(_) => 3,
            Natural::Int(_) => 4,
            Natural::Long(_) => 5,
            Natural::Double(_) => 6,
            Natural::Float(_) => 7,
            Natural::Bool(_) => 8,
            Natural::Byte(_) => 9,
            Natural::Char(_) => 10,
            Natural::Symbol(_) => 11,
            Natural::Uuid(_) => 12,
            Natural::List(_) => 13,
            Natural::Map(_) => 14,
            Natural::SortedMap(_) => 15,
            Natural::Buffer(_) => 16,
            Natural::Object(_) => 17,
        }
    }
}

/// Compares two unordered maps by their sorted entries.
pub(crate) fn cmp_unordered(
    left: &IndexMap<Natural<'_>, Natural<'_>>,
    right: &IndexMap<Natural<'_>, Natural<'_>>,
) -> Ordering {
    let mut left: Vec<_> = left.iter().collect();
    let mut right: Vec<_> = right.iter().collect();
    left.sort();
    right.sort();
    left.cmp(&right)
}

/// Hashes an unordered map independently of insertion order.
pub(crate) fn hash_unordered<H: Hasher>(map: &IndexMap<Natural<'_>, Natural<'_>>, state: &mut H) {
    let mut sum = 0u64;
    for entry in map {
        let mut hasher = DefaultHasher::new();
        entry.hash(&mut hasher);
        sum = sum.wrapping_add(hasher.finish());
    }
    state.write_usize(map.len());
    state.write_u64(sum);
}

/// Orders map keys the way the server orders msgpack values: nil, booleans,
/// integers, strings, lists, maps, bytes, then doubles. Integers compare by
/// value whatever their width.
pub(crate) fn key_order<'a>(left: &Natural<'a>, right: &Natural<'a>) -> Ordering {
    let left = key_form(left);
    let right = key_form(right);
    let (left, right) = (left.as_ref(), right.as_ref());

    key_class(left).cmp(&key_class(right)).then_with(|| {
        if let (Some(a), Some(b)) = (key_int(left), key_int(right)) {
            return a.cmp(&b);
        }
        if let (Some(a), Some(b)) = (key_double(left), key_double(right)) {
            return a.total_cmp(&b);
        }
        if let (Some(a), Some(b)) = (key_str(left), key_str(right)) {
            return a.as_bytes().cmp(b.as_bytes());
        }
        if let (Some(a), Some(b)) = (key_bytes(left), key_bytes(right)) {
            return a.cmp(b);
        }
        left.cmp(right)
    })
}

fn key_form<'n, 'a>(value: &'n Natural<'a>) -> Cow<'n, Natural<'a>> {
    match value {
        Natural::Value(v) => match &**v {
            Value::Segment(bytes) => Cow::Owned(Natural::Bytes(bytes.to_vec())),
            v => Cow::Owned(v.as_native()),
        },
        other => Cow::Borrowed(other),
    }
}

fn key_class(value: &Natural<'_>) -> u8 {
    match value {
        Natural::Null => 0,
        Natural::Bool(_) => 1,
        Natural::Int(_) | Natural::Long(_) | Natural::Byte(_) | Natural::Char(_) => 2,
        Natural::String(_) | Natural::Symbol(_) | Natural::Uuid(_) => 3,
        Natural::List(_) => 4,
        Natural::Map(_) | Natural::SortedMap(_) => 5,
        Natural::Bytes(_) | Natural::Buffer(_) | Natural::Object(_) => 6,
        Natural::Double(_) | Natural::Float(_) => 7,
        Natural::Value(_) => 8,
    }
}

fn key_int(value: &Natural<'_>) -> Option<i64> {
    match value {
        Natural::Int(v) => Some(i64::from(*v)),
        Natural::Long(v) => Some(*v),
        Natural::Byte(v) => Some(i64::from(*v)),
        Natural::Char(v) => Some(i64::from(u32::from(*v))),
        _ => None,
    }
}

fn key_double(value: &Natural<'_>) -> Option<f64> {
    match value {
        Natural::Double(v) => Some(*v),
        Natural::Float(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn key_str<'n>(value: &'n Natural<'_>) -> Option<Cow<'n, str>> {
    match value {
        Natural::String(v) | Natural::Symbol(v) => Some(Cow::Borrowed(v.as_str())),
        Natural::Uuid(v) => Some(Cow::Owned(v.to_string())),
        _ => None,
    }
}

fn key_bytes<'n>(value: &'n Natural<'_>) -> Option<&'n [u8]> {
    match value {
        Natural::Bytes(v) => Some(v.as_slice()),
        Natural::Buffer(v) => Some(&v[..]),
        _ => None,
    }
}

pub(crate) fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

pub(crate) fn write_map<K: fmt::Display, V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    entries: impl IntoIterator<Item = (K, V)>,
) -> fmt::Result {
    f.write_str("{")?;
    for (i, (k, v)) in entries.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", k, v)?;
    }
    f.write_str("}")
}

impl PartialEq for Natural<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Natural<'_> {}

impl PartialOrd for Natural<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Natural<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Natural::Value(a), Natural::Value(b)) => a.cmp(b),
            (Natural::Bytes(a), Natural::Bytes(b)) => a.cmp(b),
            (Natural::String(a), Natural::String(b)) => a.cmp(b),
            (Natural::Int(a), Natural::Int(b)) => a.cmp(b),
            (Natural::Long(a), Natural::Long(b)) => a.cmp(b),
            (Natural::Double(a), Natural::Double(b)) => a.total_cmp(b),
            (Natural::Float(a), Natural::Float(b)) => a.total_cmp(b),
            (Natural::Bool(a), Natural::Bool(b)) => a.cmp(b),
            (Natural::Byte(a), Natural::Byte(b)) => a.cmp(b),
            (Natural::Char(a), Natural::Char(b)) => a.cmp(b),
            (Natural::Symbol(a), Natural::Symbol(b)) => a.cmp(b),
            (Natural::Uuid(a), Natural::Uuid(b)) => a.cmp(b),
            (Natural::List(a), Natural::List(b)) => a.cmp(b),
            (Natural::Map(a), Natural::Map(b)) => cmp_unordered(a, b),
            (Natural::SortedMap(a), Natural::SortedMap(b)) => a.cmp(b),
            (Natural::Buffer(a), Natural::Buffer(b)) => a.cmp(b),
            (Natural::Object(a), Natural::Object(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Natural<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Natural::Null => {}
            Natural::Value(v) => v.hash(state),
            Natural::Bytes(v) => v.hash(state),
            Natural::String(v) | Natural::Symbol(v) => v.hash(state),
            Natural::Int(v) => v.hash(state),
            Natural::Long(v) => v.hash(state),
            Natural::Double(v) => v.to_bits().hash(state),
            Natural::Float(v) => v.to_bits().hash(state),
            Natural::Bool(v) => v.hash(state),
            Natural::Byte(v) => v.hash(state),
            Natural::Char(v) => v.hash(state),
            Natural::Uuid(v) => v.hash(state),
            Natural::List(v) => v.hash(state),
            Natural::Map(v) => hash_unordered(v, state),
            Natural::SortedMap(v) => v.hash(state),
            Natural::Buffer(v) => v.hash(state),
            Natural::Object(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Natural<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Natural::Null => f.write_str("null"),
            Natural::Value(v) => write!(f, "{}", v),
            Natural::Bytes(v) => f.write_str(&bytes_to_hex_string(v)),
            Natural::String(v) | Natural::Symbol(v) => f.write_str(v),
            Natural::Int(v) => write!(f, "{}", v),
            Natural::Long(v) => write!(f, "{}", v),
            Natural::Double(v) => write!(f, "{}", v),
            Natural::Float(v) => write!(f, "{}", v),
            Natural::Bool(v) => write!(f, "{}", v),
            Natural::Byte(v) => write!(f, "{}", v),
            Natural::Char(v) => write!(f, "{}", v),
            Natural::Uuid(v) => write!(f, "{}", v),
            Natural::List(v) => write_list(f, v),
            Natural::Map(v) => write_map(f, v),
            Natural::SortedMap(v) => write_map(f, v),
            Natural::Buffer(v) => f.write_str(&bytes_to_hex_string(v)),
            Natural::Object(v) => write!(f, "{:?}", v),
        }
    }
}

impl<'a> From<Value<'a>> for Natural<'a> {
    fn from(value: Value<'a>) -> Self {
        Natural::Value(Box::new(value))
    }
}

impl From<&str> for Natural<'_> {
    fn from(value: &str) -> Self {
        Natural::String(value.to_string())
    }
}

impl From<String> for Natural<'_> {
    fn from(value: String) -> Self {
        Natural::String(value)
    }
}

impl From<Vec<u8>> for Natural<'_> {
    fn from(value: Vec<u8>) -> Self {
        Natural::Bytes(value)
    }
}

impl From<&[u8]> for Natural<'_> {
    fn from(value: &[u8]) -> Self {
        Natural::Bytes(value.to_vec())
    }
}

macro_rules! impl_from_scalar {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Natural<'_> {
            fn from(value: $t) -> Self {
                Natural::$variant(value)
            }
        }
    };
}

impl_from_scalar!(i32, Int);
impl_from_scalar!(i64, Long);
impl_from_scalar!(f64, Double);
impl_from_scalar!(f32, Float);
impl_from_scalar!(bool, Bool);
impl_from_scalar!(u8, Byte);
impl_from_scalar!(char, Char);
impl_from_scalar!(Uuid, Uuid);
impl_from_scalar!(Bytes, Buffer);
impl_from_scalar!(Opaque, Object);

impl<'a> From<Vec<Natural<'a>>> for Natural<'a> {
    fn from(value: Vec<Natural<'a>>) -> Self {
        Natural::List(value)
    }
}

impl<'a> From<IndexMap<Natural<'a>, Natural<'a>>> for Natural<'a> {
    fn from(value: IndexMap<Natural<'a>, Natural<'a>>) -> Self {
        Natural::Map(value)
    }
}

impl<'a> From<HashMap<Natural<'a>, Natural<'a>>> for Natural<'a> {
    fn from(value: HashMap<Natural<'a>, Natural<'a>>) -> Self {
        Natural::Map(value.into_iter().collect())
    }
}

impl<'a> From<BTreeMap<Natural<'a>, Natural<'a>>> for Natural<'a> {
    fn from(value: BTreeMap<Natural<'a>, Natural<'a>>) -> Self {
        Natural::SortedMap(value)
    }
}

/// `None` is always [`Natural::Null`], whatever `T` is.
impl<'a, T: Into<Natural<'a>>> From<Option<T>> for Natural<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Natural::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(value: &Natural<'_>) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn none_is_null() {
        assert!(Natural::from(None::<String>).is_null());
        assert!(Natural::from(None::<i64>).is_null());
        assert_eq!(Natural::from(Some(5i64)), Natural::Long(5));
    }

    #[test]
    fn map_equality_ignores_insertion_order() {
        let a = Natural::map([("a", 1i64), ("b", 2i64)]);
        let b = Natural::map([("b", 2i64), ("a", 1i64)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn sorted_and_unordered_maps_differ() {
        let unordered = Natural::map([("a", 1i64)]);
        let sorted = Natural::sorted_map([("a", 1i64)]);
        assert_ne!(unordered, sorted);
    }

    #[test]
    fn floats_compare_by_bits() {
        assert_eq!(Natural::Double(f64::NAN), Natural::Double(f64::NAN));
        assert_ne!(Natural::Double(0.0), Natural::Double(-0.0));
        assert_eq!(hash_of(&Natural::Float(1.5)), hash_of(&Natural::Float(1.5)));
    }

    #[test]
    fn variants_never_cross_compare() {
        assert_ne!(Natural::Int(1), Natural::Long(1));
        assert_ne!(Natural::Byte(1), Natural::Int(1));
        assert_ne!(Natural::String("A".into()), Natural::Symbol("A".into()));
    }

    #[test]
    fn naturals_as_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(Natural::from("b"), Natural::Long(2));
        map.insert(Natural::from("a"), Natural::Long(1));
        let keys: Vec<_> = map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn display() {
        assert_eq!(Natural::Null.to_string(), "null");
        assert_eq!(Natural::from(vec![0xcau8, 0xfe]).to_string(), "cafe");
        assert_eq!(Natural::list([1i64, 2, 3]).to_string(), "[1, 2, 3]");
        assert_eq!(Natural::sorted_map([("k", "v")]).to_string(), "{k=v}");
    }

    #[test]
    fn key_order_follows_server_types() {
        let ascending = [
            Natural::Null,
            Natural::Bool(false),
            Natural::Bool(true),
            Natural::Long(-4),
            Natural::Byte(2),
            Natural::Int(3),
            Natural::Char('A'),
            Natural::Long(1000),
            Natural::from("a"),
            Natural::Symbol("b".into()),
            Natural::list([1i64]),
            Natural::map([(1i64, 1i64)]),
            Natural::Bytes(vec![0]),
            Natural::Buffer(Bytes::from_static(&[1])),
            Natural::Float(-1.0),
            Natural::Double(0.5),
        ];
        for pair in ascending.windows(2) {
            assert_eq!(key_order(&pair[0], &pair[1]), Ordering::Less, "{} < {}", pair[0], pair[1]);
            assert_eq!(key_order(&pair[1], &pair[0]), Ordering::Greater);
        }
        assert_eq!(key_order(&Natural::Int(7), &Natural::Long(7)), Ordering::Equal);
        assert_eq!(
            key_order(&Natural::from(Value::Long(2)), &Natural::Int(3)),
            Ordering::Less
        );
    }
}
