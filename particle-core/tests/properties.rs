//! Property tests for the flat encoder and value identity.

use indexmap::IndexMap;
use particle_core::{CodecConfig, Natural, Value};
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn written_len(value: &Value<'_>) -> (usize, usize) {
    let size = value.estimate_size(&CodecConfig::default()).unwrap();
    // Slack on both sides catches writes outside the estimated window.
    let mut buffer = vec![0xaa; size + 16];
    let written = value.write(&mut buffer, 8);
    assert!(buffer[..8].iter().all(|&b| b == 0xaa));
    assert!(buffer[8 + written..].iter().all(|&b| b == 0xaa));
    (size, written)
}

fn hash_of(value: &Value<'_>) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn natural() -> impl Strategy<Value = Natural<'static>> {
    let leaf = prop_oneof![
        Just(Natural::Null),
        any::<i64>().prop_map(Natural::Long),
        any::<i32>().prop_map(Natural::Int),
        any::<f64>().prop_map(Natural::Double),
        any::<bool>().prop_map(Natural::Bool),
        ".{0,40}".prop_map(Natural::String),
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Natural::Bytes),
    ];
    leaf.prop_recursive(3, 64, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Natural::List),
            proptest::collection::vec((any::<i64>(), inner), 0..8)
                .prop_map(|entries| Natural::map(entries)),
        ]
    })
}

proptest! {
    #[test]
    fn strings_write_estimated_size(s in ".*") {
        let (size, written) = written_len(&Value::string(s));
        prop_assert_eq!(size, written);
    }

    #[test]
    fn bytes_write_estimated_size(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let (size, written) = written_len(&Value::segment(&bytes));
        prop_assert_eq!(size, written);
        let (size, written) = written_len(&Value::bytes(bytes));
        prop_assert_eq!(size, written);
    }

    #[test]
    fn numbers_write_eight_bytes(v in any::<i64>(), d in any::<f64>(), f in any::<f32>()) {
        for value in [Value::long(v), Value::int(v as i32), Value::double(d), Value::float(f)] {
            prop_assert_eq!(written_len(&value), (8, 8));
        }
    }

    #[test]
    fn geo_json_writes_estimated_size(s in ".*") {
        let (size, written) = written_len(&Value::geo_json(s.clone()));
        prop_assert_eq!(size, written);
        prop_assert_eq!(size, 3 + s.len());
    }

    #[test]
    fn collections_write_estimated_size(item in natural()) {
        let value = Value::from_natural(item, &CodecConfig::default());
        let (size, written) = written_len(&value);
        prop_assert_eq!(size, written);
    }

    #[test]
    fn unordered_maps_ignore_insertion_order(
        entries in proptest::collection::btree_map(any::<i64>(), ".{0,8}", 0..32)
    ) {
        let forward: IndexMap<Natural, Natural> = entries
            .iter()
            .map(|(k, v)| (Natural::Long(*k), Natural::from(v.as_str())))
            .collect();
        let backward: IndexMap<Natural, Natural> = forward
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let a = Value::map(forward);
        let b = Value::map(backward);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }
}
