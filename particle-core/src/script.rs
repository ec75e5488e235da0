//! Projection of values into an embedded scripting engine, for arguments
//! passed to server-side functions.

use crate::blob;
use crate::config::CodecConfig;
use crate::error::ValueError;
use crate::natural::Natural;
use crate::particle::ParticleType;
use crate::value::{MapEntries, Value};

/// Constructors for the engine's native values.
pub trait ScriptEngine {
    type Value;

    fn nil(&self) -> Self::Value;
    fn integer(&self, value: i64) -> Self::Value;
    fn float(&self, value: f64) -> Self::Value;
    fn boolean(&self, value: bool) -> Self::Value;
    /// Engine string built from raw bytes; not required to be UTF-8.
    fn string(&self, value: &[u8]) -> Self::Value;
    /// Byte payload tagged with its particle type.
    fn bytes(&self, value: &[u8], particle: ParticleType) -> Self::Value;
    fn list(&self, items: Vec<Self::Value>) -> Self::Value;
    fn map(&self, entries: Vec<(Self::Value, Self::Value)>) -> Self::Value;
}

impl Value<'_> {
    /// Builds the engine-native counterpart of this value.
    ///
    /// Opaque blobs are serialized first, so this fails when the serializer
    /// is disabled. Range sentinels always fail.
    pub fn to_script<E: ScriptEngine>(&self, engine: &E, config: &CodecConfig) -> Result<E::Value, ValueError> {
        Ok(match self {
            Value::Null => engine.nil(),
            Value::Bytes { bytes, particle } => engine.bytes(bytes, *particle),
            Value::Segment(bytes) => engine.string(bytes),
            Value::Byte(v) => engine.integer(i64::from(*v)),
            Value::String(v) | Value::GeoJson(v) => engine.string(v.as_bytes()),
            Value::Int(v) => engine.integer(i64::from(*v)),
            Value::Long(v) => engine.integer(*v),
            Value::Double(v) => engine.float(*v),
            Value::Float(v) => engine.float(f64::from(*v)),
            Value::Bool(v) | Value::BoolInt(v) => engine.boolean(*v),
            Value::Blob { encoded, .. } => {
                self.estimate_size(config)?;
                engine.bytes(encoded.get().unwrap_or_default(), ParticleType::JBlob)
            }
            Value::Hll(bytes) => engine.bytes(bytes, ParticleType::Hll),
            Value::Array { values, .. } => engine.list(
                values
                    .iter()
                    .map(|v| v.to_script(engine, config))
                    .collect::<Result<_, _>>()?,
            ),
            Value::List { list, .. } => natural_list(list, engine, config)?,
            Value::Map { map: MapEntries::Unordered(map), .. } => natural_map(map, engine, config)?,
            Value::Map { map: MapEntries::Sorted(map), .. } => natural_map(map, engine, config)?,
            Value::SortedMap { entries, .. } => {
                natural_map(entries.iter().map(|(k, v)| (k, v)), engine, config)?
            }
            Value::Infinity => return Err(ValueError::InvalidScriptType("INF")),
            Value::Wildcard => return Err(ValueError::InvalidScriptType("wildcard")),
        })
    }
}

impl Natural<'_> {
    /// Builds the engine-native counterpart of this value, following the
    /// same rules as its dispatched [`Value`].
    pub fn to_script<E: ScriptEngine>(&self, engine: &E, config: &CodecConfig) -> Result<E::Value, ValueError> {
        Ok(match self {
            Natural::Null => engine.nil(),
            Natural::Value(v) => v.to_script(engine, config)?,
            Natural::Bytes(v) => engine.bytes(v, ParticleType::Blob),
            Natural::String(v) | Natural::Symbol(v) => engine.string(v.as_bytes()),
            Natural::Int(v) => engine.integer(i64::from(*v)),
            Natural::Long(v) => engine.integer(*v),
            Natural::Double(v) => engine.float(*v),
            Natural::Float(v) => engine.float(f64::from(*v)),
            Natural::Bool(v) => engine.boolean(*v),
            Natural::Byte(v) => engine.integer(i64::from(*v)),
            Natural::Char(v) => engine.integer(i64::from(u32::from(*v))),
            Natural::Uuid(v) => engine.string(v.to_string().as_bytes()),
            Natural::List(v) => natural_list(v, engine, config)?,
            Natural::Map(v) => natural_map(v, engine, config)?,
            Natural::SortedMap(v) => natural_map(v, engine, config)?,
            Natural::Buffer(v) => engine.bytes(v, ParticleType::Blob),
            Natural::Object(v) => engine.bytes(&blob::serialize(v, config)?, ParticleType::JBlob),
        })
    }
}

fn natural_list<E: ScriptEngine>(
    list: &[Natural<'_>],
    engine: &E,
    config: &CodecConfig,
) -> Result<E::Value, ValueError> {
    let items = list
        .iter()
        .map(|item| item.to_script(engine, config))
        .collect::<Result<_, _>>()?;
    Ok(engine.list(items))
}

fn natural_map<'n, 'a: 'n, E: ScriptEngine>(
    entries: impl IntoIterator<Item = (&'n Natural<'a>, &'n Natural<'a>)>,
    engine: &E,
    config: &CodecConfig,
) -> Result<E::Value, ValueError> {
    let entries = entries
        .into_iter()
        .map(|(k, v)| Ok((k.to_script(engine, config)?, v.to_script(engine, config)?)))
        .collect::<Result<_, ValueError>>()?;
    Ok(engine.map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Lua {
        Nil,
        Int(i64),
        Num(f64),
        Bool(bool),
        Str(Vec<u8>),
        Bytes(Vec<u8>, ParticleType),
        List(Vec<Lua>),
        Map(Vec<(Lua, Lua)>),
    }

    struct Engine;

    impl ScriptEngine for Engine {
        type Value = Lua;

        fn nil(&self) -> Lua {
            Lua::Nil
        }
        fn integer(&self, value: i64) -> Lua {
            Lua::Int(value)
        }
        fn float(&self, value: f64) -> Lua {
            Lua::Num(value)
        }
        fn boolean(&self, value: bool) -> Lua {
            Lua::Bool(value)
        }
        fn string(&self, value: &[u8]) -> Lua {
            Lua::Str(value.to_vec())
        }
        fn bytes(&self, value: &[u8], particle: ParticleType) -> Lua {
            Lua::Bytes(value.to_vec(), particle)
        }
        fn list(&self, items: Vec<Lua>) -> Lua {
            Lua::List(items)
        }
        fn map(&self, entries: Vec<(Lua, Lua)>) -> Lua {
            Lua::Map(entries)
        }
    }

    fn project(value: &Value<'_>) -> Result<Lua, ValueError> {
        value.to_script(&Engine, &CodecConfig::default())
    }

    #[test]
    fn scalars() {
        assert_eq!(project(&Value::Null).unwrap(), Lua::Nil);
        assert_eq!(project(&Value::Byte(4)).unwrap(), Lua::Int(4));
        assert_eq!(project(&Value::Float(1.5)).unwrap(), Lua::Num(1.5));
        assert_eq!(project(&Value::BoolInt(true)).unwrap(), Lua::Bool(true));
        assert_eq!(project(&Value::geo_json("{}")).unwrap(), Lua::Str(b"{}".to_vec()));
        assert_eq!(
            project(&Value::hll(vec![1, 2])).unwrap(),
            Lua::Bytes(vec![1, 2], ParticleType::Hll)
        );
    }

    #[test]
    fn collections() {
        let list = Value::list(vec![Natural::Long(1), Natural::from("a")]);
        assert_eq!(
            project(&list).unwrap(),
            Lua::List(vec![Lua::Int(1), Lua::Str(b"a".to_vec())])
        );

        let map = Value::sorted_map(
            vec![(Natural::Long(2), Natural::Bool(false))],
            crate::particle::MapOrder::KeyOrdered,
        );
        assert_eq!(project(&map).unwrap(), Lua::Map(vec![(Lua::Int(2), Lua::Bool(false))]));
    }

    #[test]
    fn blob_projects_serialized_bytes() {
        let value = Value::as_blob(5u32);
        assert_eq!(project(&value).unwrap(), Lua::Bytes(vec![0x05], ParticleType::JBlob));

        let config = CodecConfig::builder().disable_serializer(true).build();
        let err = Value::as_blob(5u32).to_script(&Engine, &config).unwrap_err();
        assert!(matches!(err, ValueError::SerializerDisabled));
    }

    #[test]
    fn sentinels_refuse() {
        assert!(matches!(project(&Value::Infinity), Err(ValueError::InvalidScriptType("INF"))));
        assert!(matches!(
            project(&Value::Wildcard),
            Err(ValueError::InvalidScriptType("wildcard"))
        ));

        let nested = Value::list(vec![Natural::from(Value::Wildcard)]);
        assert!(project(&nested).is_err());
    }

    #[test]
    fn natural_char_is_integer() {
        let lua = Natural::Char('a').to_script(&Engine, &CodecConfig::default()).unwrap();
        assert_eq!(lua, Lua::Int(97));
    }
}
