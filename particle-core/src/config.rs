use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::ValueError;

static GLOBAL: OnceLock<CodecConfig> = OnceLock::new();
static DEFAULT: CodecConfig = CodecConfig {
    use_bool_bin: false,
    disable_serializer: false,
    disable_deserializer: false,
    return_map_for_key_value: false,
};

/// Codec settings that apply for the lifetime of a client.
///
/// Pass it explicitly to dispatch, encoding and projection calls, or
/// install it once at startup and read it back with [`CodecConfig::global`].
/// Build with `CodecConfig::builder().use_bool_bin(true).build()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Send booleans as the BOOL particle type. When false they are sent
    /// as an 8-byte INTEGER (1 or 0); servers before 5.6 require false.
    pub use_bool_bin: bool,

    /// Refuse to run the generic object serializer for opaque values.
    pub disable_serializer: bool,

    /// Refuse to decode generically serialized payloads read back from the server.
    /// Kept separate from `disable_serializer` so existing blobs stay readable
    /// when new ones are forbidden.
    pub disable_deserializer: bool,

    /// Return a map for key/value map reads that the server answers with a
    /// list of pairs. Only consulted by decoders.
    pub return_map_for_key_value: bool,
}

impl CodecConfig {
    /// Start building a config from the defaults (every flag false).
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder {
            config: CodecConfig::default(),
        }
    }

    /// Installs this config as the process-wide one.
    ///
    /// May succeed only once; later calls leave the first config in place.
    pub fn install(self) -> Result<(), ValueError> {
        GLOBAL.set(self).map_err(|_| {
            log::warn!("ignoring second codec configuration install");
            ValueError::ConfigInstalled
        })
    }

    /// Returns the installed process-wide config, or the defaults if none was installed.
    pub fn global() -> &'static CodecConfig {
        GLOBAL.get().unwrap_or(&DEFAULT)
    }
}

/// Fluent builder for `CodecConfig`.
#[derive(Clone, Debug)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    pub fn use_bool_bin(mut self, enabled: bool) -> Self {
        self.config.use_bool_bin = enabled;
        self
    }
    pub fn disable_serializer(mut self, disabled: bool) -> Self {
        self.config.disable_serializer = disabled;
        self
    }
    pub fn disable_deserializer(mut self, disabled: bool) -> Self {
        self.config.disable_deserializer = disabled;
        self
    }
    pub fn return_map_for_key_value(mut self, enabled: bool) -> Self {
        self.config.return_map_for_key_value = enabled;
        self
    }

    pub fn build(self) -> CodecConfig {
        self.config
    }
}
