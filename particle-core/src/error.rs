use std::io;

/// Server-compatible result code attached to every codec error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    /// Generic client-side failure.
    ClientError = -1,
    /// The generic object serializer failed.
    SerializeError = -10,
    /// A value was used where its type is not allowed.
    ParameterError = 4,
}

impl ResultCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Error type for value encoding, validation and projection.
///
/// None of these are transient: each is a deterministic function of the
/// input value and the codec configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("object serializer has been disabled")]
    SerializerDisabled,

    #[error("object deserializer has been disabled")]
    DeserializerDisabled,

    /// The generic serializer rejected the object graph.
    #[error("serialize: {0}")]
    Serialize(#[from] ciborium::ser::Error<io::Error>),

    /// A JBLOB payload could not be decoded.
    #[error("deserialize: {0}")]
    Deserialize(#[from] ciborium::de::Error<io::Error>),

    #[error("invalid key type: {0}")]
    InvalidKeyType(&'static str),

    /// Range sentinels have no particle type.
    #[error("invalid particle type: {0}")]
    InvalidParticleType(&'static str),

    /// Range sentinels have no scripting-engine counterpart.
    #[error("invalid script type: {0}")]
    InvalidScriptType(&'static str),

    #[error("codec configuration is already installed")]
    ConfigInstalled,
}

impl ValueError {
    /// Returns the result code the server would report for the same failure.
    pub fn result_code(&self) -> ResultCode {
        match self {
            ValueError::Serialize(_) | ValueError::Deserialize(_) => ResultCode::SerializeError,
            ValueError::InvalidKeyType(_)
            | ValueError::InvalidParticleType(_)
            | ValueError::InvalidScriptType(_) => ResultCode::ParameterError,
            ValueError::SerializerDisabled
            | ValueError::DeserializerDisabled
            | ValueError::ConfigInstalled => ResultCode::ClientError,
        }
    }
}
