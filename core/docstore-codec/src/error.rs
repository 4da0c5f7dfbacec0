//! Error types for the codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while converting values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value's shape is not one of the recognised forms.
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    /// A float with no representation in the store's JSON transport.
    #[error("unsupported value type: non-finite double {0}")]
    NonFiniteFloat(f64),

    /// A property of an entity failed to convert.
    #[error("property {name}: {source}")]
    Property {
        name: String,
        #[source]
        source: Box<CodecError>,
    },

    /// Wire JSON that does not follow the store's encoding.
    #[error("malformed wire value: {0}")]
    Malformed(String),
}

impl CodecError {
    /// Wraps `self` with the name of the property it came from.
    pub fn in_property(self, name: &str) -> Self {
        Self::Property {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Whether the root cause is an unsupported value shape.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Self::UnsupportedType(_) | Self::NonFiniteFloat(_) => true,
            Self::Property { source, .. } => source.is_unsupported(),
            Self::Malformed(_) => false,
        }
    }
}
