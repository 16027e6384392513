//! Closed string vocabularies shared by the wire format, the database and the
//! REST API.

/// Token that did not belong to one of the closed vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} token: {token}")]
pub struct VocabularyError {
    pub vocabulary: &'static str,
    pub token: String,
}

impl VocabularyError {
    pub fn new(vocabulary: &'static str, token: &str) -> Self {
        Self {
            vocabulary,
            token: token.to_string(),
        }
    }
}

/// Implements `ALL`, `as_str`, `Display` and `FromStr` for a unit-only enum
/// over its exact text tokens.
macro_rules! text_enum {
    ($ty:ident, $name:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $token),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::vocabulary::VocabularyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($ty::$variant),)+
                    other => Err($crate::vocabulary::VocabularyError::new($name, other)),
                }
            }
        }
    };
}
