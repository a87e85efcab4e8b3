pub mod container;
pub mod device;
pub mod site;
pub mod user;

use thiserror::Error;

/// Decode failure for a closed string enum stored as TEXT.
#[derive(Debug, Error)]
#[error("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Closed string-backed enum: serde renames, `as_str`, `FromStr`, and the
/// `TryFrom<String>` used by `#[sqlx(try_from = "String")]` column decoding.
macro_rules! str_enum {
    ($name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::models::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::models::ParseEnumError::new($kind, other)),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = crate::models::ParseEnumError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for crate::database::SqlParam {
            fn from(v: $name) -> Self {
                crate::database::SqlParam::Text(v.as_str().to_string())
            }
        }
    };
}

pub(crate) use str_enum;
