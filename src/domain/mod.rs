/// Implements `as_str`, `Display` and `FromStr` for enums persisted as
/// upper-case varchar codes.
macro_rules! db_code_enum {
    ($name:ident, $what:literal, { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::errors::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err($crate::domain::errors::DomainError::InvalidInput(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }
    };
}

pub mod catalog;
pub mod comment;
pub mod errors;
pub mod line_sync;
pub mod order;
pub mod ports;
pub mod receipt_parser;
pub mod shipment;
