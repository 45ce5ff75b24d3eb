//! Keyword enums
//!
//! Most option fields in the API are lowercase keywords (`"short"`,
//! `"watercolor"`, `"premium"`). `keyword_enum!` declares a fieldless enum
//! together with its keyword table, `FromStr`, `Display` and string-based
//! serde impls so the table is written exactly once.

/// Declares a keyword-backed enum
///
/// Parsing is case-insensitive and ignores surrounding whitespace;
/// unknown keywords produce a `StoryMagicError::Validation`.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $key:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire keyword for this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::StoryMagicError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($key => Ok($name::$variant),)+
                    other => Err($crate::error::StoryMagicError::Validation(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use keyword_enum;

#[cfg(test)]
mod tests {
    keyword_enum! {
        enum Color {
            Red => "red",
            DarkBlue => "dark-blue",
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("RED".parse::<Color>().unwrap(), Color::Red);
        assert_eq!(" dark-blue ".parse::<Color>().unwrap(), Color::DarkBlue);
    }

    #[test]
    fn test_unknown_keyword_is_rejected() {
        let err = "green".parse::<Color>().unwrap_err();
        assert!(err.to_string().contains("green"));
    }

    #[test]
    fn test_serde_uses_keyword() {
        let json = serde_json::to_string(&Color::DarkBlue).unwrap();
        assert_eq!(json, "\"dark-blue\"");
        let back: Color = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(back, Color::Red);
    }

    #[test]
    fn test_all_lists_every_variant() {
        assert_eq!(Color::ALL, &[Color::Red, Color::DarkBlue]);
    }
}
