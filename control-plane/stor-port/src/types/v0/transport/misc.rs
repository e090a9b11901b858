use std::collections::BTreeMap;

/// Free form key/value configuration, as used by pools, instances, profiles and devices.
/// Ordered so that every rendering of a configuration is deterministic.
pub type ConfigMap = BTreeMap<String, String>;

#[macro_export]
macro_rules! rpc_impl_string_id {
    ($Name:ident, $Doc:literal) => {
        #[doc = $Doc]
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            Debug,
            Default,
            Clone,
            Eq,
            PartialEq,
            Hash,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $Name(String);

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $Name {
            /// Build Self from a string trait id.
            pub fn new<T: Into<String>>(id: T) -> Self {
                $Name(id.into())
            }
            /// Get the id as a string slice.
            pub fn as_str<'a>(&'a self) -> &'a str {
                self.0.as_str()
            }
        }

        impl From<&str> for $Name {
            fn from(id: &str) -> Self {
                $Name(id.to_string())
            }
        }
        impl From<String> for $Name {
            fn from(id: String) -> Self {
                $Name(id)
            }
        }
        impl From<&$Name> for $Name {
            fn from(id: &$Name) -> $Name {
                id.clone()
            }
        }
        impl From<$Name> for String {
            fn from(id: $Name) -> String {
                id.0
            }
        }
        impl From<&$Name> for String {
            fn from(id: &$Name) -> String {
                id.to_string()
            }
        }
    };
}
