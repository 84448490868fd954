//! Feature and capability tags.
//!
//! Both are opaque strings (e.g. `"analytics.view"`, `"classes.create"`).
//! Dotted names are a naming convention only; nothing here parses them.
//! They live in separate namespaces, so they are separate types.

use std::borrow::Cow;

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

const MAX_TAG_LEN: usize = 128;

fn validate_tag(kind: &'static str, value: &str) -> Result<(), ConfigurationError> {
    let reason = if value.is_empty() {
        "empty"
    } else if value.len() > MAX_TAG_LEN {
        "longer than 128 bytes"
    } else if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        "contains whitespace or control characters"
    } else {
        return Ok(());
    };

    Err(ConfigurationError::InvalidTag {
        kind,
        value: value.to_string(),
        reason,
    })
}

macro_rules! impl_tag {
    ($(#[$meta:meta])* $t:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $t(Cow<'static, str>);

        impl $t {
            /// Tag from a compile-time constant. Not validated; reserved for
            /// built-in tables, which are checked by tests.
            pub const fn from_static(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }

            /// Validated constructor for tags coming from storage or callers.
            pub fn parse(name: impl Into<Cow<'static, str>>) -> Result<Self, ConfigurationError> {
                let name = name.into();
                validate_tag($kind, &name)?;
                Ok(Self(name))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s.to_string())
            }
        }

        impl TryFrom<String> for $t {
            type Error = ConfigurationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0.into_owned()
            }
        }
    };
}

impl_tag!(
    /// Product area gated by plan and tenant overrides (e.g. `"fees.online"`).
    Feature,
    "feature"
);

impl_tag!(
    /// Fine-grained user action gated by role (e.g. `"staff.invite"`).
    Capability,
    "capability"
);
