//! Naming policies: attribute name to stored family/qualifier name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Deterministic transform from a Rust attribute name to the name stored in
/// the column space.
///
/// Separating policies split the name into words at case boundaries (a run
/// of capitals is one word, so `userID` gives `user_id`), join them with the
/// separator and change case:
///
/// | policy                        | `userName`  | `user_name` |
/// |-------------------------------|-------------|-------------|
/// | `Identity`                    | `userName`  | `user_name` |
/// | `LowerCaseWithUnderscores`    | `user_name` | `user_name` |
/// | `LowerCaseWithDashes`         | `user-name` | `user_name` |
/// | `UpperCaseWithUnderscores`    | `USER_NAME` | `USER_NAME` |
///
/// Applying a lower-case policy to a name it already produced returns the same
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NamingPolicy {
    #[default]
    Identity,
    LowerCaseWithUnderscores,
    LowerCaseWithDashes,
    UpperCaseWithUnderscores,
}

impl NamingPolicy {
    pub const ALL: [NamingPolicy; 4] = [
        NamingPolicy::Identity,
        NamingPolicy::LowerCaseWithUnderscores,
        NamingPolicy::LowerCaseWithDashes,
        NamingPolicy::UpperCaseWithUnderscores,
    ];

    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingPolicy::Identity => "identity",
            NamingPolicy::LowerCaseWithUnderscores => "lower-case-with-underscores",
            NamingPolicy::LowerCaseWithDashes => "lower-case-with-dashes",
            NamingPolicy::UpperCaseWithUnderscores => "upper-case-with-underscores",
        }
    }

    /// Translate an attribute name.
    pub fn translate(&self, name: &str) -> String {
        match self {
            NamingPolicy::Identity => name.to_string(),
            NamingPolicy::LowerCaseWithUnderscores => separate(name, '_', false),
            NamingPolicy::LowerCaseWithDashes => separate(name, '-', false),
            NamingPolicy::UpperCaseWithUnderscores => separate(name, '_', true),
        }
    }
}

/// A word starts at an upper-case character that follows a lower-case one
/// or a digit, or that ends a run of capitals followed by lower case, so
/// `userID` gives `user_id` and `HTTPServer` gives `http_server`.
fn separate(name: &str, separator: char, upper: bool) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 && ch.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push(separator);
            }
        }
        if upper {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

impl fmt::Display for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingPolicy {
    type Err = Error;

    /// Accepts the canonical names with either `-` or `_` as word separator,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "identity" => Ok(NamingPolicy::Identity),
            "lower-case-with-underscores" => Ok(NamingPolicy::LowerCaseWithUnderscores),
            "lower-case-with-dashes" => Ok(NamingPolicy::LowerCaseWithDashes),
            "upper-case-with-underscores" => Ok(NamingPolicy::UpperCaseWithUnderscores),
            _ => Err(Error::UnknownNamingPolicy(s.to_string())),
        }
    }
}

impl Serialize for NamingPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NamingPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
