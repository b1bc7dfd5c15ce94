//! Employee gender as exchanged with the HR API.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Employee gender.
///
/// The API encodes this as an integer enum (`0` = male, `1` = female). Some
/// endpoints return the name instead, so deserialization accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    /// All variants in form display order.
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Male => 0,
            Self::Female => 1,
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Decode a wire code.
    #[must_use]
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Male),
            1 => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u64>() {
            return Self::from_code(code).ok_or_else(|| format!("invalid gender code: {s}"));
        }
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(format!("invalid gender: {s}")),
        }
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Code(u64),
            Name(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Code(code) => Self::from_code(code)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid gender code: {code}"))),
            Wire::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_code_or_name() {
        assert_eq!(serde_json::from_str::<Gender>("0").unwrap(), Gender::Male);
        assert_eq!(serde_json::from_str::<Gender>("1").unwrap(), Gender::Female);
        assert_eq!(
            serde_json::from_str::<Gender>("\"Female\"").unwrap(),
            Gender::Female
        );
        assert!(serde_json::from_str::<Gender>("7").is_err());
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "1");
    }

    #[test]
    fn test_from_str_form_values() {
        assert_eq!("0".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert!("".parse::<Gender>().is_err());
    }
}
