/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input exceeded the permitted length
    #[error("Text exceeds maximum length of {0} characters")]
    TooLong(usize),
    /// A field name contained characters other than ASCII letters and digits
    #[error("Field name must contain only ASCII letters and digits: {0}")]
    InvalidFieldName(String),
}

/// Free text entered at registration, such as a mother's name.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character
/// and no more than [`NonEmptyText::MAX_LEN`] characters. The input is trimmed of leading and
/// trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Longest text accepted, in characters.
    pub const MAX_LEN: usize = 256;

    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty or longer than `MAX_LEN` characters, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(TextError::TooLong(Self::MAX_LEN));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// The name of a clinical form field, e.g. `MaternalAge`.
///
/// Field names arrive from request paths and command-line arguments, so they are restricted to
/// a short run of ASCII letters and digits before they are looked up in the field catalogue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(String);

impl FieldName {
    /// Longest field name accepted.
    pub const MAX_LEN: usize = 64;

    /// Parses a field name, trimming surrounding whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(TextError::TooLong(Self::MAX_LEN));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(TextError::InvalidFieldName(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for FieldName {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Royal Infirmary  ").expect("should accept");
        assert_eq!(text.as_str(), "Royal Infirmary");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new("   ").expect_err("should reject whitespace");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn test_non_empty_text_limits_length_in_characters() {
        let name = "é".repeat(NonEmptyText::MAX_LEN);
        let text = NonEmptyText::new(&name).expect("multi-byte text at the limit");
        assert_eq!(text.as_str().chars().count(), 256);

        let err = NonEmptyText::new(format!("{name}e")).expect_err("should reject");
        assert!(matches!(err, TextError::TooLong(256)));
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_overlong() {
        let json = format!("\"{}\"", "a".repeat(300));
        let err = serde_json::from_str::<NonEmptyText>(&json).expect_err("should reject");
        assert!(err.to_string().contains("maximum length of 256"));
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_empty() {
        let err = serde_json::from_str::<NonEmptyText>("\"\"").expect_err("should reject empty");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_field_name_accepts_pascal_case() {
        let name: FieldName = "UterineArteryPulsatilityIndex".parse().expect("should accept");
        assert_eq!(name.as_str(), "UterineArteryPulsatilityIndex");
    }

    #[test]
    fn test_field_name_rejects_path_characters() {
        let err = FieldName::new("../MaternalAge").expect_err("should reject");
        assert!(matches!(err, TextError::InvalidFieldName(name) if name == "../MaternalAge"));
    }

    #[test]
    fn test_field_name_rejects_overlong_input() {
        let err = FieldName::new("A".repeat(65)).expect_err("should reject");
        assert!(matches!(err, TextError::TooLong(64)));
    }
}
