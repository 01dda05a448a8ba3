//! Validated primitive types shared across the agent services.

/// Maximum length of a FHIR logical id.
pub const MAX_PATIENT_ID_LEN: usize = 64;

/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or contained only whitespace
    #[error("patient id cannot be empty")]
    Empty,
    /// The input exceeded the FHIR id length limit
    #[error("patient id exceeds {MAX_PATIENT_ID_LEN} characters")]
    TooLong,
    /// The input contained a character outside `[A-Za-z0-9.-]`
    #[error("patient id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A patient identifier that is safe to embed in a FHIR request path or query.
///
/// FHIR logical ids are restricted to `[A-Za-z0-9\-\.]{1,64}`. Enforcing that here means
/// no caller-supplied identifier can add path segments or query parameters to an outbound
/// retrieval URL. Surrounding whitespace is trimmed during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientId(String);

impl PatientId {
    /// Creates a new `PatientId` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if the trimmed input is empty, longer than
    /// [`MAX_PATIENT_ID_LEN`], or contains a character FHIR does not allow in ids.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() > MAX_PATIENT_ID_LEN {
            return Err(IdError::TooLong);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
        {
            return Err(IdError::InvalidCharacter(bad));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for PatientId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::new(&s).map_err(serde::de::Error::custom)
    }
}
