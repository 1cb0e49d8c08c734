/// Errors that can occur when creating validated path segments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    /// The input was empty
    #[error("segment cannot be empty")]
    Empty,

    /// The input was `.` or `..`
    #[error("segment cannot be a relative directory reference: {0}")]
    DotReference(String),

    /// The input contained a path separator or NUL byte
    #[error("segment contains a forbidden character: {0:?}")]
    ForbiddenCharacter(char),
}

/// A string that is safe to use as exactly one component of a filesystem path.
///
/// Collision strings, access codes and filenames all arrive from clients and end up joined onto
/// the storage root. A `PathSegment` guarantees that joining it onto a directory produces a
/// direct child of that directory: it is non-empty, is neither `.` nor `..`, and contains no
/// `/`, `\` or NUL.
///
/// Unlike trimmed text types, the input is kept verbatim. Leading or trailing spaces are
/// legitimate in filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment(String);

impl PathSegment {
    /// Creates a new `PathSegment` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `SegmentError` if the input is empty, is a dot reference, or contains a path
    /// separator or NUL byte.
    pub fn new(input: impl AsRef<str>) -> Result<Self, SegmentError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(SegmentError::Empty);
        }
        if input == "." || input == ".." {
            return Err(SegmentError::DotReference(input.to_owned()));
        }
        if let Some(c) = input.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(SegmentError::ForbiddenCharacter(c));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathSegment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PathSegment {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl std::str::FromStr for PathSegment {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PathSegment::new(&s).map_err(serde::de::Error::custom)
    }
}
