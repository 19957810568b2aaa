use std::fmt;

/// Accumulated validation failures of a decoded value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    missing: Vec<String>,
}

impl ValidationError {
    /// A single missing required attribute, e.g. `response.name`.
    pub fn missing_attribute(context: &str, attribute: &str) -> Self {
        Self { missing: vec![format!("{}.{}", context, attribute)] }
    }

    /// Folds `other` into `acc`, creating the accumulator if needed.
    pub fn merge(acc: Option<Self>, other: Self) -> Option<Self> {
        match acc {
            Some(mut err) => {
                err.missing.extend(other.missing);
                Some(err)
            }
            None => Some(other),
        }
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required attribute(s): {}", self.missing.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Post-decode checks of a media type.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Turns an accumulator into a result.
pub(crate) fn finish(acc: Option<ValidationError>) -> Result<(), ValidationError> {
    match acc {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
