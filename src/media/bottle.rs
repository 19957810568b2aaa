//! The `Bottle` media type of the cellar API.
//!
//! Identifier: `application/vnd.bottle+json`.

use serde::{Deserialize, Serialize};

use super::validate::{finish, Validate, ValidationError};

/// A bottle of distilled (default view).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottle {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub name: String,
}

impl Validate for Bottle {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = None;
        if self.name.is_empty() {
            err = ValidationError::merge(err, ValidationError::missing_attribute("response", "name"));
        }
        if self.brand.is_empty() {
            err = ValidationError::merge(err, ValidationError::missing_attribute("response", "brand"));
        }
        finish(err)
    }
}

/// Array of `Bottle`; `null` entries are skipped by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BottleCollection(pub Vec<Option<Bottle>>);

impl Validate for BottleCollection {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut err = None;
        for bottle in self.0.iter().flatten() {
            if let Err(e) = bottle.validate() {
                err = ValidationError::merge(err, e);
            }
        }
        finish(err)
    }
}
