//! # Chain Resources
//!
//! External resource references that identify a chain. A chain's membership
//! is resolved by comparing the caller's requested resource pairs against the
//! pairs stored for each chain of the same type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DispatcherError, Result};

/// An opaque `(resource_type, resource_id)` reference to an external entity.
///
/// Both components must be non-empty strings; resolution rejects anything
/// else before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourcePair {
    pub resource_type: String,
    pub resource_id: String,
}

impl ResourcePair {
    /// Create a new resource pair.
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Validate that both components are non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.resource_type.is_empty() {
            return Err(DispatcherError::invalid_resource(
                "resource_type must be a non-empty string",
            ));
        }
        if self.resource_id.is_empty() {
            return Err(DispatcherError::invalid_resource(format!(
                "resource_id must be a non-empty string (resource_type: {})",
                self.resource_type
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ResourcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.resource_id)
    }
}

impl From<(&str, &str)> for ResourcePair {
    fn from((resource_type, resource_id): (&str, &str)) -> Self {
        Self::new(resource_type, resource_id)
    }
}

/// A resource pair as stored, owned by exactly one chain.
///
/// The `(chain_id, resource_type, resource_id)` triple is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResource {
    pub chain_id: Uuid,
    pub resource_type: String,
    pub resource_id: String,
}

impl ChainResource {
    pub fn new(chain_id: Uuid, pair: &ResourcePair) -> Self {
        Self {
            chain_id,
            resource_type: pair.resource_type.clone(),
            resource_id: pair.resource_id.clone(),
        }
    }

    pub fn pair(&self) -> ResourcePair {
        ResourcePair::new(&self.resource_type, &self.resource_id)
    }
}
