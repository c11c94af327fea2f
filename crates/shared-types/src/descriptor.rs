//! # Value Descriptors
//!
//! Shared metadata describing the semantics of a measurement. Many readings
//! reference one descriptor by `name`; the name is unique across all
//! descriptors.

use serde::{Deserialize, Serialize};

use crate::entities::Timestamp;

/// Units, type, bounds and display format of a measurement.
///
/// Also used as the incoming patch of a partial update: empty strings, zero
/// timestamps and `labels: None` leave the stored field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValueDescriptor {
    /// Store-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Globally unique name; readings reference the descriptor by it.
    #[serde(default)]
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Value type (e.g. `Int64`, `Float32`, `String`).
    #[serde(default, rename = "type")]
    pub value_type: String,
    /// Unit of measure label.
    #[serde(default)]
    pub uom_label: String,
    /// Minimum valid value.
    #[serde(default)]
    pub min: String,
    /// Maximum valid value.
    #[serde(default)]
    pub max: String,
    /// Value used when a reading carries none.
    #[serde(default)]
    pub default_value: String,
    /// Optional `printf`-style format string. Empty means unconstrained.
    #[serde(default)]
    pub formatting: String,
    /// Free-form labels. `None` on a patch means "leave as is".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Producer-assigned origin timestamp.
    #[serde(default)]
    pub origin: Timestamp,
    /// When the descriptor was registered.
    #[serde(default)]
    pub created: Timestamp,
    /// Last modification time.
    #[serde(default)]
    pub modified: Timestamp,
}

impl ValueDescriptor {
    /// Create a descriptor with a name and value type.
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            ..Default::default()
        }
    }

    /// Set the format string.
    #[must_use]
    pub fn with_formatting(mut self, formatting: impl Into<String>) -> Self {
        self.formatting = formatting.into();
        self
    }

    /// Set the unit of measure label.
    #[must_use]
    pub fn with_uom_label(mut self, uom_label: impl Into<String>) -> Self {
        self.uom_label = uom_label.into();
        self
    }

    /// Set the labels.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Whether the descriptor carries the given label.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels
            .as_ref()
            .is_some_and(|labels| labels.iter().any(|l| l == label))
    }
}
