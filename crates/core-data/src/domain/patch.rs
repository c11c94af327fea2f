//! # Merge Patches
//!
//! Partial updates overwrite a stored field only when the incoming value is
//! non-empty (strings), non-zero (timestamps) or present (`labels`). Anything
//! else keeps the stored value.
//!
//! These functions only merge. Format validation and the rename guard run in
//! the service before a merged descriptor is written.

use shared_types::{Event, Reading, ValueDescriptor};

fn merge_string(target: &mut String, incoming: &str) {
    if !incoming.is_empty() {
        *target = incoming.to_string();
    }
}

fn merge_timestamp(target: &mut i64, incoming: i64) {
    if incoming != 0 {
        *target = incoming;
    }
}

/// Apply a descriptor patch. `id`, `created` and `modified` are never taken
/// from the patch.
#[must_use]
pub fn merge_value_descriptor(existing: &ValueDescriptor, patch: &ValueDescriptor) -> ValueDescriptor {
    let mut merged = existing.clone();

    merge_string(&mut merged.name, &patch.name);
    merge_string(&mut merged.description, &patch.description);
    merge_string(&mut merged.default_value, &patch.default_value);
    merge_string(&mut merged.formatting, &patch.formatting);
    merge_string(&mut merged.max, &patch.max);
    merge_string(&mut merged.min, &patch.min);
    merge_string(&mut merged.value_type, &patch.value_type);
    merge_string(&mut merged.uom_label, &patch.uom_label);
    merge_timestamp(&mut merged.origin, patch.origin);

    if let Some(labels) = &patch.labels {
        merged.labels = Some(labels.clone());
    }

    merged
}

/// Whether applying `patch` would change the descriptor's name.
#[must_use]
pub fn renames(existing: &ValueDescriptor, patch: &ValueDescriptor) -> bool {
    !patch.name.is_empty() && patch.name != existing.name
}

/// Apply an event patch: device and origin only. Readings and push state
/// are untouched.
#[must_use]
pub fn merge_event(existing: &Event, patch: &Event) -> Event {
    let mut merged = existing.clone();
    merge_string(&mut merged.device, &patch.device);
    merge_timestamp(&mut merged.origin, patch.origin);
    merged
}

/// Apply a reading patch: value, descriptor name and origin.
#[must_use]
pub fn merge_reading(existing: &Reading, patch: &Reading) -> Reading {
    let mut merged = existing.clone();
    merge_string(&mut merged.value, &patch.value);
    merge_string(&mut merged.name, &patch.name);
    merge_timestamp(&mut merged.origin, patch.origin);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> ValueDescriptor {
        ValueDescriptor {
            id: "vd-1".to_string(),
            name: "temperature".to_string(),
            description: "ambient".to_string(),
            value_type: "Float32".to_string(),
            uom_label: "C".to_string(),
            min: "-40".to_string(),
            max: "85".to_string(),
            formatting: "%.1f".to_string(),
            labels: Some(vec!["hvac".to_string()]),
            origin: 100,
            created: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let merged = merge_value_descriptor(&stored(), &ValueDescriptor::default());
        assert_eq!(merged, stored());
    }

    #[test]
    fn test_non_empty_fields_overwrite() {
        let patch = ValueDescriptor {
            description: "outdoor".to_string(),
            max: "60".to_string(),
            origin: 200,
            ..Default::default()
        };

        let merged = merge_value_descriptor(&stored(), &patch);
        assert_eq!(merged.description, "outdoor");
        assert_eq!(merged.max, "60");
        assert_eq!(merged.origin, 200);
        assert_eq!(merged.min, "-40");
        assert_eq!(merged.uom_label, "C");
    }

    #[test]
    fn test_labels_replace_only_when_present() {
        let patch = ValueDescriptor {
            labels: Some(Vec::new()),
            ..Default::default()
        };
        let merged = merge_value_descriptor(&stored(), &patch);
        assert_eq!(merged.labels, Some(Vec::new()));
    }

    #[test]
    fn test_patch_never_moves_identity() {
        let patch = ValueDescriptor {
            id: "other".to_string(),
            created: 999,
            ..Default::default()
        };
        let merged = merge_value_descriptor(&stored(), &patch);
        assert_eq!(merged.id, "vd-1");
        assert_eq!(merged.created, 100);
    }

    #[test]
    fn test_renames() {
        let same = ValueDescriptor {
            name: "temperature".to_string(),
            ..Default::default()
        };
        let other = ValueDescriptor {
            name: "temp".to_string(),
            ..Default::default()
        };
        assert!(!renames(&stored(), &ValueDescriptor::default()));
        assert!(!renames(&stored(), &same));
        assert!(renames(&stored(), &other));
    }

    #[test]
    fn test_event_patch_keeps_readings() {
        let existing = Event::new("pump-1", 10, vec![Reading::new("pressure", "3")]);
        let patch = Event {
            device: "pump-2".to_string(),
            pushed: 55,
            ..Default::default()
        };

        let merged = merge_event(&existing, &patch);
        assert_eq!(merged.device, "pump-2");
        assert_eq!(merged.origin, 10);
        assert_eq!(merged.pushed, 0);
        assert_eq!(merged.reading_count(), 1);
    }

    #[test]
    fn test_reading_patch() {
        let existing = Reading::new("pressure", "3").with_origin(10);
        let patch = Reading {
            value: "4".to_string(),
            ..Default::default()
        };

        let merged = merge_reading(&existing, &patch);
        assert_eq!(merged.value, "4");
        assert_eq!(merged.name, "pressure");
        assert_eq!(merged.origin, 10);
    }
}
