//! Entity-level diff: compare two sets of records matched by id.

use std::collections::{BTreeMap, BTreeSet};

use keystone_facility::{BuildingState, Category, EntityRecord};
use keystone_types::EntityId;
use serde_json::Value;

use crate::changes::{CategoryChanges, DiffResult, ModifiedEntity};
use crate::error::DiffError;

/// Top-level keys whose values differ between two JSON objects.
///
/// A key missing on one side counts as changed. Non-object values compare
/// as a single unnamed field.
pub fn changed_fields(before: &Value, after: &Value) -> Vec<String> {
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            keys.into_iter()
                .filter(|k| a.get(*k) != b.get(*k))
                .cloned()
                .collect()
        }
        _ if before == after => Vec::new(),
        _ => vec![String::new()],
    }
}

/// Compare two record lists of one category.
///
/// Ids only in `new` are added, ids only in `old` are removed, and ids on
/// both sides with different content are modified. A renamed entity keeps
/// its id and is therefore modified, not removed and re-added.
pub fn diff_records(old: &[EntityRecord], new: &[EntityRecord]) -> Result<CategoryChanges, DiffError> {
    let old: BTreeMap<&EntityId, &EntityRecord> = old.iter().map(|r| (r.id(), r)).collect();
    let new: BTreeMap<&EntityId, &EntityRecord> = new.iter().map(|r| (r.id(), r)).collect();
    let mut changes = CategoryChanges::default();

    for (id, before) in &old {
        match new.get(id) {
            Some(after) if before != after => {
                let fields = changed_fields(&before.to_value()?, &after.to_value()?);
                changes.modified.push(ModifiedEntity {
                    id: (*id).clone(),
                    before: (*before).clone(),
                    after: (*after).clone(),
                    changed_fields: fields,
                });
            }
            Some(_) => {}
            None => changes.removed.push((*before).clone()),
        }
    }

    for (id, after) in &new {
        if !old.contains_key(id) {
            changes.added.push((*after).clone());
        }
    }

    Ok(changes)
}

/// Compare two full building states.
///
/// The returned diff carries no version ids.
pub fn diff_states(old: &BuildingState, new: &BuildingState) -> Result<DiffResult, DiffError> {
    let mut result = DiffResult::default();
    for category in Category::ALL {
        *result.get_mut(category) = diff_records(&old.records(category), &new.records(category))?;
    }
    Ok(result)
}
