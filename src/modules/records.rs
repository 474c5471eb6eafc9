use serde::{Serialize, de::DeserializeOwned, de::Error as _};
use serde_json::{Map, Value};

/// Records kept in an id-addressed, in-memory list.
pub trait Record: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> u64;

    /// Field-level checks run before a record is stored.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Implements [`Record`] for structs with a `pub id: u64` field.
macro_rules! record_ids {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::modules::records::Record for $ty {
            fn id(&self) -> u64 {
                self.id
            }
        })*
    };
}

pub(crate) use record_ids;

/// Appends a record built from `payload`, assigning `max(id) + 1`.
pub fn insert_item<T: Record>(items: &mut Vec<T>, payload: Value) -> serde_json::Result<T> {
    let next_id = items.iter().map(Record::id).max().unwrap_or(0) + 1;
    let item: T = serde_json::from_value(with_id(expect_object(payload)?, next_id))?;
    item.validate().map_err(serde_json::Error::custom)?;
    items.push(item.clone());
    Ok(item)
}

/// Shallow-merges `patch` over the record with `id`; `Ok(None)` when absent.
pub fn update_item<T: Record>(
    items: &mut [T],
    id: u64,
    patch: Value,
) -> serde_json::Result<Option<T>> {
    let Some(slot) = items.iter_mut().find(|item| item.id() == id) else {
        return Ok(None);
    };
    let merged = merge_patch(&*slot, patch)?;
    let updated: T = serde_json::from_value(with_id(expect_object(merged)?, id))?;
    updated.validate().map_err(serde_json::Error::custom)?;
    *slot = updated.clone();
    Ok(Some(updated))
}

pub fn remove_item<T: Record>(items: &mut Vec<T>, id: u64) -> Option<T> {
    let position = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(position))
}

/// Object spread: keys present in `patch` replace those in `current`.
/// Anything but a JSON object is rejected.
pub fn merge_patch<T: Serialize>(current: &T, patch: Value) -> serde_json::Result<Value> {
    let patch = expect_object(patch)?;
    let mut base = expect_object(serde_json::to_value(current)?)?;
    base.extend(patch);
    Ok(Value::Object(base))
}

fn expect_object(value: Value) -> serde_json::Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(serde_json::Error::custom("expected a JSON object")),
    }
}

fn with_id(mut map: Map<String, Value>, id: u64) -> Value {
    map.insert("id".to_string(), Value::from(id));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::services::Discount;
    use serde_json::json;

    fn discounts() -> Vec<Discount> {
        vec![Discount {
            id: 3,
            name: "Студентам".to_string(),
            description: String::new(),
            percent: 10,
            conditions: "Студенческий билет".to_string(),
            active: true,
        }]
    }

    #[test]
    fn insert_assigns_next_id_and_defaults() {
        let mut items = discounts();
        let created = insert_item(&mut items, json!({"name": "Пенсионерам", "percent": 5})).unwrap();

        assert_eq!(created.id, 4);
        assert!(created.active);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn insert_ignores_client_supplied_id() {
        let mut items = discounts();
        let created = insert_item(&mut items, json!({"id": 99, "name": "X", "percent": 1})).unwrap();
        assert_eq!(created.id, 4);
    }

    #[test]
    fn insert_rejects_missing_required_fields() {
        let mut items = discounts();
        assert!(insert_item(&mut items, json!({"percent": 5})).is_err());
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn update_merges_only_supplied_keys() {
        let mut items = discounts();
        let updated = update_item(&mut items, 3, json!({"percent": 15, "id": 7}))
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, 3);
        assert_eq!(updated.percent, 15);
        assert_eq!(updated.name, "Студентам");
        assert_eq!(items[0].percent, 15);
        assert!(update_item(&mut items, 42, json!({})).unwrap().is_none());
    }

    #[test]
    fn discount_over_hundred_percent_is_rejected() {
        let mut items = discounts();
        assert!(insert_item(&mut items, json!({"name": "X", "percent": 250})).is_err());
        assert!(update_item(&mut items, 3, json!({"percent": 101})).is_err());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].percent, 10);
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        let mut items = discounts();
        assert!(update_item(&mut items, 3, json!([1, 2])).is_err());
        assert!(update_item(&mut items, 3, json!("percent")).is_err());
        assert!(insert_item(&mut items, json!(["Пенсионерам", 5])).is_err());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].percent, 10);
    }

    #[test]
    fn remove_returns_deleted_record() {
        let mut items = discounts();
        assert_eq!(remove_item(&mut items, 3).map(|d| d.id), Some(3));
        assert!(remove_item(&mut items, 3).is_none());
    }
}
