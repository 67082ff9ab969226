//! # Entries
//!
//! One logged food record: dish, calories, fat and the ingredients that went into it.
//!
//! ## Payloads
//!
//! - [`NewEntry`]: create body. Every field is required.
//! - [`EntryPatch`]: partial update body. Absent fields stay untouched, explicit `null` is rejected.
//! - [`IngredientsUpdate`]: narrow update body, only `ingredients`.
//!
//! Bodies are deserialized with every field optional so that a missing field surfaces as a
//! validation failure with a readable message instead of a serde error.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EntryId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| AppError::MalformedInput(format!("invalid entry id '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub dish: String,
    pub calories: f64,
    pub fat: f64,
    pub ingredients: Vec<String>,
}

impl Entry {
    pub fn contains_ingredient(&self, ingredient: &str) -> bool {
        self.ingredients.iter().any(|i| i == ingredient)
    }

    pub fn apply(&mut self, change: &FieldUpdate) -> bool {
        match change {
            FieldUpdate::Dish(dish) => replace(&mut self.dish, dish),
            FieldUpdate::Calories(calories) => replace(&mut self.calories, calories),
            FieldUpdate::Fat(fat) => replace(&mut self.fat, fat),
            FieldUpdate::Ingredients(ingredients) => replace(&mut self.ingredients, ingredients),
        }
    }
}

fn replace<T: PartialEq + Clone>(slot: &mut T, value: &T) -> bool {
    if slot == value {
        return false;
    }

    *slot = value.clone();
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct NewEntry {
    pub dish: Option<String>,
    pub calories: Option<f64>,
    pub fat: Option<f64>,
    pub ingredients: Option<Vec<String>>,
}

impl NewEntry {
    pub fn into_entry(self) -> Result<Entry, AppError> {
        let dish = required("dish", self.dish)?;
        let calories = required("calories", self.calories)?;
        let fat = required("fat", self.fat)?;
        let ingredients = required("ingredients", self.ingredients)?;

        Ok(Entry {
            id: EntryId::new(),
            dish: validate_dish(dish)?,
            calories: validate_amount("calories", calories)?,
            fat: validate_amount("fat", fat)?,
            ingredients: validate_ingredients(ingredients)?,
        })
    }
}

/// A single field overwritten by a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Dish(String),
    Calories(f64),
    Fat(f64),
    Ingredients(Vec<String>),
}

impl FieldUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            FieldUpdate::Dish(_) => "dish",
            FieldUpdate::Calories(_) => "calories",
            FieldUpdate::Fat(_) => "fat",
            FieldUpdate::Ingredients(_) => "ingredients",
        }
    }
}

/// `None` means absent, `Some(None)` means an explicit `null`.
#[derive(Debug, Default, Deserialize)]
pub struct EntryPatch {
    #[serde(default, deserialize_with = "present")]
    pub dish: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub calories: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub fat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub ingredients: Option<Option<Vec<String>>>,
}

impl EntryPatch {
    pub fn into_changes(self) -> Result<Vec<FieldUpdate>, AppError> {
        let mut changes = Vec::new();

        if let Some(dish) = self.dish {
            changes.push(FieldUpdate::Dish(validate_dish(not_null("dish", dish)?)?));
        }
        if let Some(calories) = self.calories {
            let calories = not_null("calories", calories)?;
            changes.push(FieldUpdate::Calories(validate_amount("calories", calories)?));
        }
        if let Some(fat) = self.fat {
            changes.push(FieldUpdate::Fat(validate_amount("fat", not_null("fat", fat)?)?));
        }
        if let Some(ingredients) = self.ingredients {
            let ingredients = not_null("ingredients", ingredients)?;
            changes.push(FieldUpdate::Ingredients(validate_ingredients(ingredients)?));
        }

        if changes.is_empty() {
            return Err(AppError::ValidationFailure(
                "update must set at least one of dish, calories, fat, ingredients".to_string(),
            ));
        }

        Ok(changes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientsUpdate {
    pub ingredients: Option<Vec<String>>,
}

impl IngredientsUpdate {
    pub fn into_ingredients(self) -> Result<Vec<String>, AppError> {
        validate_ingredients(required("ingredients", self.ingredients)?)
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::ValidationFailure(format!("{field} is required")))
}

fn not_null<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::ValidationFailure(format!("{field} must not be null")))
}

fn validate_dish(dish: String) -> Result<String, AppError> {
    if dish.trim().is_empty() {
        return Err(AppError::ValidationFailure("dish must not be empty".to_string()));
    }

    Ok(dish)
}

fn validate_amount(field: &str, value: f64) -> Result<f64, AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::ValidationFailure(format!(
            "{field} must be a non-negative number"
        )));
    }

    // -0.0 becomes 0.0 so every store sees one zero
    Ok(value + 0.0)
}

fn validate_ingredients(ingredients: Vec<String>) -> Result<Vec<String>, AppError> {
    if ingredients.iter().any(|i| i.trim().is_empty()) {
        return Err(AppError::ValidationFailure(
            "ingredients must not contain empty names".to_string(),
        ));
    }

    Ok(ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salad() -> NewEntry {
        NewEntry {
            dish: Some("Salad".into()),
            calories: Some(120.0),
            fat: Some(2.0),
            ingredients: Some(vec!["lettuce".into(), "tomato".into()]),
        }
    }

    #[test]
    fn test_entry_id_round_trip() {
        let id = EntryId::new();
        let parsed: EntryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_entry_id_malformed() {
        for raw in ["", "123", "not-an-id", "65f1c0ffee0123456789abcd"] {
            assert!(matches!(
                raw.parse::<EntryId>(),
                Err(AppError::MalformedInput(_))
            ));
        }
    }

    #[test]
    fn test_new_entry_valid() {
        let entry = salad().into_entry().unwrap();
        assert_eq!(entry.dish, "Salad");
        assert_eq!(entry.calories, 120.0);
        assert_eq!(entry.ingredients, vec!["lettuce", "tomato"]);
    }

    #[test]
    fn test_new_entry_ids_are_unique() {
        let a = salad().into_entry().unwrap();
        let b = salad().into_entry().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_new_entry_missing_field() {
        let draft = NewEntry {
            fat: None,
            ..salad()
        };
        match draft.into_entry() {
            Err(AppError::ValidationFailure(message)) => assert_eq!(message, "fat is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_new_entry_invalid_values() {
        let blank = NewEntry {
            dish: Some("   ".into()),
            ..salad()
        };
        assert!(matches!(blank.into_entry(), Err(AppError::ValidationFailure(_))));

        let negative = NewEntry {
            calories: Some(-1.0),
            ..salad()
        };
        assert!(matches!(negative.into_entry(), Err(AppError::ValidationFailure(_))));

        let empty_name = NewEntry {
            ingredients: Some(vec!["rice".into(), "".into()]),
            ..salad()
        };
        assert!(matches!(empty_name.into_entry(), Err(AppError::ValidationFailure(_))));
    }

    #[test]
    fn test_patch_only_present_fields() {
        let patch: EntryPatch = serde_json::from_str(r#"{"calories": 500}"#).unwrap();
        assert_eq!(patch.into_changes().unwrap(), vec![FieldUpdate::Calories(500.0)]);
    }

    #[test]
    fn test_patch_rejects_null() {
        let patch: EntryPatch = serde_json::from_str(r#"{"dish": null}"#).unwrap();
        match patch.into_changes() {
            Err(AppError::ValidationFailure(message)) => {
                assert_eq!(message, "dish must not be null")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_patch_rejects_empty() {
        let patch: EntryPatch = serde_json::from_str(r#"{"colour": "green"}"#).unwrap();
        assert!(matches!(
            patch.into_changes(),
            Err(AppError::ValidationFailure(_))
        ));
    }

    #[test]
    fn test_negative_zero_becomes_zero() {
        let patch: EntryPatch = serde_json::from_str(r#"{"fat": -0.0}"#).unwrap();
        match patch.into_changes().unwrap().as_slice() {
            [FieldUpdate::Fat(fat)] => {
                assert_eq!(*fat, 0.0);
                assert!(fat.is_sign_positive());
            }
            other => panic!("unexpected changes: {other:?}"),
        }

        let draft = NewEntry {
            calories: Some(-0.0),
            ..salad()
        };
        assert!(draft.into_entry().unwrap().calories.is_sign_positive());
    }

    #[test]
    fn test_apply_reports_modification() {
        let mut entry = salad().into_entry().unwrap();
        assert!(!entry.apply(&FieldUpdate::Fat(2.0)));
        assert!(entry.apply(&FieldUpdate::Fat(3.0)));
        assert_eq!(entry.fat, 3.0);
        assert_eq!(entry.dish, "Salad");
    }

    #[test]
    fn test_contains_ingredient_is_exact() {
        let entry = Entry {
            ingredients: vec!["brown rice".into(), "beans".into()],
            ..salad().into_entry().unwrap()
        };
        assert!(entry.contains_ingredient("beans"));
        assert!(!entry.contains_ingredient("rice"));
        assert!(!entry.contains_ingredient("Beans"));
    }

    #[test]
    fn test_ingredients_update_required() {
        let update: IngredientsUpdate = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            update.into_ingredients(),
            Err(AppError::ValidationFailure(_))
        ));
    }
}
