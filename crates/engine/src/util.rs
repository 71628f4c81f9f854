//! Internal helpers for input validation and row lookups.
//!
//! These utilities are **not** part of the public API. They keep name
//! handling and "not found" errors identical across operations.

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{
    Budget, EngineError, Item, List, MoneyCents, ResultEngine, budgets, items, lists,
};

/// Trim a required name and reject it when empty.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free text; blank input is stored as `NULL`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn ensure_positive_price(price: MoneyCents) -> ResultEngine<()> {
    if !price.is_positive() {
        return Err(EngineError::Validation(format!(
            "price must be > 0, got {price}"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative_price(price: MoneyCents) -> ResultEngine<()> {
    if price.is_negative() {
        return Err(EngineError::Validation(format!(
            "price must be >= 0, got {price}"
        )));
    }
    Ok(())
}

/// Budgets are entered as a non-negative allowance; only purchases drive them below zero.
pub(crate) fn ensure_non_negative_budget(value: MoneyCents) -> ResultEngine<()> {
    if value.is_negative() {
        return Err(EngineError::Validation(format!(
            "budget must be >= 0, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn list_not_found(list_id: &str) -> EngineError {
    EngineError::KeyNotFound(format!("list {list_id} not exists"))
}

pub(crate) fn item_not_found(item_id: &str) -> EngineError {
    EngineError::KeyNotFound(format!("item {item_id} not exists"))
}

pub(crate) async fn require_list<C: ConnectionTrait>(db: &C, list_id: &str) -> ResultEngine<List> {
    let model = lists::Entity::find_by_id(list_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| list_not_found(list_id))?;
    List::try_from(model)
}

pub(crate) async fn require_item<C: ConnectionTrait>(db: &C, item_id: &str) -> ResultEngine<Item> {
    let model = items::Entity::find_by_id(item_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| item_not_found(item_id))?;
    Item::try_from(model)
}

pub(crate) async fn find_budget<C: ConnectionTrait>(
    db: &C,
    list_id: &str,
) -> ResultEngine<Option<Budget>> {
    budgets::Entity::find()
        .filter(budgets::Column::ListId.eq(list_id.to_string()))
        .one(db)
        .await?
        .map(Budget::try_from)
        .transpose()
}

pub(crate) async fn list_items<C: ConnectionTrait>(db: &C, list_id: &str) -> ResultEngine<Vec<Item>> {
    items::Entity::find()
        .filter(items::Column::ListId.eq(list_id.to_string()))
        .all(db)
        .await?
        .into_iter()
        .map(Item::try_from)
        .collect()
}
