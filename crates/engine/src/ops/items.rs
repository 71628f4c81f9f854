use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, Item, MoneyCents, Quantity, ResultEngine, items,
    util::{
        ensure_non_negative_price, ensure_positive_price, normalize_optional_text,
        normalize_required_name, require_item, require_list,
    },
};

use super::{
    Engine, FieldPatch,
    ledger::{apply_delta, mirror_entry},
    with_tx,
};

/// Input of [`Engine::new_item`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    /// Defaults to 1.
    pub quantity: Quantity,
    /// Zero leaves the item unpriced.
    pub price: MoneyCents,
    pub category: Option<String>,
    pub observation: Option<String>,
}

/// Fields to change on an item; `None`/[`FieldPatch::Keep`] keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub quantity: Option<Quantity>,
    pub price: Option<MoneyCents>,
    pub category: FieldPatch<String>,
    pub observation: FieldPatch<String>,
}

fn ensure_positive_quantity(quantity: Quantity) -> ResultEngine<()> {
    if !quantity.is_positive() {
        return Err(EngineError::Validation(format!(
            "quantity must be > 0, got {quantity}"
        )));
    }
    Ok(())
}

impl Engine {
    /// Add an unpurchased item to a list.
    pub async fn new_item(&self, list_id: &str, new: NewItem) -> ResultEngine<Item> {
        let name = normalize_required_name(&new.name, "item")?;
        ensure_positive_quantity(new.quantity)?;
        ensure_non_negative_price(new.price)?;

        let mut item = Item::new(list_id.to_string(), name, new.quantity, new.price);
        item.category = normalize_optional_text(new.category.as_deref());
        item.observation = normalize_optional_text(new.observation.as_deref());
        let model: items::ActiveModel = (&item).into();

        with_tx!(self, |db_tx| {
            require_list(&db_tx, list_id).await?;
            model.insert(&db_tx).await?;
            Ok::<_, EngineError>(())
        })?;

        tracing::debug!(item_id = %item.id, list_id, "item created");
        Ok(item)
    }

    /// Enter the price of an item.
    ///
    /// The price must be positive. When the item is already purchased the
    /// budget absorbs the difference between the old and new expense.
    pub async fn set_price(&self, item_id: &str, price: MoneyCents) -> ResultEngine<Item> {
        ensure_positive_price(price)?;
        self.rewrite_item(item_id, |item| {
            item.price = price;
            Ok(())
        })
        .await
    }

    /// Apply an [`ItemPatch`].
    ///
    /// A purchased item must keep a positive price and quantity; unmark it
    /// first to clear them.
    pub async fn update_item(&self, item_id: &str, patch: ItemPatch) -> ResultEngine<Item> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "item"))
            .transpose()?;
        if let Some(quantity) = patch.quantity {
            ensure_positive_quantity(quantity)?;
        }
        if let Some(price) = patch.price {
            ensure_non_negative_price(price)?;
        }

        self.rewrite_item(item_id, move |item| {
            if let Some(name) = name {
                item.name = name;
            }
            if let Some(quantity) = patch.quantity {
                item.quantity = quantity;
            }
            if let Some(price) = patch.price {
                if item.purchased && !price.is_positive() {
                    return Err(EngineError::Validation(format!(
                        "\"{}\" is purchased, unmark it before clearing its price",
                        item.name
                    )));
                }
                item.price = price;
            }
            item.category = patch.category.resolve_text(item.category.take());
            item.observation = patch.observation.resolve_text(item.observation.take());
            Ok(())
        })
        .await
    }

    /// Delete an item, giving its expense back to the budget when purchased.
    pub async fn delete_item(&self, item_id: &str) -> ResultEngine<()> {
        let list_id = require_item(&self.database, item_id).await?.list_id;
        let _guard = self.locks.lock(&list_id).await;

        let item = with_tx!(self, |db_tx| {
            let item = require_item(&db_tx, item_id).await?;
            let expense = item.counted_expense()?;
            items::Entity::delete_by_id(item.id.clone())
                .exec(&db_tx)
                .await?;
            apply_delta(&db_tx, &list_id, -expense).await?;
            Ok::<_, EngineError>(item)
        })?;

        tracing::debug!(item_id, list_id = %list_id, purchased = item.purchased, "item deleted");
        if item.purchased {
            self.sync_mirror(&list_id, self.mirror.clear(&list_id, &item.id))
                .await;
        }
        Ok(())
    }

    /// Re-read an item in its list's critical section, change it and keep
    /// the budget and mirror in step with its new expense.
    async fn rewrite_item<F>(&self, item_id: &str, change: F) -> ResultEngine<Item>
    where
        F: FnOnce(&mut Item) -> ResultEngine<()>,
    {
        let list_id = require_item(&self.database, item_id).await?.list_id;
        let _guard = self.locks.lock(&list_id).await;

        let (item, mirror_stale) = with_tx!(self, |db_tx| {
            let mut item = require_item(&db_tx, item_id).await?;
            let before = item.counted_expense()?;
            let previous_name = item.name.clone();
            change(&mut item)?;
            let after = item.counted_expense()?;
            if item.purchased && after.is_zero() {
                return Err(EngineError::Validation(format!(
                    "expense of \"{}\" would round to zero, unmark it first",
                    item.name
                )));
            }

            let model = items::ActiveModel {
                id: ActiveValue::Set(item.id.clone()),
                name: ActiveValue::Set(item.name.clone()),
                quantity_milli: ActiveValue::Set(item.quantity.milli()),
                price_minor: ActiveValue::Set(item.price.cents()),
                category: ActiveValue::Set(item.category.clone()),
                observation: ActiveValue::Set(item.observation.clone()),
                ..Default::default()
            };
            model.update(&db_tx).await?;

            if after != before {
                apply_delta(&db_tx, &list_id, after - before).await?;
            }
            let stale = after != before || item.name != previous_name;
            Ok::<_, EngineError>((item, stale))
        })?;

        tracing::debug!(item_id, list_id = %list_id, "item updated");
        if item.purchased && mirror_stale {
            let expense = item.counted_expense()?;
            self.sync_mirror(&list_id, self.mirror.refresh(mirror_entry(&item, expense)))
                .await;
        }
        Ok(item)
    }
}
