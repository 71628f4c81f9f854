//! Purchasable entries of a list.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, Quantity, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub quantity: Quantity,
    /// Unit price. Zero means the price has not been entered yet.
    pub price: MoneyCents,
    pub category: Option<String>,
    pub observation: Option<String>,
    pub purchased: bool,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(list_id: String, name: String, quantity: Quantity, price: MoneyCents) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            list_id,
            name,
            quantity,
            price,
            category: None,
            observation: None,
            purchased: false,
            created_at: Utc::now(),
        }
    }

    /// `price × quantity`, whatever the purchase state.
    pub fn total(&self) -> ResultEngine<MoneyCents> {
        self.quantity.cost_of(self.price)
    }

    /// The amount this item currently takes out of the budget.
    pub fn counted_expense(&self) -> ResultEngine<MoneyCents> {
        if self.purchased && self.price.is_positive() {
            self.total()
        } else {
            Ok(MoneyCents::ZERO)
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub quantity_milli: i64,
    pub price_minor: i64,
    pub category: Option<String>,
    pub observation: Option<String>,
    pub purchased: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lists::Entity",
        from = "Column::ListId",
        to = "super::lists::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Lists,
}

impl Related<super::lists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Item> for ActiveModel {
    fn from(value: &Item) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            list_id: ActiveValue::Set(value.list_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            quantity_milli: ActiveValue::Set(value.quantity.milli()),
            price_minor: ActiveValue::Set(value.price.cents()),
            category: ActiveValue::Set(value.category.clone()),
            observation: ActiveValue::Set(value.observation.clone()),
            purchased: ActiveValue::Set(value.purchased),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Item {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        if model.quantity_milli < 0 {
            return Err(EngineError::Validation(format!(
                "stored quantity of item {} is negative",
                model.id
            )));
        }
        if model.price_minor < 0 {
            return Err(EngineError::Validation(format!(
                "stored price of item {} is negative",
                model.id
            )));
        }
        Ok(Self {
            id: model.id,
            list_id: model.list_id,
            name: model.name,
            quantity: Quantity::from_milli(model.quantity_milli),
            price: MoneyCents::new(model.price_minor),
            category: model.category,
            observation: model.observation,
            purchased: model.purchased,
            created_at: model.created_at,
        })
    }
}
