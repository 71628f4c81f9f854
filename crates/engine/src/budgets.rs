//! The monetary allowance of a grocery list.
//!
//! A budget keeps two values: `original`, the allowance it was defined with,
//! and `current`, what is left after purchased items. The engine keeps
//! `current = original - Σ(expense of purchased items)` for every list.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub list_id: String,
    pub current: MoneyCents,
    pub original: MoneyCents,
}

impl Budget {
    /// A fresh budget: nothing spent yet.
    pub fn new(list_id: String, value: MoneyCents) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            list_id,
            current: value,
            original: value,
        }
    }

    /// What the stored values say has been spent.
    pub fn spent(&self) -> MoneyCents {
        self.original - self.current
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub list_id: String,
    pub current_minor: i64,
    pub original_minor: i64,
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

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            list_id: ActiveValue::Set(value.list_id.clone()),
            current_minor: ActiveValue::Set(value.current.cents()),
            original_minor: ActiveValue::Set(value.original.cents()),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            list_id: model.list_id,
            current: MoneyCents::new(model.current_minor),
            original: MoneyCents::new(model.original_minor),
        })
    }
}
