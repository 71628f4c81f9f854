//! The `List` is a named collection of items. Grocery lists may carry a
//! [`Budget`](crate::Budget); order lists never do.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Budget, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    #[default]
    Grocery,
    Order,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grocery => "grocery",
            Self::Order => "order",
        }
    }

    /// Only grocery lists track a budget.
    pub fn supports_budget(self) -> bool {
        matches!(self, Self::Grocery)
    }
}

impl TryFrom<&str> for ListKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "grocery" => Ok(Self::Grocery),
            "order" => Ok(Self::Order),
            other => Err(EngineError::Validation(format!(
                "invalid list kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub kind: ListKind,
    /// Reference month (`2025-07`); only meaningful for grocery lists.
    pub ref_month: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl List {
    pub fn new(name: String, kind: ListKind, ref_month: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            kind,
            ref_month,
            created_at: Utc::now(),
        }
    }
}

/// A list joined with its optional budget, as shown on the lists screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWithBudget {
    pub list: List,
    pub budget: Option<Budget>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub kind: String,
    pub ref_month: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::budgets::Entity")]
    Budgets,
    #[sea_orm(has_many = "super::items::Entity")]
    Items,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&List> for ActiveModel {
    fn from(value: &List) -> Self {
        Self {
            id: ActiveValue::Set(value.id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            ref_month: ActiveValue::Set(value.ref_month.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for List {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            kind: ListKind::try_from(model.kind.as_str())?,
            id: model.id,
            name: model.name,
            ref_month: model.ref_month,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_name() {
        for kind in [ListKind::Grocery, ListKind::Order] {
            assert_eq!(ListKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(ListKind::try_from("mercado").is_err());
    }

    #[test]
    fn only_grocery_lists_support_budgets() {
        assert!(ListKind::Grocery.supports_budget());
        assert!(!ListKind::Order.supports_budget());
    }

    #[test]
    fn model_conversion_rejects_unknown_kind() {
        let model = Model {
            id: "L1".to_string(),
            name: "Weekly".to_string(),
            kind: "wishlist".to_string(),
            ref_month: None,
            created_at: Utc::now(),
        };
        assert!(List::try_from(model).unwrap_err().is_validation());
    }
}
