use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Budget, EngineError, ListKind, MoneyCents, ResultEngine, budgets, lists,
    util::{
        ensure_non_negative_budget, find_budget, list_items, normalize_optional_text,
        normalize_required_name, require_list,
    },
};

use super::{Engine, ledger::spent_by, with_tx};

/// Patch of an optional field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Leave the stored value untouched.
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl FieldPatch<String> {
    /// Like [`FieldPatch::resolve`], but a blank value clears the field.
    pub fn resolve_text(self, current: Option<String>) -> Option<String> {
        match self {
            Self::Set(value) => normalize_optional_text(Some(value.as_str())),
            other => other.resolve(current),
        }
    }
}

/// One list of a bulk edit.
///
/// `name` and `kind` are always written. `ref_month` defaults to
/// [`FieldPatch::Keep`] so that editing many lists at once never wipes their
/// months. `budget` is the new remaining value; `None` removes the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEdit {
    pub list_id: String,
    pub name: String,
    pub kind: ListKind,
    pub ref_month: FieldPatch<String>,
    pub budget: Option<MoneyCents>,
}

impl ListEdit {
    pub fn new(list_id: impl Into<String>, name: impl Into<String>, kind: ListKind) -> Self {
        Self {
            list_id: list_id.into(),
            name: name.into(),
            kind,
            ref_month: FieldPatch::Keep,
            budget: None,
        }
    }

    pub fn ref_month(mut self, ref_month: FieldPatch<String>) -> Self {
        self.ref_month = ref_month;
        self
    }

    pub fn budget(mut self, budget: MoneyCents) -> Self {
        self.budget = Some(budget);
        self
    }
}

impl Engine {
    /// Apply edits to one or many lists in one transaction.
    ///
    /// Any invalid edit or unknown list id aborts the whole batch.
    pub async fn update_many(&self, edits: Vec<ListEdit>) -> ResultEngine<()> {
        if edits.is_empty() {
            return Ok(());
        }

        let mut names = Vec::with_capacity(edits.len());
        for edit in &edits {
            names.push(normalize_required_name(&edit.name, "list")?);
            if edit.budget.is_some() && !edit.kind.supports_budget() {
                return Err(EngineError::Validation(format!(
                    "{} lists cannot have a budget",
                    edit.kind.as_str()
                )));
            }
            if let Some(value) = edit.budget {
                ensure_non_negative_budget(value)?;
            }
        }

        let list_ids: Vec<String> = edits.iter().map(|e| e.list_id.clone()).collect();
        let _guards = self.locks.lock_many(&list_ids).await;

        with_tx!(self, |db_tx| {
            for (edit, name) in edits.into_iter().zip(names) {
                let list = require_list(&db_tx, &edit.list_id).await?;

                let ref_month = if edit.kind.supports_budget() {
                    edit.ref_month.resolve_text(list.ref_month)
                } else {
                    None
                };
                let model = lists::ActiveModel {
                    id: ActiveValue::Set(list.id.clone()),
                    name: ActiveValue::Set(name),
                    kind: ActiveValue::Set(edit.kind.as_str().to_string()),
                    ref_month: ActiveValue::Set(ref_month),
                    ..Default::default()
                };
                model.update(&db_tx).await?;

                match edit.budget {
                    Some(value) => {
                        let spent = spent_by(&list_items(&db_tx, &list.id).await?)?;
                        let original = value.checked_add(spent).ok_or_else(|| {
                            EngineError::Validation("budget value too large".to_string())
                        })?;
                        match find_budget(&db_tx, &list.id).await? {
                            Some(budget) => {
                                let model = budgets::ActiveModel {
                                    id: ActiveValue::Set(budget.id),
                                    current_minor: ActiveValue::Set(value.cents()),
                                    original_minor: ActiveValue::Set(original.cents()),
                                    ..Default::default()
                                };
                                model.update(&db_tx).await?;
                            }
                            None => {
                                let mut budget = Budget::new(list.id.clone(), value);
                                budget.original = original;
                                let model: budgets::ActiveModel = (&budget).into();
                                model.insert(&db_tx).await?;
                            }
                        }
                    }
                    None => {
                        budgets::Entity::delete_many()
                            .filter(budgets::Column::ListId.eq(list.id.clone()))
                            .exec(&db_tx)
                            .await?;
                    }
                }
            }
            Ok::<_, EngineError>(())
        })?;

        tracing::debug!(count = list_ids.len(), "lists updated");
        Ok(())
    }
}
