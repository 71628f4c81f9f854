use sea_orm::{QueryFilter, QueryOrder, Statement, TransactionTrait, prelude::*};

use crate::{
    Budget, EngineError, Item, List, ListKind, ListWithBudget, MoneyCents, ResultEngine, budgets,
    items, lists,
    util::{
        ensure_non_negative_budget, find_budget, normalize_optional_text, normalize_required_name,
        require_item, require_list,
    },
};

use super::{Engine, with_tx};

/// Input of [`Engine::new_list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
    pub kind: ListKind,
    pub ref_month: Option<String>,
    /// Initial allowance; grocery lists only.
    pub budget: Option<MoneyCents>,
}

impl Engine {
    /// Create a list and, when given, its budget.
    pub async fn new_list(&self, new: NewList) -> ResultEngine<ListWithBudget> {
        let name = normalize_required_name(&new.name, "list")?;
        if new.budget.is_some() && !new.kind.supports_budget() {
            return Err(EngineError::Validation(format!(
                "{} lists cannot have a budget",
                new.kind.as_str()
            )));
        }
        if let Some(value) = new.budget {
            ensure_non_negative_budget(value)?;
        }
        let ref_month = if new.kind.supports_budget() {
            normalize_optional_text(new.ref_month.as_deref())
        } else {
            None
        };

        let list = List::new(name, new.kind, ref_month);
        let budget = new.budget.map(|value| Budget::new(list.id.clone(), value));
        let list_model: lists::ActiveModel = (&list).into();

        with_tx!(self, |db_tx| {
            list_model.insert(&db_tx).await?;
            if let Some(budget) = &budget {
                let budget_model: budgets::ActiveModel = budget.into();
                budget_model.insert(&db_tx).await?;
            }
            Ok::<_, EngineError>(())
        })?;

        tracing::debug!(list_id = %list.id, kind = list.kind.as_str(), "list created");
        Ok(ListWithBudget { list, budget })
    }

    /// Return a list with its budget.
    pub async fn list(&self, list_id: &str) -> ResultEngine<ListWithBudget> {
        let list = require_list(&self.database, list_id).await?;
        let budget = find_budget(&self.database, list_id).await?;
        Ok(ListWithBudget { list, budget })
    }

    /// Return every list with its budget, newest first.
    pub async fn lists(&self) -> ResultEngine<Vec<ListWithBudget>> {
        lists::Entity::find()
            .find_also_related(budgets::Entity)
            .order_by_desc(lists::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|(list, budget)| {
                Ok::<_, EngineError>(ListWithBudget {
                    list: List::try_from(list)?,
                    budget: budget.map(Budget::try_from).transpose()?,
                })
            })
            .collect()
    }

    /// Return the budget of a list, `None` when it was never set.
    pub async fn budget(&self, list_id: &str) -> ResultEngine<Option<Budget>> {
        require_list(&self.database, list_id).await?;
        find_budget(&self.database, list_id).await
    }

    /// Return the items of a list, newest first.
    pub async fn items(&self, list_id: &str) -> ResultEngine<Vec<Item>> {
        require_list(&self.database, list_id).await?;
        items::Entity::find()
            .filter(items::Column::ListId.eq(list_id.to_string()))
            .order_by_desc(items::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Item::try_from)
            .collect()
    }

    pub async fn item(&self, item_id: &str) -> ResultEngine<Item> {
        require_item(&self.database, item_id).await
    }

    /// Delete lists with their budgets and items.
    ///
    /// Rows go in one transaction and an unknown id deletes nothing. The
    /// mirror entries are cleared afterwards; a failure there is logged and
    /// does not undo the deletion.
    pub async fn delete_lists(&self, list_ids: &[String]) -> ResultEngine<()> {
        if list_ids.is_empty() {
            return Ok(());
        }
        let _guards = self.locks.lock_many(list_ids).await;

        with_tx!(self, |db_tx| {
            for list_id in list_ids {
                require_list(&db_tx, list_id).await?;
            }

            let backend = self.database.get_database_backend();
            for list_id in list_ids {
                // items, then the budget, then the list itself
                for sql in [
                    "DELETE FROM items WHERE list_id = ?;",
                    "DELETE FROM budgets WHERE list_id = ?;",
                    "DELETE FROM lists WHERE id = ?;",
                ] {
                    db_tx
                        .execute(Statement::from_sql_and_values(
                            backend,
                            sql,
                            vec![list_id.clone().into()],
                        ))
                        .await?;
                }
            }
            Ok::<_, EngineError>(())
        })?;

        tracing::debug!(count = list_ids.len(), "lists deleted");

        if let Err(err) = self.mirror.clear_all(list_ids).await {
            tracing::warn!(
                list_ids = ?list_ids,
                error = %err,
                "lists deleted but their expense mirror entries were not cleared, cleanup owed"
            );
        }
        self.locks.forget(list_ids);
        Ok(())
    }
}
