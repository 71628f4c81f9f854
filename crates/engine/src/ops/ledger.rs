use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;

use crate::{
    EngineError, Item, MirrorEntry, MoneyCents, ResultEngine, budgets,
    util::{find_budget, list_items, require_list},
};

use super::{Engine, with_tx};

/// Result of [`Engine::reconcile`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub list_id: String,
    /// Stored remaining value before the repair, `None` without a budget.
    pub previous: Option<MoneyCents>,
    pub current: Option<MoneyCents>,
    /// Whether the stored value had drifted and was overwritten.
    pub repaired: bool,
    pub mirror_entries: usize,
    pub mirror_synced: bool,
}

/// Running expense of one list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseSummary {
    pub list_id: String,
    /// Sum of the mirror entries.
    pub spent: MoneyCents,
    pub remaining: Option<MoneyCents>,
    pub original: Option<MoneyCents>,
}

/// Subtract `delta` from the remaining value of a list in a single statement.
///
/// Returns the new remaining value, or `None` when the list has no budget.
pub(super) async fn apply_delta<C: ConnectionTrait>(
    db: &C,
    list_id: &str,
    delta: MoneyCents,
) -> ResultEngine<Option<MoneyCents>> {
    if !delta.is_zero() {
        budgets::Entity::update_many()
            .col_expr(
                budgets::Column::CurrentMinor,
                Expr::col(budgets::Column::CurrentMinor).sub(delta.cents()),
            )
            .filter(budgets::Column::ListId.eq(list_id.to_string()))
            .exec(db)
            .await?;
    }
    Ok(find_budget(db, list_id).await?.map(|b| b.current))
}

/// Expense counted by the purchased items of a list.
pub(super) fn spent_by(items: &[Item]) -> ResultEngine<MoneyCents> {
    items.iter().try_fold(MoneyCents::ZERO, |acc, item| {
        acc.checked_add(item.counted_expense()?)
            .ok_or_else(|| EngineError::Validation("list expense too large".to_string()))
    })
}

pub(super) fn mirror_entry(item: &Item, expense: MoneyCents) -> MirrorEntry {
    MirrorEntry {
        list_id: item.list_id.clone(),
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        expense,
    }
}

fn mirror_entries(items: &[Item]) -> ResultEngine<Vec<MirrorEntry>> {
    let mut entries = Vec::new();
    for item in items {
        let expense = item.counted_expense()?;
        if expense.is_positive() {
            entries.push(mirror_entry(item, expense));
        }
    }
    Ok(entries)
}

impl Engine {
    /// Recompute the remaining value of a list from its items.
    ///
    /// `current = original - Σ(expense of purchased items)` overwrites the
    /// stored value and the mirror entries of the list are rebuilt from the
    /// same items. Running it twice yields the same report values.
    pub async fn reconcile(&self, list_id: &str) -> ResultEngine<ReconcileReport> {
        let _guard = self.locks.lock(list_id).await;

        let (items, previous, current) = with_tx!(self, |db_tx| {
            require_list(&db_tx, list_id).await?;
            let items = list_items(&db_tx, list_id).await?;
            let spent = spent_by(&items)?;

            let (previous, current) = match find_budget(&db_tx, list_id).await? {
                Some(budget) => {
                    let expected = budget.original - spent;
                    if budget.current != expected {
                        let model = budgets::ActiveModel {
                            id: ActiveValue::Set(budget.id.clone()),
                            current_minor: ActiveValue::Set(expected.cents()),
                            ..Default::default()
                        };
                        model.update(&db_tx).await?;
                    }
                    (Some(budget.current), Some(expected))
                }
                None => (None, None),
            };
            Ok::<_, EngineError>((items, previous, current))
        })?;

        let repaired = previous != current;
        if repaired {
            tracing::info!(
                list_id,
                previous = ?previous.map(|v| v.cents()),
                current = ?current.map(|v| v.cents()),
                "budget reconciled"
            );
        }

        let entries = mirror_entries(&items)?;
        let mirror_entries = entries.len();
        let mirror_synced = self
            .sync_mirror(list_id, self.mirror.replace_list(list_id, entries))
            .await;

        Ok(ReconcileReport {
            list_id: list_id.to_string(),
            previous,
            current,
            repaired,
            mirror_entries,
            mirror_synced,
        })
    }

    /// Compare the mirror, the stored budget and the items of a list.
    ///
    /// Nothing is written. Returns [`EngineError::ConsistencyDrift`] when they
    /// disagree; lists without a budget only compare the mirror.
    pub async fn check_consistency(&self, list_id: &str) -> ResultEngine<()> {
        require_list(&self.database, list_id).await?;
        let items = list_items(&self.database, list_id).await?;
        let expected_spent = spent_by(&items)?;
        let budget = find_budget(&self.database, list_id).await?;
        let mirror_spent = self.mirror.sum_for(list_id).await?;

        let (stored_current, expected_current) = match &budget {
            Some(budget) => (budget.current, budget.original - expected_spent),
            None => (MoneyCents::ZERO, MoneyCents::ZERO),
        };

        if mirror_spent == expected_spent && stored_current == expected_current {
            return Ok(());
        }

        tracing::warn!(
            list_id,
            expected_spent = expected_spent.cents(),
            mirror_spent = mirror_spent.cents(),
            stored_current = stored_current.cents(),
            expected_current = expected_current.cents(),
            "consistency drift detected"
        );
        self.observer.on_reconciliation_needed(list_id);
        Err(EngineError::ConsistencyDrift {
            list_id: list_id.to_string(),
            expected_spent,
            mirror_spent,
            stored_current,
            expected_current,
        })
    }

    /// Running expense of a list, derived from the mirror on each call.
    pub async fn expense_summary(&self, list_id: &str) -> ResultEngine<ExpenseSummary> {
        require_list(&self.database, list_id).await?;
        let budget = find_budget(&self.database, list_id).await?;
        let spent = self.mirror.sum_for(list_id).await?;
        Ok(ExpenseSummary {
            list_id: list_id.to_string(),
            spent,
            remaining: budget.as_ref().map(|b| b.current),
            original: budget.as_ref().map(|b| b.original),
        })
    }
}
