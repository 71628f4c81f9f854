use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{
    EngineError, MoneyCents, ResultEngine, TogglePlan, items,
    util::{find_budget, require_item},
};

use super::{
    Engine,
    ledger::{apply_delta, mirror_entry},
    with_tx,
};

/// Result of [`Engine::toggle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Toggled {
        purchased: bool,
        /// Remaining budget after the toggle, `None` when the list has none.
        budget: Option<MoneyCents>,
        /// `false` when the expense mirror could not be updated.
        mirror_synced: bool,
    },
    /// The item has no price; nothing was changed.
    PriceRequired { item_id: String },
}

impl Engine {
    /// Flip the purchased flag of an item and move its expense in or out of
    /// the budget of its list.
    ///
    /// The item and budget are re-read inside the list's critical section and
    /// written in one transaction. The mirror is updated after the commit.
    pub async fn toggle(&self, item_id: &str) -> ResultEngine<ToggleOutcome> {
        let list_id = require_item(&self.database, item_id).await?.list_id;
        let _guard = self.locks.lock(&list_id).await;

        let (item, plan, budget) = with_tx!(self, |db_tx| {
            let item = require_item(&db_tx, item_id).await?;
            let plan = TogglePlan::for_item(&item)?;

            let budget = match plan.purchased_after() {
                Some(purchased) => {
                    let model = items::ActiveModel {
                        id: ActiveValue::Set(item.id.clone()),
                        purchased: ActiveValue::Set(purchased),
                        ..Default::default()
                    };
                    model.update(&db_tx).await?;
                    apply_delta(&db_tx, &list_id, plan.budget_delta()).await?
                }
                None => find_budget(&db_tx, &list_id).await?.map(|b| b.current),
            };
            Ok::<_, EngineError>((item, plan, budget))
        })?;

        let mirror_synced = match plan {
            TogglePlan::PriceRequired => {
                tracing::debug!(item_id, "toggle refused, price required");
                self.observer.on_price_required(item_id);
                return Ok(ToggleOutcome::PriceRequired {
                    item_id: item_id.to_string(),
                });
            }
            TogglePlan::Purchase { expense } => {
                self.sync_mirror(&list_id, self.mirror.record(mirror_entry(&item, expense)))
                    .await
            }
            TogglePlan::Unpurchase { .. } => {
                self.sync_mirror(&list_id, self.mirror.clear(&list_id, &item.id))
                    .await
            }
        };

        let purchased = !item.purchased;
        tracing::debug!(
            item_id,
            list_id = %list_id,
            purchased,
            delta = plan.budget_delta().cents(),
            "item toggled"
        );
        Ok(ToggleOutcome::Toggled {
            purchased,
            budget,
            mirror_synced,
        })
    }
}
