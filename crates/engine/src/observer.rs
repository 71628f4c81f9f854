use std::fmt::Debug;

/// Hooks the surrounding application can install to react to engine events.
///
/// Both methods are called after the triggering operation has finished its
/// durable writes and must not block.
pub trait EngineObserver: Debug + Send + Sync {
    /// A toggle was refused because the item has no price yet.
    fn on_price_required(&self, _item_id: &str) {}

    /// The expense mirror of a list could not be updated and the list should
    /// be reconciled.
    fn on_reconciliation_needed(&self, _list_id: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
