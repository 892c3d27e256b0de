use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::models::{Item, Variant};

use super::{required, ServiceResult, Storage};

/// Body of a quantity step request.
#[derive(Debug, Default, Deserialize)]
pub struct QuantityStep {
    #[serde(alias = "Increment", alias = "delta")]
    pub increment: Option<i64>,
}

/// Which counter a step applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTarget {
    Item,
    Variant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Adjusted {
    Item(Item),
    Variant(Variant),
}

impl Adjusted {
    pub fn quantity(&self) -> i64 {
        match self {
            Adjusted::Item(item) => item.quantity,
            Adjusted::Variant(variant) => variant.quantity,
        }
    }
}

/// Applies signed increments to stock counters. The check that the result
/// stays non-negative happens in the same store statement as the write, so
/// concurrent steps never lose updates or go below zero.
#[derive(Clone)]
pub struct QuantityAdjuster {
    storage: Storage,
}

impl QuantityAdjuster {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn adjust(&self, target: StockTarget, id: i64, step: QuantityStep) -> ServiceResult<Adjusted> {
        let delta = required("increment", step.increment)?;
        match target {
            StockTarget::Item => self.adjust_item(id, delta).await.map(Adjusted::Item),
            StockTarget::Variant => self.adjust_variant(id, delta).await.map(Adjusted::Variant),
        }
    }

    pub async fn adjust_item(&self, id: i64, delta: i64) -> ServiceResult<Item> {
        let s = &self.storage;
        let item = s.guard("adjust_item_quantity", s.store().adjust_item_quantity(id, delta)).await?;
        info!("Adjusted item {} by {} to {}", id, delta, item.quantity);
        Ok(item)
    }

    pub async fn adjust_variant(&self, id: i64, delta: i64) -> ServiceResult<Variant> {
        let s = &self.storage;
        let variant = s
            .guard("adjust_variant_quantity", s.store().adjust_variant_quantity(id, delta))
            .await?;
        info!("Adjusted variant {} by {} to {}", id, delta, variant.quantity);
        Ok(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{InventoryStore, MemoryStore, NewItem, NewVariant};
    use crate::services::ServiceError;
    use futures::future::join_all;
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        adjuster: QuantityAdjuster,
        store: Arc<MemoryStore>,
        subcategory_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let category = store.insert_category("Hardware").await.unwrap();
        let subcategory = store.insert_subcategory(category.id, "Bolts").await.unwrap();
        let adjuster = QuantityAdjuster::new(Storage::new(store.clone(), Duration::from_secs(1)));
        Fixture { adjuster, store, subcategory_id: subcategory.id }
    }

    async fn item(f: &Fixture, quantity: i64, variants: Vec<NewVariant>) -> (Item, Vec<Variant>) {
        let has_variants = !variants.is_empty();
        f.store
            .insert_item(&NewItem {
                name: "M6 bolt".to_string(),
                quantity,
                subcategory_id: f.subcategory_id,
                has_variants,
                variants,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn steps_commute() {
        let orders = [[3, -2, 1], [-2, 3, 1], [1, -2, 3], [-2, 1, 3]];
        for order in orders {
            let f = fixture().await;
            let (created, _) = item(&f, 5, vec![]).await;
            for delta in order {
                f.adjuster.adjust_item(created.id, delta).await.unwrap();
            }
            let stored = f.store.find_item(created.id).await.unwrap().unwrap();
            assert_eq!(stored.quantity, 7, "order {:?}", order);
        }
    }

    #[tokio::test]
    async fn concurrent_steps_lose_no_updates() {
        let f = fixture().await;
        let (created, _) = item(&f, 0, vec![]).await;

        let steps = (0..50).map(|_| f.adjuster.adjust_item(created.id, 1));
        let results = join_all(steps).await;
        assert!(results.iter().all(Result::is_ok));

        let stored = f.store.find_item(created.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 50);
    }

    #[tokio::test]
    async fn step_below_zero_is_rejected_without_change() {
        let f = fixture().await;
        let (created, _) = item(&f, 1, vec![]).await;

        let result = f.adjuster.adjust_item(created.id, -2).await;
        assert!(matches!(result, Err(ServiceError::OutOfRange(_))));
        let stored = f.store.find_item(created.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);

        assert_eq!(f.adjuster.adjust_item(created.id, -1).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn variant_mode_item_counter_is_frozen() {
        let f = fixture().await;
        let (created, variants) = item(&f, 0, vec![NewVariant { name: "Zinc".to_string(), quantity: 4 }]).await;

        for delta in [1, -1] {
            let result = f.adjuster.adjust_item(created.id, delta).await;
            assert!(matches!(result, Err(ServiceError::InvalidState(_))));
        }

        let variant = f.adjuster.adjust_variant(variants[0].id, -3).await.unwrap();
        assert_eq!(variant.quantity, 1);
    }

    #[tokio::test]
    async fn unknown_targets_and_missing_increment() {
        let f = fixture().await;
        assert!(matches!(f.adjuster.adjust_item(999, 1).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(f.adjuster.adjust_variant(999, 1).await, Err(ServiceError::NotFound(_))));

        let (created, _) = item(&f, 2, vec![]).await;
        let missing = f.adjuster.adjust(StockTarget::Item, created.id, QuantityStep::default()).await;
        assert!(matches!(missing, Err(ServiceError::MissingField("increment"))));

        let stepped = f
            .adjuster
            .adjust(StockTarget::Item, created.id, QuantityStep { increment: Some(3) })
            .await
            .unwrap();
        assert_eq!(stepped.quantity(), 5);
    }
}
