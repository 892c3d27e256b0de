pub mod accounts;
pub mod error;
pub mod hierarchy;
pub mod quantity;
pub mod search;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::database::{DbResult, InventoryStore};

pub use accounts::AccountService;
pub use error::{ServiceError, ServiceResult};
pub use hierarchy::HierarchyService;
pub use quantity::QuantityAdjuster;
pub use search::SearchService;

/// Shared handle on the store. Every call goes through [`Storage::guard`],
/// which bounds it by the configured statement timeout.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn InventoryStore>,
    timeout: Duration,
}

impl Storage {
    pub fn new(store: Arc<dyn InventoryStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &dyn InventoryStore {
        self.store.as_ref()
    }

    pub async fn health_check(&self) -> ServiceResult<()> {
        self.guard("health_check", self.store.health_check()).await
    }

    pub async fn guard<T, F>(&self, operation: &'static str, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::StorageUnavailable(_) | ServiceError::Internal(_)) {
                    tracing::error!("Store operation '{}' failed: {}", operation, err);
                }
                err
            }),
            Err(_) => {
                tracing::error!("Store operation '{}' timed out after {:?}", operation, self.timeout);
                Err(ServiceError::StorageUnavailable(format!(
                    "{} timed out after {}ms",
                    operation,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

/// Trimmed, non-empty name.
pub(crate) fn required_name(field: &'static str, value: Option<&str>) -> ServiceResult<String> {
    match value.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ServiceError::MissingField(field)),
    }
}

pub(crate) fn required<T>(field: &'static str, value: Option<T>) -> ServiceResult<T> {
    value.ok_or(ServiceError::MissingField(field))
}

pub(crate) fn non_negative(field: &'static str, quantity: i64) -> ServiceResult<i64> {
    if quantity < 0 {
        return Err(ServiceError::OutOfRange(format!("{} must not be negative, got {}", field, quantity)));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Category;
    use crate::database::MemoryStore;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(required_name("Name", Some("  Bolts ")).unwrap(), "Bolts");
        assert!(matches!(required_name("Name", Some("   ")), Err(ServiceError::MissingField("Name"))));
        assert!(matches!(required_name("Name", None), Err(ServiceError::MissingField("Name"))));
    }

    #[test]
    fn negative_quantities_are_out_of_range() {
        assert_eq!(non_negative("Quantity", 0).unwrap(), 0);
        assert!(matches!(non_negative("Quantity", -1), Err(ServiceError::OutOfRange(_))));
    }

    #[tokio::test]
    async fn guard_times_out_slow_operations() {
        let storage = Storage::new(Arc::new(MemoryStore::new()), Duration::from_millis(20));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, crate::database::DatabaseError>(Category { id: 1, name: "late".to_string() })
        };
        let result = storage.guard("slow", slow).await;
        assert!(matches!(result, Err(ServiceError::StorageUnavailable(_))));
    }
}
