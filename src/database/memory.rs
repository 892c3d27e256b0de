use async_trait::async_trait;
use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Category, Item, Role, Subcategory, Variant};
use crate::database::store::{AccountChanges, CascadeReport, DbResult, InventoryStore, NewItem};

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    subcategories: BTreeMap<i64, Subcategory>,
    items: BTreeMap<i64, Item>,
    variants: BTreeMap<i64, Variant>,
    accounts: BTreeMap<i64, Account>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_item_cascade(&mut self, id: i64, report: &mut CascadeReport) {
        let before = self.variants.len();
        self.variants.retain(|_, v| v.item_id != id);
        report.variants += (before - self.variants.len()) as i64;
        self.items.remove(&id);
    }

    fn remove_subcategory_cascade(&mut self, id: i64, report: &mut CascadeReport) {
        let item_ids: Vec<i64> = self
            .items
            .values()
            .filter(|i| i.subcategory_id == id)
            .map(|i| i.id)
            .collect();
        for item_id in item_ids {
            self.remove_item_cascade(item_id, report);
            report.items += 1;
        }
        self.subcategories.remove(&id);
    }
}

fn checked_quantity(quantity: i64, delta: i64) -> DbResult<i64> {
    match quantity.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(DatabaseError::OutOfRange(format!(
            "adjusting quantity {} by {} would leave it outside 0..={}",
            quantity,
            delta,
            i64::MAX
        ))),
    }
}

/// Process-local store with the same atomicity as [`PgStore`](crate::database::postgres::PgStore).
///
/// Multi-row writes are applied to a staged copy of the tables that only
/// replaces the live tables once every step succeeded.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    // Index of the variant insert that should fail, usize::MAX for none.
    #[cfg(test)]
    failing_variant_insert: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            #[cfg(test)]
            failing_variant_insert: AtomicUsize::new(usize::MAX),
        }
    }

    /// Makes the `index`-th variant insert of the next item creation fail.
    #[cfg(test)]
    pub(crate) fn fail_variant_insert(&self, index: usize) {
        self.failing_variant_insert.store(index, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn take_failing_variant_insert(&self) -> Option<usize> {
        match self.failing_variant_insert.swap(usize::MAX, Ordering::SeqCst) {
            usize::MAX => None,
            index => Some(index),
        }
    }

    #[cfg(not(test))]
    fn take_failing_variant_insert(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }

    async fn insert_category(&self, name: &str) -> DbResult<Category> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        let category = Category { id, name: name.to_string() };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn rename_category(&self, id: i64, name: &str) -> DbResult<Category> {
        let mut tables = self.tables.write().await;
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("category", id))?;
        category.name = name.to_string();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> DbResult<CascadeReport> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(DatabaseError::not_found("category", id));
        }

        let mut staged = tables.clone();
        let mut report = CascadeReport::default();
        let subcategory_ids: Vec<i64> = staged
            .subcategories
            .values()
            .filter(|s| s.category_id == id)
            .map(|s| s.id)
            .collect();
        for subcategory_id in subcategory_ids {
            staged.remove_subcategory_cascade(subcategory_id, &mut report);
            report.subcategories += 1;
        }
        staged.categories.remove(&id);

        *tables = staged;
        Ok(report)
    }

    async fn list_categories(&self) -> DbResult<Vec<Category>> {
        Ok(self.tables.read().await.categories.values().cloned().collect())
    }

    async fn category_exists(&self, id: i64) -> DbResult<bool> {
        Ok(self.tables.read().await.categories.contains_key(&id))
    }

    async fn insert_subcategory(&self, category_id: i64, name: &str) -> DbResult<Subcategory> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&category_id) {
            return Err(DatabaseError::not_found("category", category_id));
        }
        let id = tables.allocate_id();
        let subcategory = Subcategory { id, name: name.to_string(), category_id };
        tables.subcategories.insert(id, subcategory.clone());
        Ok(subcategory)
    }

    async fn rename_subcategory(&self, id: i64, name: &str) -> DbResult<Subcategory> {
        let mut tables = self.tables.write().await;
        let subcategory = tables
            .subcategories
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("subcategory", id))?;
        subcategory.name = name.to_string();
        Ok(subcategory.clone())
    }

    async fn delete_subcategory(&self, id: i64) -> DbResult<CascadeReport> {
        let mut tables = self.tables.write().await;
        if !tables.subcategories.contains_key(&id) {
            return Err(DatabaseError::not_found("subcategory", id));
        }
        let mut staged = tables.clone();
        let mut report = CascadeReport::default();
        staged.remove_subcategory_cascade(id, &mut report);
        *tables = staged;
        Ok(report)
    }

    async fn list_subcategories(&self, category_id: Option<i64>) -> DbResult<Vec<Subcategory>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subcategories
            .values()
            .filter(|s| category_id.map_or(true, |parent| s.category_id == parent))
            .cloned()
            .collect())
    }

    async fn subcategory_exists(&self, id: i64) -> DbResult<bool> {
        Ok(self.tables.read().await.subcategories.contains_key(&id))
    }

    async fn insert_item(&self, item: &NewItem) -> DbResult<(Item, Vec<Variant>)> {
        let mut tables = self.tables.write().await;
        if !tables.subcategories.contains_key(&item.subcategory_id) {
            return Err(DatabaseError::not_found("subcategory", item.subcategory_id));
        }

        let failing = self.take_failing_variant_insert();
        let mut staged = tables.clone();

        let id = staged.allocate_id();
        let created = Item {
            id,
            name: item.name.clone(),
            quantity: item.quantity,
            subcategory_id: item.subcategory_id,
            has_variants: item.has_variants,
        };
        staged.items.insert(id, created.clone());

        let mut variants = Vec::with_capacity(item.variants.len());
        for (index, variant) in item.variants.iter().enumerate() {
            if failing == Some(index) {
                return Err(DatabaseError::Unavailable(format!(
                    "variant insert {} for item {} failed",
                    index, id
                )));
            }
            let variant_id = staged.allocate_id();
            let row = Variant {
                id: variant_id,
                name: variant.name.clone(),
                quantity: variant.quantity,
                item_id: id,
            };
            staged.variants.insert(variant_id, row.clone());
            variants.push(row);
        }

        *tables = staged;
        Ok((created, variants))
    }

    async fn update_item(&self, id: i64, name: &str, quantity: Option<i64>) -> DbResult<Item> {
        let mut tables = self.tables.write().await;
        let item = tables.items.get_mut(&id).ok_or_else(|| DatabaseError::not_found("item", id))?;
        if quantity.is_some() && item.has_variants {
            return Err(DatabaseError::InvalidState(format!(
                "item {} tracks stock on its variants",
                id
            )));
        }
        item.name = name.to_string();
        if let Some(quantity) = quantity {
            item.quantity = quantity;
        }
        Ok(item.clone())
    }

    async fn delete_item(&self, id: i64) -> DbResult<CascadeReport> {
        let mut tables = self.tables.write().await;
        if !tables.items.contains_key(&id) {
            return Err(DatabaseError::not_found("item", id));
        }
        let mut report = CascadeReport::default();
        tables.remove_item_cascade(id, &mut report);
        Ok(report)
    }

    async fn list_items(&self, subcategory_id: Option<i64>) -> DbResult<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|i| subcategory_id.map_or(true, |parent| i.subcategory_id == parent))
            .cloned()
            .collect())
    }

    async fn list_items_flat(&self) -> DbResult<Vec<Item>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .map(|item| Item {
                has_variants: tables.variants.values().any(|v| v.item_id == item.id),
                ..item.clone()
            })
            .collect())
    }

    async fn find_item(&self, id: i64) -> DbResult<Option<Item>> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn adjust_item_quantity(&self, id: i64, delta: i64) -> DbResult<Item> {
        let mut tables = self.tables.write().await;
        let item = tables.items.get_mut(&id).ok_or_else(|| DatabaseError::not_found("item", id))?;
        if item.has_variants {
            return Err(DatabaseError::InvalidState(format!(
                "item {} tracks stock on its variants",
                id
            )));
        }
        item.quantity = checked_quantity(item.quantity, delta)?;
        Ok(item.clone())
    }

    async fn insert_variant(&self, item_id: i64, name: &str, quantity: i64) -> DbResult<Variant> {
        let mut tables = self.tables.write().await;
        match tables.items.get(&item_id) {
            None => return Err(DatabaseError::not_found("item", item_id)),
            Some(item) if !item.has_variants => {
                return Err(DatabaseError::InvalidState(format!(
                    "item {} does not track variants",
                    item_id
                )))
            }
            Some(_) => {}
        }
        let id = tables.allocate_id();
        let variant = Variant { id, name: name.to_string(), quantity, item_id };
        tables.variants.insert(id, variant.clone());
        Ok(variant)
    }

    async fn update_variant(&self, id: i64, name: &str, quantity: Option<i64>) -> DbResult<Variant> {
        let mut tables = self.tables.write().await;
        let variant = tables
            .variants
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("variant", id))?;
        variant.name = name.to_string();
        if let Some(quantity) = quantity {
            variant.quantity = quantity;
        }
        Ok(variant.clone())
    }

    async fn delete_variant(&self, id: i64) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .variants
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found("variant", id))
    }

    async fn list_variants(&self, item_id: Option<i64>) -> DbResult<Vec<Variant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .variants
            .values()
            .filter(|v| item_id.map_or(true, |parent| v.item_id == parent))
            .cloned()
            .collect())
    }

    async fn adjust_variant_quantity(&self, id: i64, delta: i64) -> DbResult<Variant> {
        let mut tables = self.tables.write().await;
        let variant = tables
            .variants
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("variant", id))?;
        variant.quantity = checked_quantity(variant.quantity, delta)?;
        Ok(variant.clone())
    }

    async fn insert_account(&self, username: &str, password_hash: &str, role: Role) -> DbResult<Account> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.username == username) {
            return Err(DatabaseError::Conflict(format!("username '{}' already exists", username)));
        }
        let id = tables.allocate_id();
        let account = Account {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
        };
        tables.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn find_account_by_username(&self, username: &str) -> DbResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.username == username).cloned())
    }

    async fn list_accounts(&self) -> DbResult<Vec<Account>> {
        Ok(self.tables.read().await.accounts.values().cloned().collect())
    }

    async fn update_account(&self, id: i64, changes: &AccountChanges) -> DbResult<Account> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &changes.username {
            if tables.accounts.values().any(|a| a.id != id && &a.username == username) {
                return Err(DatabaseError::Conflict(format!("username '{}' already exists", username)));
            }
        }
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found("account", id))?;
        if let Some(username) = &changes.username {
            account.username = username.clone();
        }
        if let Some(hash) = &changes.password_hash {
            account.password_hash = hash.clone();
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        Ok(account.clone())
    }

    async fn delete_account(&self, id: i64) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found("account", id))
    }
}
