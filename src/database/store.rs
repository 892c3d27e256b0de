use async_trait::async_trait;
use serde::Serialize;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Category, Item, Role, Subcategory, Variant};

pub type DbResult<T> = Result<T, DatabaseError>;

/// Item insert, optionally carrying the variants created with it.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub quantity: i64,
    pub subcategory_id: i64,
    pub has_variants: bool,
    pub variants: Vec<NewVariant>,
}

#[derive(Debug, Clone)]
pub struct NewVariant {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// Descendants removed together with the deleted entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub subcategories: i64,
    pub items: i64,
    pub variants: i64,
}

/// Persistent owner of every entity lifecycle.
///
/// Implementations must make each method atomic: a multi-row write either
/// applies fully or not at all, and quantity adjustments are a single
/// conditional update against the stored counter.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn health_check(&self) -> DbResult<()>;

    // Categories
    async fn insert_category(&self, name: &str) -> DbResult<Category>;
    async fn rename_category(&self, id: i64, name: &str) -> DbResult<Category>;
    async fn delete_category(&self, id: i64) -> DbResult<CascadeReport>;
    async fn list_categories(&self) -> DbResult<Vec<Category>>;
    async fn category_exists(&self, id: i64) -> DbResult<bool>;

    // Subcategories
    async fn insert_subcategory(&self, category_id: i64, name: &str) -> DbResult<Subcategory>;
    async fn rename_subcategory(&self, id: i64, name: &str) -> DbResult<Subcategory>;
    async fn delete_subcategory(&self, id: i64) -> DbResult<CascadeReport>;
    /// `None` lists every subcategory.
    async fn list_subcategories(&self, category_id: Option<i64>) -> DbResult<Vec<Subcategory>>;
    async fn subcategory_exists(&self, id: i64) -> DbResult<bool>;

    // Items
    async fn insert_item(&self, item: &NewItem) -> DbResult<(Item, Vec<Variant>)>;
    async fn update_item(&self, id: i64, name: &str, quantity: Option<i64>) -> DbResult<Item>;
    async fn delete_item(&self, id: i64) -> DbResult<CascadeReport>;
    /// `None` lists every item with its stored `has_variants` mode.
    async fn list_items(&self, subcategory_id: Option<i64>) -> DbResult<Vec<Item>>;
    /// Every item, `has_variants` computed from the presence of variant rows.
    async fn list_items_flat(&self) -> DbResult<Vec<Item>>;
    async fn find_item(&self, id: i64) -> DbResult<Option<Item>>;
    async fn adjust_item_quantity(&self, id: i64, delta: i64) -> DbResult<Item>;

    // Variants
    async fn insert_variant(&self, item_id: i64, name: &str, quantity: i64) -> DbResult<Variant>;
    async fn update_variant(&self, id: i64, name: &str, quantity: Option<i64>) -> DbResult<Variant>;
    async fn delete_variant(&self, id: i64) -> DbResult<()>;
    async fn list_variants(&self, item_id: Option<i64>) -> DbResult<Vec<Variant>>;
    async fn adjust_variant_quantity(&self, id: i64, delta: i64) -> DbResult<Variant>;

    // Accounts
    async fn insert_account(&self, username: &str, password_hash: &str, role: Role) -> DbResult<Account>;
    async fn find_account_by_username(&self, username: &str) -> DbResult<Option<Account>>;
    async fn list_accounts(&self) -> DbResult<Vec<Account>>;
    async fn update_account(&self, id: i64, changes: &AccountChanges) -> DbResult<Account>;
    async fn delete_account(&self, id: i64) -> DbResult<()>;
}
