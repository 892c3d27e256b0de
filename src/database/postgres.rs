use async_trait::async_trait;
use sqlx::{Executor, PgPool};
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Category, Item, Role, Subcategory, Variant};
use crate::database::store::{AccountChanges, CascadeReport, DbResult, InventoryStore, NewItem};

const SCHEMA: &str = include_str!("../../migrations/schema.sql");

const ITEM_COLUMNS: &str = "id, name, quantity, subcategory_id, has_variants";
const VARIANT_COLUMNS: &str = "id, name, quantity, item_id";
const ACCOUNT_COLUMNS: &str = "id, username, password_hash, role";

/// PostgreSQL-backed store. Cascades rely on `ON DELETE CASCADE` foreign
/// keys, counters on single conditional `UPDATE` statements.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the idempotent schema.
    pub async fn migrate(&self) -> DbResult<()> {
        self.pool.execute(SCHEMA).await?;
        Ok(())
    }

    /// Explains why a conditional item update matched no row.
    async fn diagnose_item(&self, id: i64, delta: Option<i64>) -> DatabaseError {
        let row: Result<Option<(bool, i64)>, _> =
            sqlx::query_as("SELECT has_variants, quantity FROM items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;

        match row {
            Err(e) => e.into(),
            Ok(None) => DatabaseError::not_found("item", id),
            Ok(Some((true, _))) => {
                DatabaseError::InvalidState(format!("item {} tracks stock on its variants", id))
            }
            Ok(Some((false, quantity))) => out_of_range(quantity, delta.unwrap_or_default()),
        }
    }
}

fn out_of_range(quantity: i64, delta: i64) -> DatabaseError {
    DatabaseError::OutOfRange(format!(
        "adjusting quantity {} by {} would leave it outside 0..={}",
        quantity,
        delta,
        i64::MAX
    ))
}

/// Maps constraint violations to the domain errors they represent.
fn classify(err: sqlx::Error, parent: &'static str, parent_id: i64) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return DatabaseError::not_found(parent, parent_id);
        }
        if db_err.is_unique_violation() {
            return DatabaseError::Conflict(db_err.message().to_string());
        }
        if db_err.is_check_violation() {
            return DatabaseError::OutOfRange(db_err.message().to_string());
        }
        // numeric_value_out_of_range
        if db_err.code().as_deref() == Some("22003") {
            return DatabaseError::OutOfRange("quantity overflow".to_string());
        }
    }
    err.into()
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_category(&self, name: &str) -> DbResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn rename_category(&self, id: i64, name: &str) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("category", id))
    }

    async fn delete_category(&self, id: i64) -> DbResult<CascadeReport> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks concurrent child inserts (their FK check needs a
        // KEY SHARE lock on this row) until the delete commits.
        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::not_found("category", id));
        }

        let (subcategories, items, variants): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM subcategories s WHERE s.category_id = $1),
                (SELECT COUNT(*) FROM items i
                    JOIN subcategories s ON s.id = i.subcategory_id
                    WHERE s.category_id = $1),
                (SELECT COUNT(*) FROM variants v
                    JOIN items i ON i.id = v.item_id
                    JOIN subcategories s ON s.id = i.subcategory_id
                    WHERE s.category_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(CascadeReport { subcategories, items, variants })
    }

    async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn category_exists(&self, id: i64) -> DbResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_subcategory(&self, category_id: i64, name: &str) -> DbResult<Subcategory> {
        sqlx::query_as::<_, Subcategory>(
            "INSERT INTO subcategories (name, category_id) VALUES ($1, $2) RETURNING id, name, category_id",
        )
        .bind(name)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "category", category_id))
    }

    async fn rename_subcategory(&self, id: i64, name: &str) -> DbResult<Subcategory> {
        sqlx::query_as::<_, Subcategory>(
            "UPDATE subcategories SET name = $2 WHERE id = $1 RETURNING id, name, category_id",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("subcategory", id))
    }

    async fn delete_subcategory(&self, id: i64) -> DbResult<CascadeReport> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM subcategories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::not_found("subcategory", id));
        }

        let (items, variants): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items i WHERE i.subcategory_id = $1),
                (SELECT COUNT(*) FROM variants v
                    JOIN items i ON i.id = v.item_id
                    WHERE i.subcategory_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(CascadeReport { subcategories: 0, items, variants })
    }

    async fn list_subcategories(&self, category_id: Option<i64>) -> DbResult<Vec<Subcategory>> {
        let rows = sqlx::query_as::<_, Subcategory>(
            "SELECT id, name, category_id FROM subcategories WHERE ($1::BIGINT IS NULL OR category_id = $1) ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn subcategory_exists(&self, id: i64) -> DbResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM subcategories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_item(&self, item: &NewItem) -> DbResult<(Item, Vec<Variant>)> {
        // Dropping the transaction on any early return rolls back the item
        // together with whichever variants were already inserted.
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Item>(&format!(
            "INSERT INTO items (name, quantity, subcategory_id, has_variants) VALUES ($1, $2, $3, $4) RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.subcategory_id)
        .bind(item.has_variants)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, "subcategory", item.subcategory_id))?;

        let mut variants = Vec::with_capacity(item.variants.len());
        for variant in &item.variants {
            let row = sqlx::query_as::<_, Variant>(&format!(
                "INSERT INTO variants (name, quantity, item_id) VALUES ($1, $2, $3) RETURNING {}",
                VARIANT_COLUMNS
            ))
            .bind(&variant.name)
            .bind(variant.quantity)
            .bind(created.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(e, "item", created.id))?;
            variants.push(row);
        }

        tx.commit().await?;
        debug!("Inserted item {} with {} variants", created.id, variants.len());
        Ok((created, variants))
    }

    async fn update_item(&self, id: i64, name: &str, quantity: Option<i64>) -> DbResult<Item> {
        let updated = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items SET name = $2, quantity = COALESCE($3, quantity)
            WHERE id = $1 AND ($3::BIGINT IS NULL OR NOT has_variants)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "item", id))?;

        match updated {
            Some(item) => Ok(item),
            None => Err(self.diagnose_item(id, None).await),
        }
    }

    async fn delete_item(&self, id: i64) -> DbResult<CascadeReport> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::not_found("item", id));
        }

        let (variants,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM variants WHERE item_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(CascadeReport { subcategories: 0, items: 0, variants })
    }

    async fn list_items(&self, subcategory_id: Option<i64>) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE ($1::BIGINT IS NULL OR subcategory_id = $1) ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(subcategory_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_items_flat(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, Item>(
            r#"
            SELECT i.id, i.name, i.quantity, i.subcategory_id,
                   EXISTS (SELECT 1 FROM variants v WHERE v.item_id = i.id) AS has_variants
            FROM items i
            ORDER BY i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_item(&self, id: i64) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn adjust_item_quantity(&self, id: i64, delta: i64) -> DbResult<Item> {
        let updated = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items SET quantity = quantity + $2
            WHERE id = $1 AND NOT has_variants AND quantity + $2 >= 0
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "item", id))?;

        match updated {
            Some(item) => Ok(item),
            None => Err(self.diagnose_item(id, Some(delta)).await),
        }
    }

    async fn insert_variant(&self, item_id: i64, name: &str, quantity: i64) -> DbResult<Variant> {
        // Inserting through a SELECT on the parent keeps the mode check and
        // the insert in one statement.
        let created = sqlx::query_as::<_, Variant>(&format!(
            r#"
            INSERT INTO variants (name, quantity, item_id)
            SELECT $2, $3, i.id FROM items i WHERE i.id = $1 AND i.has_variants
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        ))
        .bind(item_id)
        .bind(name)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "item", item_id))?;

        match created {
            Some(variant) => Ok(variant),
            None => match self.find_item(item_id).await? {
                None => Err(DatabaseError::not_found("item", item_id)),
                Some(_) => Err(DatabaseError::InvalidState(format!(
                    "item {} does not track variants",
                    item_id
                ))),
            },
        }
    }

    async fn update_variant(&self, id: i64, name: &str, quantity: Option<i64>) -> DbResult<Variant> {
        sqlx::query_as::<_, Variant>(&format!(
            "UPDATE variants SET name = $2, quantity = COALESCE($3, quantity) WHERE id = $1 RETURNING {}",
            VARIANT_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "variant", id))?
        .ok_or_else(|| DatabaseError::not_found("variant", id))
    }

    async fn delete_variant(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM variants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("variant", id));
        }
        Ok(())
    }

    async fn list_variants(&self, item_id: Option<i64>) -> DbResult<Vec<Variant>> {
        let rows = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {} FROM variants WHERE ($1::BIGINT IS NULL OR item_id = $1) ORDER BY id",
            VARIANT_COLUMNS
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn adjust_variant_quantity(&self, id: i64, delta: i64) -> DbResult<Variant> {
        let updated = sqlx::query_as::<_, Variant>(&format!(
            "UPDATE variants SET quantity = quantity + $2 WHERE id = $1 AND quantity + $2 >= 0 RETURNING {}",
            VARIANT_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "variant", id))?;

        if let Some(variant) = updated {
            return Ok(variant);
        }

        let current: Option<(i64,)> = sqlx::query_as("SELECT quantity FROM variants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            None => Err(DatabaseError::not_found("variant", id)),
            Some((quantity,)) => Err(out_of_range(quantity, delta)),
        }
    }

    async fn insert_account(&self, username: &str, password_hash: &str, role: Role) -> DbResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (username, password_hash, role) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "account", 0))
    }

    async fn find_account_by_username(&self, username: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_accounts(&self) -> DbResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(&format!("SELECT {} FROM accounts ORDER BY id", ACCOUNT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_account(&self, id: i64, changes: &AccountChanges) -> DbResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role)
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(changes.username.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "account", id))?
        .ok_or_else(|| DatabaseError::not_found("account", id))
    }

    async fn delete_account(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("account", id));
        }
        Ok(())
    }
}
