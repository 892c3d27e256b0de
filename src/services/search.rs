use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::database::models::{Category, Item, Subcategory, Variant};

use super::{ServiceError, ServiceResult, Storage};

/// Hierarchy level addressed by listing and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Categories,
    Subcategories,
    Items,
    Variants,
}

impl FromStr for Level {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "categories" => Ok(Level::Categories),
            "subcategories" => Ok(Level::Subcategories),
            "items" => Ok(Level::Items),
            "variants" => Ok(Level::Variants),
            other => Err(ServiceError::NotFound(format!("Unknown level '{}'", other))),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Categories => "categories",
            Level::Subcategories => "subcategories",
            Level::Items => "items",
            Level::Variants => "variants",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Category(Category),
    Subcategory(Subcategory),
    Item(Item),
    Variant(Variant),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Category(c) => &c.name,
            Entity::Subcategory(s) => &s.name,
            Entity::Item(i) => &i.name,
            Entity::Variant(v) => &v.name,
        }
    }
}

/// Read-only listing and name search over any level. Every call fetches
/// the level afresh from the store.
#[derive(Clone)]
pub struct SearchService {
    storage: Storage,
}

impl SearchService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Every item, with `has_variants` derived from existing variants.
    pub async fn list_items_flat(&self) -> ServiceResult<Vec<Item>> {
        let s = &self.storage;
        s.guard("list_items_flat", s.store().list_items_flat()).await
    }

    pub async fn list_all(&self, level: Level) -> ServiceResult<Vec<Entity>> {
        let s = &self.storage;
        let store = s.store();
        let entities = match level {
            Level::Categories => s
                .guard("list_categories", store.list_categories())
                .await?
                .into_iter()
                .map(Entity::Category)
                .collect(),
            Level::Subcategories => s
                .guard("list_subcategories", store.list_subcategories(None))
                .await?
                .into_iter()
                .map(Entity::Subcategory)
                .collect(),
            Level::Items => self.list_items_flat().await?.into_iter().map(Entity::Item).collect(),
            Level::Variants => s
                .guard("list_variants", store.list_variants(None))
                .await?
                .into_iter()
                .map(Entity::Variant)
                .collect(),
        };
        Ok(entities)
    }

    /// Case-insensitive substring match on names. A blank query matches all.
    pub async fn search(&self, level: Level, query: &str) -> ServiceResult<Vec<Entity>> {
        let needle = query.trim().to_lowercase();
        let mut entities = self.list_all(level).await?;
        if !needle.is_empty() {
            entities.retain(|e| e.name().to_lowercase().contains(&needle));
        }
        debug!("Search {} for '{}' matched {}", level, needle, entities.len());
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{InventoryStore, MemoryStore, NewItem, NewVariant};
    use std::sync::Arc;
    use std::time::Duration;

    async fn seeded() -> SearchService {
        let store = Arc::new(MemoryStore::new());
        let tools = store.insert_category("Power Tools").await.unwrap();
        store.insert_category("Garden").await.unwrap();
        let drills = store.insert_subcategory(tools.id, "Drills").await.unwrap();
        store
            .insert_item(&NewItem {
                name: "Cordless Drill".to_string(),
                quantity: 0,
                subcategory_id: drills.id,
                has_variants: true,
                variants: vec![NewVariant { name: "18V".to_string(), quantity: 2 }],
            })
            .await
            .unwrap();
        store
            .insert_item(&NewItem {
                name: "Drill bits".to_string(),
                quantity: 30,
                subcategory_id: drills.id,
                has_variants: false,
                variants: vec![],
            })
            .await
            .unwrap();
        SearchService::new(Storage::new(store, Duration::from_secs(1)))
    }

    #[test]
    fn parses_level_names() {
        assert_eq!("items".parse::<Level>().unwrap(), Level::Items);
        assert_eq!("Categories".parse::<Level>().unwrap(), Level::Categories);
        assert!(matches!("shelves".parse::<Level>(), Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_is_trimmed_and_case_insensitive() {
        let service = seeded().await;
        let hits = service.search(Level::Items, "  DRILL ").await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = service.search(Level::Categories, "tool").await.unwrap();
        assert_eq!(hits.iter().map(Entity::name).collect::<Vec<_>>(), vec!["Power Tools"]);
    }

    #[tokio::test]
    async fn blank_query_returns_whole_level() {
        let service = seeded().await;
        assert_eq!(service.search(Level::Categories, "   ").await.unwrap().len(), 2);
        assert_eq!(service.list_all(Level::Variants).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flat_items_carry_derived_variant_flag() {
        let service = seeded().await;
        let items = service.list_items_flat().await.unwrap();
        let flags: Vec<(&str, bool)> = items.iter().map(|i| (i.name.as_str(), i.has_variants)).collect();
        assert_eq!(flags, vec![("Cordless Drill", true), ("Drill bits", false)]);
    }
}
