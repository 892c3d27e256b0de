use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::models::{Category, Item, Subcategory, Variant};
use crate::database::{CascadeReport, NewItem, NewVariant};

use super::{non_negative, required, required_name, ServiceError, ServiceResult, Storage};

#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubcategoryInput {
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "idCategory", alias = "category_id")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemInput {
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "Quantity", alias = "quantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "idSubcategory", alias = "subcategory_id")]
    pub subcategory_id: Option<i64>,
    #[serde(rename = "hasVariants", alias = "has_variants")]
    pub has_variants: Option<bool>,
    #[serde(alias = "Variants")]
    pub variants: Option<Vec<VariantDraft>>,
}

/// Variant supplied inline with a new item.
#[derive(Debug, Default, Deserialize)]
pub struct VariantDraft {
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "Quantity", alias = "quantity")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VariantInput {
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "Quantity", alias = "quantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "idItem", alias = "item_id")]
    pub item_id: Option<i64>,
}

/// Rename plus optional wholesale quantity replacement.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInput {
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(rename = "Quantity", alias = "quantity")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemWithVariants {
    #[serde(flatten)]
    pub item: Item,
    pub variants: Vec<Variant>,
}

/// Structural operations on the four-level hierarchy. All input is
/// validated before the store is touched.
#[derive(Clone)]
pub struct HierarchyService {
    storage: Storage,
}

impl HierarchyService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    // Categories

    pub async fn create_category(&self, input: CategoryInput) -> ServiceResult<Category> {
        let name = required_name("Name", input.name.as_deref())?;
        let s = &self.storage;
        let category = s.guard("insert_category", s.store().insert_category(&name)).await?;
        info!("Created category {} '{}'", category.id, category.name);
        Ok(category)
    }

    pub async fn rename_category(&self, id: i64, input: CategoryInput) -> ServiceResult<Category> {
        let name = required_name("Name", input.name.as_deref())?;
        let s = &self.storage;
        let category = s.guard("rename_category", s.store().rename_category(id, &name)).await?;
        info!("Renamed category {} to '{}'", id, category.name);
        Ok(category)
    }

    pub async fn delete_category(&self, id: i64) -> ServiceResult<CascadeReport> {
        let s = &self.storage;
        let report = s.guard("delete_category", s.store().delete_category(id)).await?;
        info!(
            "Deleted category {} with {} subcategories, {} items, {} variants",
            id, report.subcategories, report.items, report.variants
        );
        Ok(report)
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        let s = &self.storage;
        s.guard("list_categories", s.store().list_categories()).await
    }

    // Subcategories

    pub async fn create_subcategory(&self, input: SubcategoryInput) -> ServiceResult<Subcategory> {
        let name = required_name("Name", input.name.as_deref())?;
        let category_id = required("idCategory", input.category_id)?;
        let s = &self.storage;
        let subcategory = s
            .guard("insert_subcategory", s.store().insert_subcategory(category_id, &name))
            .await?;
        info!("Created subcategory {} '{}' in category {}", subcategory.id, subcategory.name, category_id);
        Ok(subcategory)
    }

    pub async fn rename_subcategory(&self, id: i64, input: CategoryInput) -> ServiceResult<Subcategory> {
        let name = required_name("Name", input.name.as_deref())?;
        let s = &self.storage;
        let subcategory = s.guard("rename_subcategory", s.store().rename_subcategory(id, &name)).await?;
        info!("Renamed subcategory {} to '{}'", id, subcategory.name);
        Ok(subcategory)
    }

    pub async fn delete_subcategory(&self, id: i64) -> ServiceResult<CascadeReport> {
        let s = &self.storage;
        let report = s.guard("delete_subcategory", s.store().delete_subcategory(id)).await?;
        info!("Deleted subcategory {} with {} items, {} variants", id, report.items, report.variants);
        Ok(report)
    }

    /// Children of an existing category; a missing category is `NotFound`.
    pub async fn list_subcategories(&self, category_id: i64) -> ServiceResult<Vec<Subcategory>> {
        let s = &self.storage;
        if !s.guard("category_exists", s.store().category_exists(category_id)).await? {
            return Err(ServiceError::NotFound(format!("Category {} not found", category_id)));
        }
        let rows = s
            .guard("list_subcategories", s.store().list_subcategories(Some(category_id)))
            .await?;
        debug!("Listed {} subcategories of category {}", rows.len(), category_id);
        Ok(rows)
    }

    // Items

    pub async fn create_item(&self, input: ItemInput) -> ServiceResult<ItemWithVariants> {
        let name = required_name("Name", input.name.as_deref())?;
        let subcategory_id = required("idSubcategory", input.subcategory_id)?;
        let has_variants = input.has_variants.unwrap_or(false);
        let drafts = input.variants.unwrap_or_default();

        if !has_variants && !drafts.is_empty() {
            return Err(ServiceError::InvalidState(
                "variants require hasVariants to be true".to_string(),
            ));
        }

        // In variant mode the item's own counter is not meaningful.
        let quantity = if has_variants {
            0
        } else {
            non_negative("Quantity", required("Quantity", input.quantity)?)?
        };

        let variants = drafts
            .into_iter()
            .map(|draft| {
                Ok(NewVariant {
                    name: required_name("variants.Name", draft.name.as_deref())?,
                    quantity: non_negative(
                        "variants.Quantity",
                        required("variants.Quantity", draft.quantity)?,
                    )?,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        let new_item = NewItem { name, quantity, subcategory_id, has_variants, variants };
        let s = &self.storage;
        let (item, variants) = s.guard("insert_item", s.store().insert_item(&new_item)).await?;
        info!(
            "Created item {} '{}' in subcategory {} with {} variants",
            item.id,
            item.name,
            subcategory_id,
            variants.len()
        );
        Ok(ItemWithVariants { item, variants })
    }

    pub async fn update_item(&self, id: i64, input: UpdateInput) -> ServiceResult<Item> {
        let name = required_name("Name", input.name.as_deref())?;
        let quantity = input.quantity.map(|q| non_negative("Quantity", q)).transpose()?;
        let s = &self.storage;
        let item = s.guard("update_item", s.store().update_item(id, &name, quantity)).await?;
        info!("Updated item {} ('{}', quantity {})", id, item.name, item.quantity);
        Ok(item)
    }

    pub async fn delete_item(&self, id: i64) -> ServiceResult<CascadeReport> {
        let s = &self.storage;
        let report = s.guard("delete_item", s.store().delete_item(id)).await?;
        info!("Deleted item {} with {} variants", id, report.variants);
        Ok(report)
    }

    pub async fn list_items(&self, subcategory_id: i64) -> ServiceResult<Vec<Item>> {
        let s = &self.storage;
        if !s.guard("subcategory_exists", s.store().subcategory_exists(subcategory_id)).await? {
            return Err(ServiceError::NotFound(format!("Subcategory {} not found", subcategory_id)));
        }
        s.guard("list_items", s.store().list_items(Some(subcategory_id))).await
    }

    // Variants

    pub async fn create_variant(&self, input: VariantInput) -> ServiceResult<Variant> {
        let name = required_name("name", input.name.as_deref())?;
        let quantity = non_negative("quantity", required("quantity", input.quantity)?)?;
        let item_id = required("idItem", input.item_id)?;
        let s = &self.storage;
        let variant = s
            .guard("insert_variant", s.store().insert_variant(item_id, &name, quantity))
            .await?;
        info!("Created variant {} '{}' under item {}", variant.id, variant.name, item_id);
        Ok(variant)
    }

    pub async fn update_variant(&self, id: i64, input: UpdateInput) -> ServiceResult<Variant> {
        let name = required_name("Name", input.name.as_deref())?;
        let quantity = input.quantity.map(|q| non_negative("Quantity", q)).transpose()?;
        let s = &self.storage;
        let variant = s.guard("update_variant", s.store().update_variant(id, &name, quantity)).await?;
        info!("Updated variant {} ('{}', quantity {})", id, variant.name, variant.quantity);
        Ok(variant)
    }

    pub async fn delete_variant(&self, id: i64) -> ServiceResult<()> {
        let s = &self.storage;
        s.guard("delete_variant", s.store().delete_variant(id)).await?;
        info!("Deleted variant {}", id);
        Ok(())
    }

    pub async fn list_variants(&self, item_id: i64) -> ServiceResult<Vec<Variant>> {
        let s = &self.storage;
        if s.guard("find_item", s.store().find_item(item_id)).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Item {} not found", item_id)));
        }
        s.guard("list_variants", s.store().list_variants(Some(item_id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn service() -> (HierarchyService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let storage = Storage::new(store.clone(), Duration::from_secs(1));
        (HierarchyService::new(storage), store)
    }

    fn named(name: &str) -> CategoryInput {
        CategoryInput { name: Some(name.to_string()) }
    }

    async fn subcategory(service: &HierarchyService) -> (Category, Subcategory) {
        let category = service.create_category(named("Hardware")).await.unwrap();
        let subcategory = service
            .create_subcategory(SubcategoryInput { name: Some("Fasteners".to_string()), category_id: Some(category.id) })
            .await
            .unwrap();
        (category, subcategory)
    }

    fn plain_item(subcategory_id: i64, name: &str, quantity: i64) -> ItemInput {
        ItemInput {
            name: Some(name.to_string()),
            quantity: Some(quantity),
            subcategory_id: Some(subcategory_id),
            ..Default::default()
        }
    }

    fn draft(name: &str, quantity: i64) -> VariantDraft {
        VariantDraft { name: Some(name.to_string()), quantity: Some(quantity) }
    }

    #[tokio::test]
    async fn creates_n_children_under_parent() {
        let (service, _) = service();
        let (category, _) = subcategory(&service).await;
        for name in ["Tools", "Paint", "Plumbing"] {
            service
                .create_subcategory(SubcategoryInput { name: Some(name.to_string()), category_id: Some(category.id) })
                .await
                .unwrap();
        }

        let children = service.list_subcategories(category.id).await.unwrap();
        assert_eq!(children.len(), 4);
        assert!(children.iter().all(|s| s.category_id == category.id));
    }

    #[tokio::test]
    async fn rejects_blank_names_and_missing_parents() {
        let (service, _) = service();
        assert!(matches!(service.create_category(named("   ")).await, Err(ServiceError::MissingField("Name"))));

        let missing_parent = service
            .create_subcategory(SubcategoryInput { name: Some("Orphan".to_string()), category_id: Some(404) })
            .await;
        assert!(matches!(missing_parent, Err(ServiceError::NotFound(_))));

        let no_parent = service
            .create_subcategory(SubcategoryInput { name: Some("Orphan".to_string()), category_id: None })
            .await;
        assert!(matches!(no_parent, Err(ServiceError::MissingField("idCategory"))));
    }

    #[tokio::test]
    async fn names_are_stored_trimmed() {
        let (service, _) = service();
        let category = service.create_category(named("  Garden  ")).await.unwrap();
        assert_eq!(category.name, "Garden");
    }

    #[tokio::test]
    async fn item_round_trip_through_parent_listing() {
        let (service, _) = service();
        let (_, subcategory) = subcategory(&service).await;
        service.create_item(plain_item(subcategory.id, "Widget", 10)).await.unwrap();

        let items = service.list_items(subcategory.id).await.unwrap();
        let widget = items.iter().find(|i| i.name == "Widget").unwrap();
        assert_eq!(widget.quantity, 10);
        assert!(!widget.has_variants);
        assert_eq!(widget.subcategory_id, subcategory.id);
    }

    #[tokio::test]
    async fn variant_mode_records_zero_quantity() {
        let (service, _) = service();
        let (_, subcategory) = subcategory(&service).await;
        let created = service
            .create_item(ItemInput {
                has_variants: Some(true),
                variants: Some(vec![draft("Small", 3), draft("Large", 5)]),
                ..plain_item(subcategory.id, "Shirt", 99)
            })
            .await
            .unwrap();

        assert_eq!(created.item.quantity, 0);
        assert!(created.item.has_variants);
        assert_eq!(created.variants.len(), 2);
        let listed = service.list_variants(created.item.id).await.unwrap();
        assert_eq!(listed, created.variants);
    }

    #[tokio::test]
    async fn item_creation_is_all_or_nothing() {
        let (service, store) = service();
        let (_, subcategory) = subcategory(&service).await;
        store.fail_variant_insert(1);

        let result = service
            .create_item(ItemInput {
                has_variants: Some(true),
                variants: Some(vec![draft("Small", 3), draft("Large", 5)]),
                ..plain_item(subcategory.id, "Shirt", 0)
            })
            .await;
        assert!(matches!(result, Err(ServiceError::StorageUnavailable(_))));
        assert!(service.list_items(subcategory.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_variant_draft_is_rejected_before_any_write() {
        let (service, _) = service();
        let (_, subcategory) = subcategory(&service).await;

        let result = service
            .create_item(ItemInput {
                has_variants: Some(true),
                variants: Some(vec![draft("Small", 3), VariantDraft { name: Some(" ".to_string()), quantity: Some(1) }]),
                ..plain_item(subcategory.id, "Shirt", 0)
            })
            .await;
        assert!(matches!(result, Err(ServiceError::MissingField("variants.Name"))));
        assert!(service.list_items(subcategory.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn variants_need_variant_mode() {
        let (service, _) = service();
        let (_, subcategory) = subcategory(&service).await;

        let inline = service
            .create_item(ItemInput { variants: Some(vec![draft("Small", 1)]), ..plain_item(subcategory.id, "Cup", 1) })
            .await;
        assert!(matches!(inline, Err(ServiceError::InvalidState(_))));

        let plain = service.create_item(plain_item(subcategory.id, "Cup", 1)).await.unwrap();
        let later = service
            .create_variant(VariantInput { name: Some("Blue".to_string()), quantity: Some(1), item_id: Some(plain.item.id) })
            .await;
        assert!(matches!(later, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn variant_creation_requires_every_field() {
        let (service, _) = service();
        let missing_item = service
            .create_variant(VariantInput { name: Some("Blue".to_string()), quantity: Some(1), item_id: None })
            .await;
        assert!(matches!(missing_item, Err(ServiceError::MissingField("idItem"))));

        let missing_quantity = service
            .create_variant(VariantInput { name: Some("Blue".to_string()), quantity: None, item_id: Some(1) })
            .await;
        assert!(matches!(missing_quantity, Err(ServiceError::MissingField("quantity"))));

        let negative = service
            .create_variant(VariantInput { name: Some("Blue".to_string()), quantity: Some(-1), item_id: Some(1) })
            .await;
        assert!(matches!(negative, Err(ServiceError::OutOfRange(_))));
    }

    #[tokio::test]
    async fn cascade_delete_removes_every_descendant() {
        let (service, _) = service();
        let category = service.create_category(named("Kitchen")).await.unwrap();
        let mut subcategory_ids = Vec::new();
        for name in ["Pans", "Knives"] {
            let sub = service
                .create_subcategory(SubcategoryInput { name: Some(name.to_string()), category_id: Some(category.id) })
                .await
                .unwrap();
            service.create_item(plain_item(sub.id, "Thing", 1)).await.unwrap();
            subcategory_ids.push(sub.id);
        }

        let report = service.delete_category(category.id).await.unwrap();
        assert_eq!(report.subcategories, 2);
        assert_eq!(report.items, 2);

        assert!(matches!(service.list_subcategories(category.id).await, Err(ServiceError::NotFound(_))));
        for id in subcategory_ids {
            assert!(matches!(service.list_items(id).await, Err(ServiceError::NotFound(_))));
        }
        assert!(matches!(service.delete_category(category.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_parent_lists_empty() {
        let (service, _) = service();
        let category = service.create_category(named("Empty")).await.unwrap();
        assert!(service.list_subcategories(category.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wholesale_update_respects_variant_mode() {
        let (service, _) = service();
        let (_, subcategory) = subcategory(&service).await;
        let plain = service.create_item(plain_item(subcategory.id, "Nail", 5)).await.unwrap();
        let updated = service
            .update_item(plain.item.id, UpdateInput { name: Some("Nail 2in".to_string()), quantity: Some(40) })
            .await
            .unwrap();
        assert_eq!((updated.name.as_str(), updated.quantity), ("Nail 2in", 40));

        let moded = service
            .create_item(ItemInput { has_variants: Some(true), ..plain_item(subcategory.id, "Screw", 0) })
            .await
            .unwrap();
        let rejected = service
            .update_item(moded.item.id, UpdateInput { name: Some("Screw".to_string()), quantity: Some(3) })
            .await;
        assert!(matches!(rejected, Err(ServiceError::InvalidState(_))));

        let renamed = service
            .update_item(moded.item.id, UpdateInput { name: Some("Wood screw".to_string()), quantity: None })
            .await
            .unwrap();
        assert_eq!(renamed.quantity, 0);
    }
}
