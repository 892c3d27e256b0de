use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stocked item. When `has_variants` is set the stock lives on the
/// item's variants and `quantity` stays at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Item {
    #[serde(rename = "idItem")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "idSubcategory")]
    pub subcategory_id: i64,
    #[serde(rename = "hasVariants")]
    pub has_variants: bool,
}
