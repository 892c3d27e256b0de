use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Root of the inventory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    #[serde(rename = "idCategory")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
}
