pub mod account;
pub mod category;
pub mod item;
pub mod subcategory;
pub mod variant;

pub use account::{Account, Role};
pub use category::Category;
pub use item::Item;
pub use subcategory::Subcategory;
pub use variant::Variant;
