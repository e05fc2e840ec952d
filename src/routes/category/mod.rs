mod handler;
mod model;

pub use handler::{create_category, delete_category, list_categories};
pub use model::Category;
