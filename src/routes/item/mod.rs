mod handler;
mod model;

pub use handler::{create_item, delete_item, get_item, list_items, update_item};
pub use model::{Item, ItemPayload, MAX_DESCRIPTION_CHARS};
