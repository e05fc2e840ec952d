mod handler;
mod model;

pub use handler::{add_list_item, delete_list_item, get_list_items, update_list_item};
pub use model::ListItem;
