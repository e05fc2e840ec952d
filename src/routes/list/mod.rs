mod handler;
mod model;

pub use handler::{create_list, delete_list, list_lists, update_list};
pub use model::{ShoppingList, next_list_name};
