pub mod account;
pub mod category;
pub mod generate;
pub mod health;
pub mod item;
pub mod list;
pub mod list_item;
