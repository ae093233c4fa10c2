pub mod line_item;
pub mod project;
pub mod quote;
pub mod role;
pub mod setting;
