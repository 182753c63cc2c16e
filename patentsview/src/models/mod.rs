pub mod page;
pub mod patent;
