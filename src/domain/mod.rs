pub mod groups;
pub mod rows;
