pub mod index;
pub mod reorder;
