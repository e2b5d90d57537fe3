pub mod correlation;
pub mod executor;
pub mod geometry;
pub mod groups;
pub mod identity;
pub mod index_slides;
pub mod mapping;
pub mod planner;
pub mod retry;
