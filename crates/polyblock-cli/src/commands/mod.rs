pub mod build;
pub mod count;
