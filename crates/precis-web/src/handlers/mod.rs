pub mod index;
pub mod upload;
