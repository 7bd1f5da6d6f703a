pub mod entities;
pub mod query;
pub mod upload;
pub mod use_cases;
