pub mod any;
pub mod asset_store;
pub mod backup;
pub mod city;
pub mod media;
pub mod memory;
pub mod sqlx_repo;
