pub mod asset_sync;
pub mod cities;
pub mod import;
pub mod media;
pub mod search;
