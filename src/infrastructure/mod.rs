pub mod cloudinary;
pub mod db;
pub mod storage;
pub mod telemetry;
