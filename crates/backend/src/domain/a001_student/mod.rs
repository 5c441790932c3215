pub mod bulk_import;
pub mod repository;
pub mod service;
