pub mod mapping_api;
