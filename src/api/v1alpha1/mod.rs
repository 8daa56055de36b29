pub mod thinruntime_api;
