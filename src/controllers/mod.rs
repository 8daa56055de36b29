pub mod manifest_controller;
