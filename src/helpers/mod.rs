pub mod docs;
pub mod manifests;
pub mod naming;
pub mod validators;
