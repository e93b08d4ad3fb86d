//! HTTP handlers grouped by resource.

pub mod stakeholders;
pub mod suggestions;
pub mod system;
