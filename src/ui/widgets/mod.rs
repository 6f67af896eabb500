// src/ui/widgets/mod.rs

pub mod disclaimer_popup;
pub mod footer;
pub mod results;
pub mod summary;
pub mod targets;
