//! Configuration module

pub mod site;

pub use site::FooterLink;
pub use site::HighlightConfig;
pub use site::NotebookConfig;
