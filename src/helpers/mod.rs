//! Helper functions shared by templates, views and the server

mod html;
mod url;

pub use html::*;
pub use url::*;
