//! Built-in notebook templates using the Tera template engine
//!
//! Templates and the stylesheet are embedded directly in the binary.

use anyhow::Result;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers;

/// Stylesheet served at `assets/notebook.css`
pub const STYLESHEET: &str = include_str!("notebook/notebook.css");

/// Template renderer with the embedded notebook theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer whose links are relative to `root`
    pub fn new(root: &str) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("notebook/layout.html")),
            ("home.html", include_str!("notebook/home.html")),
            ("concept.html", include_str!("notebook/concept.html")),
            ("message.html", include_str!("notebook/message.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("notebook/partials/header.html"),
            ),
            (
                "partials/sidebar.html",
                include_str!("notebook/partials/sidebar.html"),
            ),
            (
                "partials/footer.html",
                include_str!("notebook/partials/footer.html"),
            ),
        ])?;

        tera.register_function(
            "url_for",
            UrlFor {
                root: root.to_string(),
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera function: `url_for(path='assets/notebook.css')`
struct UrlFor {
    root: String,
}

impl tera::Function for UrlFor {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let path = match args.get("path") {
            Some(val) => tera::try_get_value!("url_for", "path", String, val),
            None => String::new(),
        };
        Ok(tera::Value::String(helpers::url_for(&self.root, &path)))
    }

    // Paths come from the config root and literal template arguments
    fn is_safe(&self) -> bool {
        true
    }
}
