//! Shell: header, sidebar and footer around the routed view
//!
//! Every page goes through [`Shell::guard`], which turns template errors and
//! panics into a generic failure page, so a broken render never produces an
//! empty response.

use anyhow::Result;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tera::Context;

use super::chrome::{ChromeLinks, ChromeState, RouteQuery};
use super::detail::{ConceptDetailView, DetailState};
use super::listing::ConceptListView;
use crate::config::{FooterLink, NotebookConfig};
use crate::content::ContentRegistry;
use crate::helpers::{concept_path, html_escape, url_for};
use crate::templates::TemplateRenderer;

/// What a rendered page shows; the server maps this to a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Concept,
    Loading,
    NotFound,
    LoadError,
    Failure,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub kind: PageKind,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
struct SiteData {
    title: String,
    description: String,
    author: String,
    footer_links: Vec<FooterLink>,
}

#[derive(Debug, Clone, Serialize)]
struct NavEntry {
    title: String,
    href: String,
    active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ConceptData {
    heading: String,
    date: Option<String>,
    tags: Vec<String>,
    html: String,
}

pub struct Shell {
    site: SiteData,
    root: String,
    featured_limit: usize,
    templates: TemplateRenderer,
}

impl Shell {
    pub fn new(config: &NotebookConfig) -> Result<Self> {
        Ok(Self {
            site: SiteData {
                title: config.title.clone(),
                description: config.description.clone(),
                author: config.author.clone(),
                footer_links: config.footer_links.clone(),
            },
            root: config.root.clone(),
            featured_limit: config.featured_limit,
            templates: TemplateRenderer::new(&config.root)?,
        })
    }

    /// Home listing, filtered by `?search=`
    pub fn home(&self, registry: &ContentRegistry, query: &RouteQuery) -> Page {
        self.guard(PageKind::Home, || {
            let listing = ConceptListView::new(registry)
                .filter(query.search())
                .limit(self.featured_limit);
            let nav_chrome = Self::nav_chrome(query.chrome());
            let cards: Vec<NavEntry> = listing
                .entries
                .iter()
                .map(|entry| NavEntry {
                    title: entry.title.clone(),
                    href: nav_chrome.href(&concept_path(&self.root, &entry.slug), ""),
                    active: false,
                })
                .collect();

            let home = url_for(&self.root, "");
            let mut context = self.base_context(registry, &home, None, query);
            context.insert("page_title", &None::<String>);
            context.insert("listing", &listing);
            context.insert("cards", &cards);
            self.templates.render("home.html", &context)
        })
    }

    /// A concept page in whatever state its detail view reached
    pub fn concept(
        &self,
        registry: &ContentRegistry,
        view: &ConceptDetailView,
        query: &RouteQuery,
    ) -> Page {
        let kind = match view.state() {
            DetailState::Loading => PageKind::Loading,
            DetailState::Ready(_) => PageKind::Concept,
            DetailState::NotFound => PageKind::NotFound,
            DetailState::LoadError(_) => PageKind::LoadError,
        };

        self.guard(kind, || {
            let path = match view.slug() {
                Some(slug) => concept_path(&self.root, slug),
                None => url_for(&self.root, ""),
            };
            let mut context = self.base_context(registry, &path, view.slug(), query);
            context.insert("state", view.state().name());

            match view.state() {
                DetailState::Loading => {
                    context.insert("page_title", &view.slug());
                    self.templates.render("concept.html", &context)
                }
                DetailState::Ready(concept) => {
                    let data = ConceptData {
                        heading: concept.heading().to_string(),
                        date: concept.display_date(),
                        tags: concept.front_matter.tags.clone(),
                        html: concept.html.clone(),
                    };
                    context.insert("page_title", &data.heading);
                    context.insert("concept", &data);
                    self.templates.render("concept.html", &context)
                }
                DetailState::NotFound => self.message(
                    &mut context,
                    "Concept not found",
                    "Sorry, the page you are looking for does not exist.",
                    None,
                ),
                DetailState::LoadError(detail) => self.message(
                    &mut context,
                    "Failed to load concept",
                    "Something went wrong while loading this concept.",
                    Some(detail),
                ),
            }
        })
    }

    /// Page for paths no route matches. `path` is the request path as
    /// received; it is percent-encoded before it reaches any link.
    pub fn not_found(&self, registry: &ContentRegistry, path: &str, query: &RouteQuery) -> Page {
        self.guard(PageKind::NotFound, || {
            let mut context = self.base_context(registry, path, None, query);
            self.message(
                &mut context,
                "404 - Page Not Found",
                "Sorry, the page you are looking for does not exist.",
                None,
            )
        })
    }

    /// Run a render; on error or panic substitute the failure page
    pub fn guard<F>(&self, kind: PageKind, render: F) -> Page
    where
        F: FnOnce() -> Result<String>,
    {
        let failure = match panic::catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(html)) => return Page { kind, html },
            Ok(Err(err)) => format!("{:#}", err),
            Err(payload) => payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "render panicked".to_string()),
        };

        tracing::error!("Render failed: {}", failure);
        Page {
            kind: PageKind::Failure,
            html: self.failure_page(&failure),
        }
    }

    /// Standalone failure page; does not touch the template engine
    pub fn failure_page(&self, message: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Something went wrong | {title}</title>
<link rel="stylesheet" href="{css}"></head>
<body>
<div class="message">
  <h1>Something went wrong</h1>
  <p>{message}</p>
  <a href="{home}">Go back to Home</a>
</div>
</body>
</html>
"#,
            title = html_escape(&self.site.title),
            css = url_for(&self.root, "assets/notebook.css"),
            message = html_escape(message),
            home = url_for(&self.root, ""),
        )
    }

    fn message(
        &self,
        context: &mut Context,
        heading: &str,
        message: &str,
        detail: Option<&String>,
    ) -> Result<String> {
        context.insert("page_title", heading);
        context.insert("heading", heading);
        context.insert("message", message);
        context.insert("detail", &detail);
        self.templates.render("message.html", context)
    }

    fn base_context(
        &self,
        registry: &ContentRegistry,
        path: &str,
        active: Option<&str>,
        query: &RouteQuery,
    ) -> Context {
        let chrome = query.chrome();
        let nav_chrome = Self::nav_chrome(chrome);

        let sidebar: Vec<NavEntry> = registry
            .summaries()
            .into_iter()
            .map(|entry| NavEntry {
                href: nav_chrome.href(&concept_path(&self.root, &entry.slug), ""),
                active: active == Some(entry.slug.as_str()),
                title: entry.title,
            })
            .collect();

        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("version", env!("CARGO_PKG_VERSION"));
        context.insert("sidebar", &sidebar);
        context.insert("chrome", &ChromeLinks::new(chrome, path, query.search()));
        context
    }

    /// Following a link closes the mobile menu but keeps the sidebar as is
    fn nav_chrome(chrome: ChromeState) -> ChromeState {
        ChromeState {
            menu_open: false,
            ..chrome
        }
    }
}
