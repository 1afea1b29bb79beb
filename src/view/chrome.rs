//! Route query and chrome state (mobile menu, sidebar)

use serde::{Deserialize, Serialize};

use crate::helpers::{encode_path, with_query};

/// Query parameters understood on every page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteQuery {
    pub search: Option<String>,
    pub menu: Option<String>,
    pub sidebar: Option<String>,
}

impl RouteQuery {
    /// Build from raw query pairs. The first value of a repeated key wins;
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = RouteQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "search" => &mut query.search,
                "menu" => &mut query.menu,
                "sidebar" => &mut query.sidebar,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }

    pub fn chrome(&self) -> ChromeState {
        ChromeState {
            menu_open: self.menu.as_deref() == Some("open"),
            sidebar_collapsed: self.sidebar.as_deref() == Some("collapsed"),
        }
    }
}

/// Header and sidebar toggles. Purely presentational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChromeState {
    pub menu_open: bool,
    pub sidebar_collapsed: bool,
}

impl ChromeState {
    pub fn toggle_menu(self) -> Self {
        Self {
            menu_open: !self.menu_open,
            ..self
        }
    }

    pub fn toggle_sidebar(self) -> Self {
        Self {
            sidebar_collapsed: !self.sidebar_collapsed,
            ..self
        }
    }

    /// Link to `path` carrying `search` and this chrome state
    pub fn href(&self, path: &str, search: &str) -> String {
        with_query(
            path,
            &[
                ("search", search),
                ("menu", if self.menu_open { "open" } else { "" }),
                (
                    "sidebar",
                    if self.sidebar_collapsed { "collapsed" } else { "" },
                ),
            ],
        )
    }
}

/// Chrome data handed to templates
#[derive(Debug, Clone, Serialize)]
pub struct ChromeLinks {
    pub menu_open: bool,
    pub sidebar_collapsed: bool,
    pub menu_toggle_href: String,
    pub sidebar_toggle_href: String,
}

impl ChromeLinks {
    pub fn new(chrome: ChromeState, path: &str, search: &str) -> Self {
        let path = encode_path(path);
        let path = path.as_str();
        Self {
            menu_open: chrome.menu_open,
            sidebar_collapsed: chrome.sidebar_collapsed,
            menu_toggle_href: chrome.toggle_menu().href(path, search),
            sidebar_toggle_href: chrome.toggle_sidebar().href(path, search),
        }
    }
}
