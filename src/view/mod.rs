//! Views: the concept list, the concept detail state machine and the shell
//! that composes them into pages

pub mod chrome;
pub mod detail;
pub mod listing;
pub mod shell;

pub use chrome::{ChromeState, RouteQuery};
pub use detail::{ConceptDetailView, DetailState};
pub use listing::{ConceptListView, IndexEntry, Listing};
pub use shell::{Page, PageKind, Shell};
