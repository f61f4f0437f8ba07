//! Interactive widgets bound to one user: confirmation prompts and paginated views

pub mod confirm;
pub mod manager;
pub mod paginator;
pub mod session;
pub mod source;

pub use confirm::{run_confirm, Confirm, ConfirmOptions, ConfirmState};
pub use manager::{WidgetManager, WidgetTarget};
pub use paginator::{PaginatedView, Paginator, PaginatorState};
pub use session::{Outcome, WidgetSession, REJECTION_NOTICE};
pub use source::{ListPageSource, PageContent, PageSource};
