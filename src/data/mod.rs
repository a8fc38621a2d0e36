//! Consumer-side dashboard data.
//!
//! - [`fallback`]: the fixed values shown when the backend has none
//! - [`view`]: merging fetched data with fallbacks ([`DashboardView`])
//! - [`duration`]: parsing and formatting of interval strings ("30s", "2m")

pub mod duration;
pub mod fallback;
pub mod view;

pub use fallback::{Fallbacks, TOTAL_ROUNDS};
pub use view::{DashboardView, Origin, Origins};
