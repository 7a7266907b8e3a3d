//! Translation of list query strings into store filters.
//!
//! Every list endpoint shares one convention: reserved keys steer sorting,
//! paging, keyword search and time windows; every other key is an equality
//! filter on the field of the same name.

mod builder;
mod window;

pub use builder::{DEFAULT_PAGE_SIZE, FilterError, ListQuery};
pub use window::{Clock, TimeWindow};
