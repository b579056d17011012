pub mod browse;
pub mod history;
pub mod neighbors;
pub mod recommendations;
pub mod title_match;

pub use history::{InMemorySearchHistory, SearchHistory};
pub use recommendations::{recommend, RatingFilter};
