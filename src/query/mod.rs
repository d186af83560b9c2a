mod columns;
mod filter;
mod order;
mod state;

pub use columns::ColSet;
pub use filter::FilterBuilder;
pub use order::Order;
pub use state::{query_pairs, Direction, FilterState, QueryState, SortState, ORDER_PARAM, PAGE_PARAM};
