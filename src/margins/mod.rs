//! Marginal distribution models: GPD tails, bulk marginals, and the hybrid
//! uniform-to-physical quantile mapping that joins them.

mod bulk;
mod quantile_map;
mod tail;

pub use bulk::{BulkMargin, FittedMargin, MarginFamily};
pub use quantile_map::{empirical_quantile, empirical_rank, map_uniform_to_physical};
pub use tail::GpdTail;
