mod abort_stats;
mod counter;

use async_graphql::MergedObject;

pub use abort_stats::AbortStatsQuery;
pub use counter::{Counter, CounterQuery};

#[derive(MergedObject, Default)]
pub struct Query(CounterQuery, AbortStatsQuery);
