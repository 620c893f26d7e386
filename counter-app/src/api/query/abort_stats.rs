use super::super::get_context;
use async_graphql::{Context, Object};
use graphql_link::AbortStats;

#[derive(Default)]
pub struct AbortStatsQuery;

#[Object]
impl AbortStatsQuery {
    /// Get current request supersession statistics
    async fn abort_stats<'ctx>(&self, context: &Context<'ctx>) -> AbortStats {
        let ctx = get_context(context);
        ctx.abort_registry().stats()
    }
}
