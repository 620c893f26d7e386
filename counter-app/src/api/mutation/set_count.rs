use super::super::get_context;
use super::super::query::Counter;
use async_graphql::{Context, Object};

#[derive(Default)]
pub struct CounterMutation;

#[Object]
impl CounterMutation {
    async fn set_count<'ctx>(&self, context: &Context<'ctx>, count: i32) -> Counter {
        let ctx = get_context(context);
        Counter::new(ctx.set_count(count).await)
    }

    /// Cancel every request still registered for supersession (useful for debugging/admin)
    async fn clear_pending_requests<'ctx>(&self, context: &Context<'ctx>) -> usize {
        let ctx = get_context(context);
        ctx.abort_registry().clear()
    }
}
