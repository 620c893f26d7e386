use super::super::get_context;
use crate::models::context::COUNTER_ID;
use async_graphql::{Context, Object, SimpleObject, ID};
use serde::Serialize;

#[derive(SimpleObject, Serialize, Clone, Debug, PartialEq)]
pub struct Counter {
    pub id: ID,
    pub count: i32,
}

impl Counter {
    pub fn new(count: i32) -> Self {
        Self {
            id: ID(COUNTER_ID.to_string()),
            count,
        }
    }
}

#[derive(Default)]
pub struct CounterQuery;

#[Object]
impl CounterQuery {
    async fn counter<'ctx>(&self, context: &Context<'ctx>) -> Counter {
        let ctx = get_context(context);
        Counter::new(ctx.count().await)
    }
}
