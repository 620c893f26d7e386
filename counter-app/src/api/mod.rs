pub mod mutation;
pub mod query;

use async_graphql::{EmptySubscription, Schema};

use crate::models::context::ContextPointer;
use mutation::Mutation;
use query::Query;

pub type CounterSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema(context: ContextPointer) -> CounterSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .data(context)
        .finish()
}

pub fn get_context<'ctx>(context: &async_graphql::Context<'ctx>) -> &'ctx ContextPointer {
    context.data_unchecked::<ContextPointer>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Config;
    use crate::models::context::Context;
    use figment::Figment;
    use graphql_link::AbortRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> (CounterSchema, ContextPointer) {
        let config = Config::from_figment(&Figment::new()).unwrap();
        let context = Arc::new(Context::new(config, Arc::new(AbortRegistry::new())));
        (build_schema(context.clone()), context)
    }

    async fn execute(schema: &CounterSchema, query: &str) -> serde_json::Value {
        let response = schema.execute(query).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[tokio::test]
    async fn counter_starts_at_zero() {
        let (schema, _) = schema();

        assert_eq!(
            execute(&schema, "query Count { counter { id count } }").await,
            json!({ "counter": { "id": "1", "count": 0 } })
        );
    }

    #[tokio::test]
    async fn set_count_updates_counter() {
        let (schema, context) = schema();

        assert_eq!(
            execute(&schema, "mutation { setCount(count: 5) { id count } }").await,
            json!({ "setCount": { "id": "1", "count": 5 } })
        );
        assert_eq!(context.count().await, 5);
        assert_eq!(
            execute(&schema, "{ counter { count } }").await,
            json!({ "counter": { "count": 5 } })
        );
    }

    #[tokio::test]
    async fn abort_stats_exposes_registry() {
        let (schema, _) = schema();

        let stats = execute(
            &schema,
            "{ abortStats { pendingRequests superseded cancelled settled } }",
        )
        .await;
        assert_eq!(
            stats,
            json!({
                "abortStats": {
                    "pendingRequests": 0,
                    "superseded": 0,
                    "cancelled": 0,
                    "settled": 0
                }
            })
        );
        assert_eq!(
            execute(&schema, "mutation { clearPendingRequests }").await,
            json!({ "clearPendingRequests": 0 })
        );
    }
}
