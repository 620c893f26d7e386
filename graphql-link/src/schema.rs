use async_graphql::{ObjectType, Schema, SubscriptionType};

use crate::{FetchResult, Forward, Link, Observable, Operation};

/// Terminating link that executes operations against an in-process schema.
pub struct SchemaLink<Query, Mutation, Subscription> {
    schema: Schema<Query, Mutation, Subscription>,
}

impl<Query, Mutation, Subscription> SchemaLink<Query, Mutation, Subscription>
where
    Query: ObjectType + 'static,
    Mutation: ObjectType + 'static,
    Subscription: SubscriptionType + 'static,
{
    pub fn new(schema: Schema<Query, Mutation, Subscription>) -> Self {
        Self { schema }
    }
}

impl<Query, Mutation, Subscription> Link for SchemaLink<Query, Mutation, Subscription>
where
    Query: ObjectType + 'static,
    Mutation: ObjectType + 'static,
    Subscription: SubscriptionType + 'static,
{
    fn request(&self, operation: Operation, _forward: Forward) -> Observable {
        let schema = self.schema.clone();
        Observable::from_future(async move {
            log::debug!("Executing {}", operation.display_name());
            let response = schema.execute(operation.into_graphql_request()).await;
            Ok(FetchResult::try_from(response)?)
        })
    }
}
