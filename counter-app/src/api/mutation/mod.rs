mod set_count;

use async_graphql::MergedObject;

pub use set_count::CounterMutation;

#[derive(MergedObject, Default)]
pub struct Mutation(CounterMutation);
