//! GraphQL schema assembly

pub mod youtube;

use async_graphql::{EmptyMutation, EmptySubscription, MergedObject, Object, Schema};

use crate::clients::ServiceClients;

#[derive(Default)]
pub struct ServiceQuery;

#[Object]
impl ServiceQuery {
    async fn health(&self) -> &str {
        "ok"
    }
}

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(ServiceQuery, youtube::YoutubeQuery);

pub type AppSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Build the GraphQL schema with the shared service clients attached.
pub fn build_schema(clients: ServiceClients, introspection: bool) -> AppSchema {
    let mut builder =
        Schema::build(QueryRoot::default(), EmptyMutation, EmptySubscription).data(clients);
    if !introspection {
        builder = builder.disable_introspection();
    }
    builder.finish()
}
