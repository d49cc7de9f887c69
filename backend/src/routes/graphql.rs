use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::graphql::Caller;
use crate::AppState;

/// POST /graphql - execute a GraphQL request.
///
/// A request without an Authorization header runs with no caller; the
/// resolvers then deny the protected fields. A bearer token that fails
/// verification rejects the whole request with 401 before anything
/// executes. A verified token is reconciled into a user record first,
/// which is the login side effect (create on first sight, refresh
/// profile fields and last_login_at after that).
async fn graphql_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> Response {
    let caller = if headers.contains_key(header::AUTHORIZATION) {
        let profile = match state.jwks_client.authenticate(&headers).await {
            Ok(profile) => profile,
            Err(e) => return (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
        };
        match state.store.reconcile(&profile) {
            Ok(user) => Caller(Some(user)),
            Err(e) => {
                tracing::error!("User reconciliation failed: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        }
    } else {
        Caller(None)
    };

    let request = req.into_inner().data(caller);
    GraphQLResponse::from(state.schema.execute(request).await).into_response()
}

/// GET /graphql - GraphiQL playground.
async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .with_state(state)
}
