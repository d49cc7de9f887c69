//! GraphQL schema: the `User` queries and the admin mutations.
//!
//! Authorization is an explicit check at the top of each resolver, not a
//! framework guard: every entry point declares the roles it requires and
//! runs them through [`authorize`].

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Error, Object, Result as GqlResult, Schema, ID};
use uuid::Uuid;

use crate::auth::authorize;
use crate::models::{Role, User};
use crate::store::UserStore;

/// Per-request caller identity, injected by the HTTP layer after token
/// verification and reconciliation. `None` means no bearer token was sent.
pub struct Caller(pub Option<User>);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(store: Arc<UserStore>) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(store)
        .finish()
}

fn require_caller<'a>(ctx: &'a Context<'_>) -> GqlResult<&'a User> {
    match ctx.data_opt::<Caller>() {
        Some(Caller(Some(user))) => Ok(user),
        _ => Err(Error::new("Unauthorized")),
    }
}

fn require_role<'a>(ctx: &'a Context<'_>, required: &[Role]) -> GqlResult<&'a User> {
    let caller = require_caller(ctx)?;
    if !authorize(required, Some(caller.role)) {
        return Err(Error::new("Forbidden"));
    }
    Ok(caller)
}

fn parse_id(id: &ID) -> GqlResult<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| Error::new("Invalid user id"))
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The authenticated caller's own record.
    async fn me(&self, ctx: &Context<'_>) -> GqlResult<User> {
        Ok(require_caller(ctx)?.clone())
    }

    /// All user records. Admin only.
    async fn users(&self, ctx: &Context<'_>) -> GqlResult<Vec<User>> {
        require_role(ctx, &[Role::Admin])?;
        let store = ctx.data::<Arc<UserStore>>()?;
        Ok(store.find_all()?)
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Enable or disable an account. Admin only.
    async fn update_user_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        is_active: bool,
    ) -> GqlResult<User> {
        require_role(ctx, &[Role::Admin])?;
        let store = ctx.data::<Arc<UserStore>>()?;
        Ok(store.set_active(parse_id(&id)?, is_active)?)
    }

    /// Change an account's role. Admin only.
    async fn update_user_role(&self, ctx: &Context<'_>, id: ID, role: Role) -> GqlResult<User> {
        require_role(ctx, &[Role::Admin])?;
        let store = ctx.data::<Arc<UserStore>>()?;
        Ok(store.set_role(parse_id(&id)?, role)?)
    }
}
