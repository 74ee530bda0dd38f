use sqlx::PgPool;

/// Shared connection pool, installed on the router as an `Extension`
#[derive(Clone)]
pub struct DbPool(pub PgPool);

