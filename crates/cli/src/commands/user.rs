//! Customer account management.

use tity_storefront::db::postgres::PgProductRepository;
use tity_storefront::services::auth::AuthService;

use super::{CommandError, connect};

/// Create a customer account with the same rules as the register page.
pub async fn create(username: &str, password: &str) -> Result<(), CommandError> {
    let repo = PgProductRepository::new(connect().await?);
    let user = AuthService::new(&repo)
        .register(username, password, password)
        .await?;

    tracing::info!(id = %user.id, username = %user.username, "Created user");
    Ok(())
}
