//! Shared application state

use std::sync::Arc;

use gatekeep_core::{AuthService, Database, SqliteAccountStore, TokenCodec};

use crate::config::{HttpSettings, ServerArgs};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    pub fn new(auth: AuthService, settings: HttpSettings) -> Self {
        Self {
            auth: Arc::new(auth),
            settings: Arc::new(settings),
        }
    }

    /// Open the database and wire every collaborator from the parsed arguments
    pub async fn from_args(args: &ServerArgs) -> gatekeep_core::Result<Self> {
        let db = match args.db_path() {
            Some(path) => Database::open(path).await?,
            None => Database::new().await?,
        };

        let auth = AuthService::new(
            Arc::new(SqliteAccountStore::from(&db)),
            args.upload_service()?,
            TokenCodec::new(args.token_config()?),
            args.password_gate()?,
        );

        Ok(Self::new(auth, args.http_settings()?))
    }
}
