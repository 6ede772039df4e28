use std::sync::Arc;

use mongodb::{
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};

use crate::{auth::jwt::Keys, config::Config, models::user::UserDoc};

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub users: Collection<UserDoc>,
    pub cfg: Arc<Config>,

    pub access_keys: Keys,
    pub refresh_keys: Keys,
}

impl AppState {
    pub async fn new(cfg: &Config) -> mongodb::error::Result<Self> {
        let mut opts = ClientOptions::parse(&cfg.mongodb_uri).await?;
        opts.app_name = Some("vision-stream".to_string());
        let client = Client::with_options(opts)?;
        let db = client.database(&cfg.db_name);
        let users: Collection<UserDoc> = db.collection("users");

        let username_index = IndexModel::builder()
            .keys(mongodb::bson::doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let _ = users.create_index(username_index).await?;

        let email_index = IndexModel::builder()
            .keys(mongodb::bson::doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let _ = users.create_index(email_index).await?;

        Ok(Self {
            client,
            users,
            access_keys: Keys::from_secret(cfg.access_token_secret.as_bytes()),
            refresh_keys: Keys::from_secret(cfg.refresh_token_secret.as_bytes()),
            cfg: Arc::new(cfg.clone()),
        })
    }
}
