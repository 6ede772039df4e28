use mongodb::bson::{doc, oid::ObjectId};

use crate::{
    auth::jwt::{new_claims, sign_token},
    errors::AppError,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints an access/refresh pair for `user_id` and persists the refresh token
/// on the user record. The stored token is overwritten, never appended:
/// exactly one refresh token is valid per user, and concurrent renewals
/// serialize on the single-document write, so the last writer's token is the
/// one that survives.
pub async fn mint_token_pair(state: &AppState, user_id: ObjectId) -> Result<TokenPair, AppError> {
    let access_claims = new_claims(user_id.to_hex(), state.cfg.access_token_ttl_seconds);
    let refresh_claims = new_claims(user_id.to_hex(), state.cfg.refresh_token_ttl_seconds);

    let access_token = sign_token(&access_claims, &state.access_keys)?;
    let refresh_token = sign_token(&refresh_claims, &state.refresh_keys)?;

    state
        .users
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { "refresh_token": &refresh_token } },
        )
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}
