use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    options::ReturnDocument,
};

use crate::{
    auth::{
        jwt::verify_token,
        tokens::{mint_token_pair, TokenPair},
    },
    dto::users::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateAccountRequest},
    errors::AppError,
    models::user::{UserDoc, UserPublic},
    password::{hash_password, verify_password},
    state::AppState,
};

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<UserPublic, AppError> {
    let username = req.username.trim().to_lowercase();
    let email = req.email.trim().to_lowercase();
    let full_name = req.full_name.trim().to_string();

    if username.is_empty() || email.is_empty() || full_name.is_empty() {
        return Err(AppError::Validation("all fields are required".into()));
    }

    let exists = state
        .users
        .find_one(doc! { "$or": [ { "username": &username }, { "email": &email } ] })
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(
            "user with email or username already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let user = UserDoc {
        id: ObjectId::new(),
        username,
        email,
        full_name,
        password_hash,
        refresh_token: None,
        avatar: req.avatar,
        cover_image: req.cover_image,
        created_at: BsonDateTime::now(),
    };

    state.users.insert_one(&user).await?;
    tracing::info!(username = %user.username, "user registered");

    Ok(user.into())
}

pub async fn login(
    state: &AppState,
    req: LoginRequest,
) -> Result<(UserPublic, TokenPair), AppError> {
    let mut identifiers = Vec::new();
    if let Some(username) = req.username.as_deref() {
        identifiers.push(doc! { "username": username.trim().to_lowercase() });
    }
    if let Some(email) = req.email.as_deref() {
        identifiers.push(doc! { "email": email.trim().to_lowercase() });
    }
    if identifiers.is_empty() {
        return Err(AppError::Validation("username or email is required".into()));
    }

    let user = state
        .users
        .find_one(doc! { "$or": identifiers })
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthenticated);
    }

    let tokens = mint_token_pair(state, user.id).await?;
    tracing::debug!(username = %user.username, "login succeeded");

    Ok((user.into(), tokens))
}

/// Exchanges a refresh token for a new pair. Each check is a terminal exit
/// for the request; the client retries only after a fresh renewal.
pub async fn refresh_session(state: &AppState, presented: &str) -> Result<TokenPair, AppError> {
    let claims = verify_token(presented, &state.refresh_keys)?;

    let user_id = ObjectId::parse_str(&claims.user_id).map_err(|_| AppError::InvalidToken)?;
    let user = state
        .users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::InvalidToken)?;

    validate_stored_refresh(user.refresh_token.as_deref(), presented)?;

    let tokens = mint_token_pair(state, user.id).await?;
    tracing::debug!(username = %user.username, "session renewed");

    Ok(tokens)
}

/// A presented refresh token is only honored while it is the token on the
/// user record. A rotated or cleared token means reuse of a stale credential.
fn validate_stored_refresh(stored: Option<&str>, presented: &str) -> Result<(), AppError> {
    match stored {
        Some(current) if current == presented => Ok(()),
        _ => Err(AppError::TokenReuseOrExpired),
    }
}

pub async fn logout(state: &AppState, user_id: ObjectId) -> Result<(), AppError> {
    state
        .users
        .update_one(
            doc! { "_id": user_id },
            doc! { "$unset": { "refresh_token": "" } },
        )
        .await?;

    Ok(())
}

pub async fn change_password(
    state: &AppState,
    user_id: ObjectId,
    req: ChangePasswordRequest,
) -> Result<(), AppError> {
    let user = state
        .users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(&req.old_password, &user.password_hash)? {
        return Err(AppError::Validation("current password is incorrect".into()));
    }

    let password_hash = hash_password(&req.new_password)?;

    // clearing the stored refresh token ends the active session everywhere
    state
        .users
        .update_one(
            doc! { "_id": user_id },
            doc! {
                "$set": { "password_hash": password_hash },
                "$unset": { "refresh_token": "" },
            },
        )
        .await?;

    Ok(())
}

pub async fn update_account(
    state: &AppState,
    user_id: ObjectId,
    req: UpdateAccountRequest,
) -> Result<UserPublic, AppError> {
    let mut set = Document::new();
    if let Some(full_name) = req.full_name.as_deref().map(str::trim) {
        if !full_name.is_empty() {
            set.insert("full_name", full_name);
        }
    }
    if let Some(email) = req.email.as_deref().map(str::trim) {
        if !email.is_empty() {
            set.insert("email", email.to_lowercase());
        }
    }
    if let Some(avatar) = req.avatar {
        set.insert("avatar", avatar);
    }
    if let Some(cover_image) = req.cover_image {
        set.insert("cover_image", cover_image);
    }

    if set.is_empty() {
        return Err(AppError::Validation("nothing to update".into()));
    }

    let user = state
        .users
        .find_one_and_update(doc! { "_id": user_id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_stored_token_is_accepted() {
        assert!(validate_stored_refresh(Some("token-r1"), "token-r1").is_ok());
    }

    #[test]
    fn rotated_token_fails_as_reuse() {
        // stored token has moved on to R2; presenting R1 again must fail
        let err = validate_stored_refresh(Some("token-r2"), "token-r1").unwrap_err();
        assert!(matches!(err, AppError::TokenReuseOrExpired));
    }

    #[test]
    fn cleared_token_fails_after_logout() {
        let err = validate_stored_refresh(None, "token-r1").unwrap_err();
        assert!(matches!(err, AppError::TokenReuseOrExpired));
    }
}
