use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{errors::AppError, models::user::UserPublic, state::AppState};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Token payload: `{ "_id": <user id hex>, "iat", "exp" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signing/verification keys for one token class. Access and refresh tokens
/// each get their own `Keys` built from their own secret.
#[derive(Clone)]
pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub fn new_claims(user_id_hex: String, ttl_seconds: i64) -> Claims {
    let now = Utc::now();
    Claims {
        user_id: user_id_hex,
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(ttl_seconds)).timestamp() as usize,
    }
}

pub fn sign_token(claims: &Claims, keys: &Keys) -> Result<String, AppError> {
    encode(&Header::default(), claims, &keys.encoding)
        .map_err(|e| AppError::Internal(format!("token signing: {e}")))
}

/// Signature and expiry check only; never touches the database.
pub fn verify_token(token: &str, keys: &Keys) -> Result<Claims, AppError> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthenticated)
}

/// The identity resolved by the access-token gate, threaded into every
/// protected handler. Carries the public profile only; the password hash
/// and the stored refresh token never leave the user document.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub profile: UserPublic,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| AppError::Unauthenticated)?;

        // cookie first, then Authorization: Bearer
        let token = match jar.get(ACCESS_TOKEN_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => {
                let TypedHeader(Authorization(bearer)) = parts
                    .extract::<TypedHeader<Authorization<Bearer>>>()
                    .await
                    .map_err(|_| AppError::Unauthenticated)?;
                bearer.token().to_string()
            }
        };

        let claims = verify_token(&token, &state.access_keys)?;
        let user_id =
            ObjectId::parse_str(&claims.user_id).map_err(|_| AppError::Unauthenticated)?;

        let user = state
            .users
            .find_one(doc! { "_id": user_id })
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self {
            id: user.id,
            profile: user.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn keys() -> Keys {
        Keys::from_secret(b"unit-test-access-secret")
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let claims = new_claims("507f1f77bcf86cd799439011".into(), 300);
        let token = sign_token(&claims, &keys()).unwrap();

        let verified = verify_token(&token, &keys()).unwrap();
        assert_eq!(verified.user_id, "507f1f77bcf86cd799439011");
        assert_eq!(verified.exp - verified.iat, 300);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = new_claims("507f1f77bcf86cd799439011".into(), 300);
        let token = sign_token(&claims, &keys()).unwrap();

        let other = Keys::from_secret(b"some-other-secret");
        let err = verify_token(&token, &other).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn expired_token_is_rejected() {
        // exp well past the default validation leeway
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            user_id: "507f1f77bcf86cd799439011".into(),
            iat: now - 600,
            exp: now - 300,
        };
        let token = sign_token(&claims, &keys()).unwrap();

        let err = verify_token(&token, &keys()).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let claims = new_claims("507f1f77bcf86cd799439011".into(), 300);
        let token = sign_token(&claims, &keys()).unwrap();

        // swap the subject inside the payload, keep header and signature
        let parts: Vec<&str> = token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        value["_id"] = serde_json::json!("ffffffffffffffffffffffff");

        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&value).unwrap()),
            parts[2]
        );

        assert!(verify_token(&forged, &keys()).is_err());
    }

    #[test]
    fn payload_uses_underscore_id() {
        let claims = new_claims("507f1f77bcf86cd799439011".into(), 300);
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["_id"], "507f1f77bcf86cd799439011");
        assert!(value.get("iat").is_some());
        assert!(value.get("exp").is_some());
    }
}
