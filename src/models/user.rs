use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub username: String,
    pub email: String,
    pub full_name: String,

    pub password_hash: String,

    /// The single live refresh token; unset means the user has no active
    /// session and every renewal attempt must fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    pub created_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: String,
}

impl From<UserDoc> for UserPublic {
    fn from(u: UserDoc) -> Self {
        Self {
            id: u.id.to_hex(),
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar: u.avatar,
            cover_image: u.cover_image,
            created_at: bson_to_rfc3339(u.created_at),
        }
    }
}

fn bson_to_rfc3339(dt: BsonDateTime) -> String {
    let ms = dt.timestamp_millis();
    let secs = ms / 1000;
    let nsec = ((ms % 1000) * 1_000_000) as u32;
    let chrono_dt = chrono::DateTime::<chrono::Utc>::from_timestamp(secs, nsec)
        .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap());
    chrono_dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_view_drops_credentials() {
        let user = UserDoc {
            id: ObjectId::new(),
            username: "chai".into(),
            email: "chai@example.com".into(),
            full_name: "Chai Aur".into(),
            password_hash: "$argon2id$...".into(),
            refresh_token: Some("stored-token".into()),
            avatar: None,
            cover_image: None,
            created_at: BsonDateTime::now(),
        };

        let public = serde_json::to_value(UserPublic::from(user)).unwrap();
        assert!(public.get("passwordHash").is_none());
        assert!(public.get("refreshToken").is_none());
        assert_eq!(public["username"], "chai");
    }
}
