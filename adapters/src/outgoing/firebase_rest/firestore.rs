use std::collections::BTreeMap;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, instrument};

use super::errors::firestore_error;
use crate::outgoing::http::{join_url, map_transport_error, read_json};
use domain::auth::{User, UserId, UserRole};
use rooster_application::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(serde_json::Value),
    MapValue(serde_json::Value),
}

impl Value {
    fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    fn timestamp(at: OffsetDateTime) -> AppResult<Self> {
        at.format(&Rfc3339)
            .map(Value::TimestampValue)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to format timestamp: {e}"),
            })
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    /// Accepts RFC 3339 timestamps and epoch milliseconds.
    fn as_datetime(&self) -> Option<OffsetDateTime> {
        match self {
            Value::TimestampValue(s) => OffsetDateTime::parse(s, &Rfc3339).ok(),
            Value::IntegerValue(ms) => {
                let ms: i128 = ms.parse().ok()?;
                OffsetDateTime::from_unix_timestamp_nanos(ms * 1_000_000).ok()
            }
            _ => None,
        }
    }
}

pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

const PROFILE_FIELDS: [&str; 11] = [
    "id",
    "email",
    "displayName",
    "phoneNumber",
    "profileImageUrl",
    "role",
    "emailVerified",
    "phoneVerified",
    "active",
    "createdAt",
    "updatedAt",
];

pub fn user_to_fields(user: &User) -> AppResult<Fields> {
    let mut fields = Fields::new();
    fields.insert("id".into(), Value::string(user.id.as_str()));
    fields.insert("email".into(), Value::string(&user.email));
    fields.insert("displayName".into(), Value::string(&user.display_name));
    fields.insert("phoneNumber".into(), Value::string(&user.phone_number));
    fields.insert(
        "profileImageUrl".into(),
        user.profile_image_url
            .as_deref()
            .map_or(Value::NullValue(()), Value::string),
    );
    fields.insert("role".into(), Value::string(user.role.as_str()));
    fields.insert(
        "emailVerified".into(),
        Value::BooleanValue(user.is_email_verified),
    );
    fields.insert(
        "phoneVerified".into(),
        Value::BooleanValue(user.is_phone_verified),
    );
    fields.insert("active".into(), Value::BooleanValue(user.is_active));
    fields.insert("createdAt".into(), Value::timestamp(user.created_at)?);
    fields.insert("updatedAt".into(), Value::timestamp(user.updated_at)?);
    Ok(fields)
}

/// Missing fields fall back to profile defaults; an unknown role reads as
/// `FARMER`.
pub fn user_from_fields(uid: &str, fields: &Fields) -> User {
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let flag = |key: &str, default: bool| {
        fields
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    };
    let created_at = fields
        .get("createdAt")
        .and_then(Value::as_datetime)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let updated_at = fields
        .get("updatedAt")
        .and_then(Value::as_datetime)
        .unwrap_or(created_at);

    User {
        id: UserId::new(text("id").unwrap_or_else(|| uid.to_string())),
        email: text("email").unwrap_or_default(),
        display_name: text("displayName").unwrap_or_default(),
        phone_number: text("phoneNumber").unwrap_or_default(),
        profile_image_url: text("profileImageUrl").filter(|url| !url.is_empty()),
        role: text("role")
            .and_then(|role| role.parse::<UserRole>().ok())
            .unwrap_or_default(),
        is_email_verified: flag("emailVerified", false),
        is_phone_verified: flag("phoneVerified", false),
        is_active: flag("active", true),
        created_at,
        updated_at,
    }
}

pub struct FirestoreClient {
    http: Client,
    base_url: String,
    project_id: String,
    collection: String,
}

impl FirestoreClient {
    pub fn new(http: Client, base_url: String, project_id: String, collection: String) -> Self {
        Self {
            http,
            base_url,
            project_id,
            collection,
        }
    }

    fn document_url(&self, uid: &str) -> String {
        join_url(
            &self.base_url,
            &format!(
                "v1/projects/{}/databases/(default)/documents/{}/{}",
                self.project_id, self.collection, uid
            ),
        )
    }

    #[instrument(skip(self, id_token))]
    pub async fn get_user(&self, uid: &str, id_token: &SecretString) -> AppResult<Option<User>> {
        let response = self
            .http
            .get(self.document_url(uid))
            .bearer_auth(id_token.expose_secret())
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No profile document for {}", uid);
            return Ok(None);
        }

        let document: Document = read_json(response, firestore_error).await?;
        Ok(Some(user_from_fields(uid, &document.fields)))
    }

    pub async fn create_user(&self, user: &User, id_token: &SecretString) -> AppResult<User> {
        self.write_user(user, id_token, false).await
    }

    /// Like [`create_user`](Self::create_user) but fails with
    /// `ProfileNotFound` when no document exists yet.
    pub async fn update_user(&self, user: &User, id_token: &SecretString) -> AppResult<User> {
        self.write_user(user, id_token, true).await
    }

    #[instrument(skip(self, user, id_token), fields(uid = %user.id))]
    async fn write_user(
        &self,
        user: &User,
        id_token: &SecretString,
        must_exist: bool,
    ) -> AppResult<User> {
        let document = Document {
            name: None,
            fields: user_to_fields(user)?,
        };
        let mut query: Vec<(&str, &str)> = PROFILE_FIELDS
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();
        if must_exist {
            query.push(("currentDocument.exists", "true"));
        }

        let response = self
            .http
            .patch(self.document_url(user.id.as_str()))
            .bearer_auth(id_token.expose_secret())
            .query(&query)
            .json(&document)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        if must_exist && response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::ProfileNotFound);
        }

        let written: Document = read_json(response, firestore_error).await?;
        Ok(user_from_fields(user.id.as_str(), &written.fields))
    }
}
