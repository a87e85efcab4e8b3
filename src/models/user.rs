use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::str_enum;
use crate::database::Database;

str_enum!(Role, "role" {
    Admin => "admin",
    User => "user",
});

impl Role {
    /// Set-membership predicate used by the authorization layer.
    pub fn is_member(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

/// Public user record. The password hash never appears here; reads that need
/// it go through [`UserCredentials`].
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User row including the stored password hash, for credential verification
/// only. Deliberately not serializable.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserCredentials {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    /// Already hashed by the caller; the store never sees a plaintext password.
    pub password_hash: String,
    pub role: Role,
}

const COLUMNS: &str = "id, username, email, role, created_at, updated_at";
const COLUMNS_WITH_PASSWORD: &str = "id, username, email, password, role, created_at, updated_at";

pub struct UserStore<'a> {
    db: &'a Database,
}

impl<'a> UserStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            COLUMNS_WITH_PASSWORD
        ))
        .bind(email)
        .fetch_optional(self.db.pool())
        .await
    }

    /// Duplicate pre-check for registration.
    pub async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $2",
            COLUMNS
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(self.db.pool())
        .await
    }

    pub async fn create(&self, data: UserCreate) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password, role) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        ))
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role.as_str())
        .fetch_one(self.db.pool())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_membership() {
        assert!(Role::Admin.is_member(&[Role::Admin]));
        assert!(!Role::User.is_member(&[Role::Admin]));
        assert!(Role::User.is_member(&[Role::Admin, Role::User]));
    }

    #[test]
    fn user_serialization_has_no_password_field() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["username"], "alice");
        assert!(value.get("createdAt").is_some());
    }
}
