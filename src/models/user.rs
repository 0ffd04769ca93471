//! User model, JWT claims and permission checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Named grants a user may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Librarian capability: renew loans, see all loans, edit the catalog
    CanMarkReturned,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "can_mark_returned",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "can_mark_returned" | "catalog.can_mark_returned" => Ok(Permission::CanMarkReturned),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: i32,
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password: row.password,
            first_name: row.first_name,
            last_name: row.last_name,
            // Unknown grants in the table are ignored rather than failing the login
            permissions: row
                .permissions
                .iter()
                .filter_map(|p| p.parse().ok())
                .collect(),
            created_at: row.created_at,
        }
    }
}

/// Full user model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn short(&self) -> UserShort {
        UserShort {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Short user representation, used for borrowers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub username: String,
}

/// Create user input (seeding and administration)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    /// Already hashed with argon2
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub permissions: Vec<Permission>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub permissions: Vec<Permission>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Outcome of a capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

/// The identity acting on a request
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    User(UserClaims),
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User(_))
    }

    pub fn claims(&self) -> Option<&UserClaims> {
        match self {
            Principal::Anonymous => None,
            Principal::User(claims) => Some(claims),
        }
    }

    /// Does this principal hold `permission`? Anonymous principals hold nothing.
    pub fn check(&self, permission: Permission) -> Access {
        match self {
            Principal::User(claims) if claims.has_permission(permission) => Access::Allowed,
            _ => Access::Denied,
        }
    }

    /// Require an authenticated principal
    pub fn require_login(&self) -> Result<&UserClaims, AppError> {
        self.claims()
            .ok_or_else(|| AppError::Authentication("Login required".to_string()))
    }

    /// Require an authenticated principal holding `permission`.
    ///
    /// Anonymous callers get an authentication error, authenticated ones
    /// without the grant get an authorization error.
    pub fn require(&self, permission: Permission) -> Result<&UserClaims, AppError> {
        let claims = self.require_login()?;
        match self.check(permission) {
            Access::Allowed => Ok(claims),
            Access::Denied => Err(AppError::Authorization(format!(
                "Permission '{}' required",
                permission
            ))),
        }
    }
}
