//! Authentication request/response models

use crate::db::models::{NewUser, User, UserId};
use serde::{Deserialize, Serialize};

/// Register request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub industry: String,
    pub company_address: String,
    pub zip_code: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub logo: Option<String>,
}

impl RegisterRequest {
    /// Account row for this request, with the password already hashed
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            first_name: self.first_name,
            last_name: self.last_name,
            company_name: self.company_name,
            industry: self.industry,
            company_address: self.company_address,
            zip_code: self.zip_code,
            email: self.email,
            phone: self.phone,
            password_hash,
            logo: self.logo.filter(|logo| !logo.is_empty()),
        }
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Change password request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

/// Public view of an account (without password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub industry: String,
    pub company_address: String,
    pub zip_code: String,
    pub email: String,
    pub phone: String,
    pub logo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            company_name: user.company_name,
            industry: user.industry,
            company_address: user.company_address,
            zip_code: user.zip_code,
            email: user.email,
            phone: user.phone,
            logo: user.logo,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Register / login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

/// Profile update response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserActionResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
