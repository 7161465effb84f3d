//! Database models

use serde::{Deserialize, Deserializer};

/// Account identifier; the principal carried in access tokens
pub type UserId = i64;

/// User account row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub industry: String,
    pub company_address: String,
    pub zip_code: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub logo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields needed to insert a user; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub industry: String,
    pub company_address: String,
    pub zip_code: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub logo: Option<String>,
}

/// Partial profile update
///
/// `None` leaves a column untouched. For `logo`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_address: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub logo: Option<Option<String>>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self == &UserUpdate::default()
    }
}

/// Company fields of a profile; converts into an update that touches nothing else
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdate {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_address: Option<String>,
    pub zip_code: Option<String>,
}

impl From<CompanyUpdate> for UserUpdate {
    fn from(company: CompanyUpdate) -> Self {
        UserUpdate {
            company_name: company.company_name,
            industry: company.industry,
            company_address: company.company_address,
            zip_code: company.zip_code,
            ..Default::default()
        }
    }
}

// A key that is present deserializes to Some, even when its value is null
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
