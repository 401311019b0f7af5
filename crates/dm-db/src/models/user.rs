//! User database model (identity provider's table, read-only here)

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub name: String,
    pub profile_pic: Option<String>,
    pub role: String,
}
