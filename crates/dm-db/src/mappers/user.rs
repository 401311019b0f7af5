//! User directory model -> profile mapper

use dm_core::entities::{UserProfile, UserRole};
use dm_core::error::DomainError;
use dm_core::value_objects::Snowflake;

use crate::models::UserModel;

impl TryFrom<UserModel> for UserProfile {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            id: Snowflake::new(model.id),
            display_name: model.name,
            avatar_ref: model.profile_pic,
            role: model.role.parse::<UserRole>()?,
        })
    }
}
