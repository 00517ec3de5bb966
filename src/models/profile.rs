use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub is_data_input: bool,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutually exclusive view roles. An account may carry both flags; the
/// resolved role is what routing decisions use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    DataInput,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::DataInput => "data_input",
            Role::User => "user",
        }
    }

    /// Landing path for the role's view branch.
    pub fn landing(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::DataInput => "/data-input",
            Role::User => "/dashboard",
        }
    }
}

/// Admin wins over data_input wins over plain user. The flags are
/// independent booleans in storage, so overlap must resolve here and
/// nowhere else.
pub fn resolve_role(is_admin: bool, is_data_input: bool) -> Role {
    if is_admin {
        Role::Admin
    } else if is_data_input {
        Role::DataInput
    } else {
        Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_flag_wins_over_data_input() {
        assert_eq!(resolve_role(true, true), Role::Admin);
        assert_eq!(resolve_role(true, false), Role::Admin);
    }

    #[test]
    fn data_input_wins_over_plain_user() {
        assert_eq!(resolve_role(false, true), Role::DataInput);
        assert_eq!(resolve_role(false, false), Role::User);
    }

    #[test]
    fn landing_paths_are_distinct() {
        assert_eq!(Role::Admin.landing(), "/admin");
        assert_eq!(Role::DataInput.landing(), "/data-input");
        assert_eq!(Role::User.landing(), "/dashboard");
    }
}
