use serde::{Deserialize, Serialize};

use crate::db::models::Document;

/// A signed-in site user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Unique user identifier.
    pub user_id: String,
    pub username: String,
    /// Group memberships, matched against a document's restricted groups.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

/// The caller of a facets operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum User {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl User {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, User::Authenticated(_))
    }

    /// Whether this user may see `doc`.
    ///
    /// Unrestricted documents are public. Restricted ones are shown to
    /// superusers and to members of at least one of the listed groups.
    pub fn can_view(&self, doc: &Document) -> bool {
        if doc.restricted_to_groups.is_empty() {
            return true;
        }
        match self {
            User::Anonymous => false,
            User::Authenticated(user) => {
                user.is_superuser
                    || user
                        .groups
                        .iter()
                        .any(|g| doc.restricted_to_groups.contains(g))
            }
        }
    }
}

impl From<AuthenticatedUser> for User {
    fn from(user: AuthenticatedUser) -> Self {
        User::Authenticated(user)
    }
}
