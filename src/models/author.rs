use serde::Serialize;

use super::profile::Profile;

/// Author of a post or comment as resolved at fetch time.
///
/// Joined reads may come back without a profile row (deleted account, missing
/// join); that case is explicit here so callers never coalesce nulls
/// themselves.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Author {
    Profile {
        username: String,
        display_name: Option<String>,
        avatar_url: Option<String>,
    },
    Missing,
}

impl Author {
    /// Build from the nullable columns of a left join on `profiles`.
    pub fn from_joined(
        username: Option<String>,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        match username {
            Some(username) => Author::Profile {
                username,
                display_name: display_name.filter(|d| !d.trim().is_empty()),
                avatar_url,
            },
            None => Author::Missing,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Author::Profile { username, .. } => username,
            Author::Missing => "unknown",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Author::Profile {
                display_name: Some(name),
                ..
            } => name,
            Author::Profile { username, .. } => username,
            Author::Missing => "Unknown User",
        }
    }

    pub fn avatar_url(&self) -> Option<&str> {
        match self {
            Author::Profile { avatar_url, .. } => avatar_url.as_deref(),
            Author::Missing => None,
        }
    }

    /// Single uppercase letter for the avatar fallback.
    pub fn initial(&self) -> String {
        self.username()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }
}

impl From<&Profile> for Author {
    fn from(p: &Profile) -> Self {
        Author::from_joined(
            Some(p.username.clone()),
            p.display_name.clone(),
            p.avatar_url.clone(),
        )
    }
}

impl From<Option<&Profile>> for Author {
    fn from(p: Option<&Profile>) -> Self {
        p.map(Author::from).unwrap_or(Author::Missing)
    }
}
