//! Profile lookups used to decorate thread listings.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

/// Name shown when the directory has no profile for a user.
pub const PLACEHOLDER_NAME: &str = "Unknown user";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Profile {
    #[schema(example = "Dr. Ada Byron")]
    pub display_name: String,
    /// Kind of account, e.g. `patient` or `business`.
    #[schema(example = "business")]
    pub entity_type: String,
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn placeholder() -> Self {
        Self {
            display_name: PLACEHOLDER_NAME.to_string(),
            entity_type: "unknown".to_string(),
            avatar_url: None,
        }
    }
}

/// Batch profile lookup against the external directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Profiles for the requested users. Unknown users are simply absent.
    async fn lookup(&self, user_ids: &[i32]) -> anyhow::Result<HashMap<i32, Profile>>;
}

/// Directory that knows nobody; every user renders as the placeholder.
pub struct NullDirectory;

#[async_trait]
impl Directory for NullDirectory {
    async fn lookup(&self, _user_ids: &[i32]) -> anyhow::Result<HashMap<i32, Profile>> {
        Ok(HashMap::new())
    }
}

/// Resolve a profile for every id, never failing.
///
/// Lookup errors are logged and degrade to the placeholder profile.
pub async fn resolve_profiles(directory: &dyn Directory, user_ids: &[i32]) -> HashMap<i32, Profile> {
    let mut found = match directory.lookup(user_ids).await {
        Ok(found) => found,
        Err(e) => {
            warn!(users = user_ids.len(), "Directory lookup failed: {:#}", e);
            HashMap::new()
        }
    };

    user_ids
        .iter()
        .map(|id| (*id, found.remove(id).unwrap_or_else(Profile::placeholder)))
        .collect()
}
