use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. Referenced, not owned, by the chirps they post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

/// A short user-authored text post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub author: Author,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chirp {
    /// A chirp counts as edited once a save has moved `updated_at` off
    /// its creation time.
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }
}
