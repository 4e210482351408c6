//! Authorization predicates, injected into the feed view rather than
//! resolved implicitly.

use std::sync::Arc;

use chirp_types::models::Chirp;
use uuid::Uuid;

/// May `actor` edit or delete `chirp`?
pub type Policy = Arc<dyn Fn(Uuid, &Chirp) -> bool + Send + Sync>;

/// Only the chirp's author may act on it.
pub fn author_only() -> Policy {
    Arc::new(|actor, chirp| chirp.author.id == actor)
}
