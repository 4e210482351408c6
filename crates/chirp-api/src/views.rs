use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use chirp_db::Database;
use chirp_feed::{FeedView, policy};

/// Hands out one `FeedView` per authenticated user, created lazily on
/// the viewer's first request. Views live for the process lifetime; a
/// viewer's edit state survives across their polls.
#[derive(Clone)]
pub struct ViewRegistry {
    views: Arc<RwLock<HashMap<Uuid, Arc<FeedView>>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn view_for(&self, db: &Arc<Database>, user_id: Uuid) -> Arc<FeedView> {
        if let Some(view) = self.views.read().await.get(&user_id) {
            return view.clone();
        }

        self.views
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| FeedView::new(db.clone(), policy::author_only()))
            .clone()
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}
