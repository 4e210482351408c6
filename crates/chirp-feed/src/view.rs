//! The per-viewer feed view: snapshot, edit state, and the component
//! operations exposed to the rendered page.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use chirp_db::Database;
use chirp_db::models::ChirpRow;
use chirp_types::events::{CHIRP_CREATED, CHIRP_EDIT_CANCELED, CHIRP_UPDATED};
use chirp_types::models::{Author, Chirp};

use crate::bus::EventBus;
use crate::policy::Policy;
use crate::render;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("not authorized")]
    Unauthorized,
    #[error("chirp not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Per-viewer state: the loaded snapshot and the chirp currently open
/// for editing, if any. At most one chirp is in edit mode per view.
#[derive(Default)]
struct ViewState {
    chirps: Vec<Chirp>,
    edit_target: Option<Uuid>,
}

pub struct FeedView {
    store: Arc<Database>,
    policy: Policy,
    state: Mutex<ViewState>,
    bus: EventBus,
}

impl FeedView {
    /// Create a view and wire its event subscriptions: `chirp-created`
    /// reloads the feed, `chirp-updated` and `chirp-edit-canceled` close
    /// the edit sub-view. The subscriptions hold a `Weak` so a view can
    /// be dropped while its bus closures still exist.
    pub fn new(store: Arc<Database>, policy: Policy) -> Arc<Self> {
        let view = Arc::new(Self {
            store,
            policy,
            state: Mutex::new(ViewState::default()),
            bus: EventBus::new(),
        });

        view.bus
            .subscribe(CHIRP_CREATED, on_event(Arc::downgrade(&view), Self::load));
        view.bus
            .subscribe(CHIRP_UPDATED, on_event(Arc::downgrade(&view), Self::end_edit));
        view.bus.subscribe(
            CHIRP_EDIT_CANCELED,
            on_event(Arc::downgrade(&view), Self::end_edit),
        );

        view
    }

    /// The view's event bus. Action handlers publish on this to drive
    /// the subscriptions above instead of calling into the view directly.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Replace the in-memory snapshot with the current store contents,
    /// newest first. Store failures propagate unmodified.
    pub fn load(&self) -> Result<(), FeedError> {
        let rows = self.store.list_chirps().map_err(FeedError::Store)?;
        let chirps: Vec<Chirp> = rows.into_iter().filter_map(row_to_chirp).collect();

        self.lock_state().chirps = chirps;
        Ok(())
    }

    /// Post a new chirp and announce it. The `chirp-created` subscription
    /// refreshes the snapshot.
    pub fn create(&self, actor: Uuid, body: &str) -> Result<Uuid, FeedError> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        self.store
            .insert_chirp(&id.to_string(), &actor.to_string(), body, &now)
            .map_err(FeedError::Store)?;

        self.bus.publish(CHIRP_CREATED);
        Ok(id)
    }

    /// Open the edit sub-view for a chirp and refresh the feed.
    pub fn begin_edit(&self, actor: Uuid, chirp_id: Uuid) -> Result<(), FeedError> {
        let chirp = self.fetch(chirp_id)?;
        if !(self.policy)(actor, &chirp) {
            return Err(FeedError::Unauthorized);
        }

        self.lock_state().edit_target = Some(chirp_id);
        self.load()
    }

    /// Close the edit sub-view and refresh the feed. Invoked through the
    /// `chirp-updated` and `chirp-edit-canceled` subscriptions.
    pub fn end_edit(&self) -> Result<(), FeedError> {
        self.lock_state().edit_target = None;
        self.load()
    }

    /// Save an edited body. Publishes `chirp-updated`, which closes the
    /// edit sub-view through its subscription.
    pub fn update(&self, actor: Uuid, chirp_id: Uuid, body: &str) -> Result<(), FeedError> {
        let chirp = self.fetch(chirp_id)?;
        if !(self.policy)(actor, &chirp) {
            return Err(FeedError::Unauthorized);
        }

        let now = Utc::now().to_rfc3339();
        if !self
            .store
            .update_chirp(&chirp_id.to_string(), body, &now)
            .map_err(FeedError::Store)?
        {
            return Err(FeedError::NotFound);
        }

        self.bus.publish(CHIRP_UPDATED);
        Ok(())
    }

    /// Delete a chirp. The injected policy decides; a denial leaves the
    /// store unchanged. Deleting an already-deleted id is `NotFound`.
    pub fn delete(&self, actor: Uuid, chirp_id: Uuid) -> Result<(), FeedError> {
        let chirp = self.fetch(chirp_id)?;
        if !(self.policy)(actor, &chirp) {
            return Err(FeedError::Unauthorized);
        }

        if !self
            .store
            .delete_chirp(&chirp_id.to_string())
            .map_err(FeedError::Store)?
        {
            return Err(FeedError::NotFound);
        }

        self.load()
    }

    pub fn edit_target(&self) -> Option<Uuid> {
        self.lock_state().edit_target
    }

    /// Render the current snapshot for `viewer`.
    pub fn render(&self, viewer: Uuid) -> String {
        let state = self.lock_state();
        render::feed(&state.chirps, state.edit_target, viewer)
    }

    fn fetch(&self, chirp_id: Uuid) -> Result<Chirp, FeedError> {
        let row = self
            .store
            .get_chirp(&chirp_id.to_string())
            .map_err(FeedError::Store)?
            .ok_or(FeedError::NotFound)?;
        row_to_chirp(row).ok_or(FeedError::NotFound)
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Adapt a view method into a bus handler. Event handlers have no caller
/// to propagate to, so store failures are logged and dropped.
fn on_event(
    view: Weak<FeedView>,
    f: fn(&FeedView) -> Result<(), FeedError>,
) -> impl Fn() + Send + Sync {
    move || {
        if let Some(view) = view.upgrade() {
            if let Err(e) = f(&view) {
                warn!("feed event handler failed: {e}");
            }
        }
    }
}

fn row_to_chirp(row: ChirpRow) -> Option<Chirp> {
    let parsed = (|| {
        let id: Uuid = row.id.parse().ok()?;
        let author_id: Uuid = row.author_id.parse().ok()?;
        let created_at = parse_timestamp(&row.created_at)?;
        let updated_at = parse_timestamp(&row.updated_at)?;
        Some(Chirp {
            id,
            author: Author {
                id: author_id,
                username: row.author_username.clone(),
            },
            body: row.body.clone(),
            created_at,
            updated_at,
        })
    })();

    if parsed.is_none() {
        warn!("Skipping corrupt chirp row '{}'", row.id);
    }
    parsed
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy;

    fn test_store() -> Arc<Database> {
        Arc::new(Database::open_in_memory().unwrap())
    }

    fn add_user(store: &Database, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        store.create_user(&id.to_string(), username, "hash").unwrap();
        id
    }

    fn add_chirp(store: &Database, author: Uuid, body: &str, secs: i64) -> Uuid {
        let id = Uuid::new_v4();
        let created = DateTime::from_timestamp(secs, 0).unwrap().to_rfc3339();
        store
            .insert_chirp(&id.to_string(), &author.to_string(), body, &created)
            .unwrap();
        id
    }

    fn test_view(store: &Arc<Database>) -> Arc<FeedView> {
        FeedView::new(store.clone(), policy::author_only())
    }

    fn loaded_ids(view: &FeedView) -> Vec<Uuid> {
        view.lock_state().chirps.iter().map(|c| c.id).collect()
    }

    #[test]
    fn load_orders_newest_first() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let a = add_chirp(&store, alice, "oldest", 1);
        let b = add_chirp(&store, alice, "middle", 2);
        let c = add_chirp(&store, alice, "newest", 3);

        let view = test_view(&store);
        view.load().unwrap();

        assert_eq!(loaded_ids(&view), vec![c, b, a]);

        let state = view.lock_state();
        for pair in state.chirps.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[test]
    fn create_reloads_through_event() {
        let store = test_store();
        let alice = add_user(&store, "alice");

        let view = test_view(&store);
        view.load().unwrap();
        assert!(loaded_ids(&view).is_empty());

        let id = view.create(alice, "hello").unwrap();
        // No explicit load(): the chirp-created subscription refreshed it
        assert_eq!(loaded_ids(&view), vec![id]);
    }

    #[test]
    fn delete_by_author_removes_from_next_load() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let id = add_chirp(&store, alice, "bye", 1);

        let view = test_view(&store);
        view.delete(alice, id).unwrap();

        view.load().unwrap();
        assert!(loaded_ids(&view).is_empty());
    }

    #[test]
    fn delete_by_non_author_is_denied_and_store_unchanged() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let mallory = add_user(&store, "mallory");
        let id = add_chirp(&store, alice, "mine", 1);

        let view = test_view(&store);
        let err = view.delete(mallory, id).unwrap_err();
        assert!(matches!(err, FeedError::Unauthorized));

        assert!(store.get_chirp(&id.to_string()).unwrap().is_some());
    }

    #[test]
    fn delete_missing_chirp_is_not_found() {
        let store = test_store();
        let alice = add_user(&store, "alice");

        let view = test_view(&store);
        let err = view.delete(alice, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, FeedError::NotFound));
    }

    #[test]
    fn edit_state_follows_events() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let id = add_chirp(&store, alice, "tweak me", 1);

        let view = test_view(&store);
        view.begin_edit(alice, id).unwrap();
        assert_eq!(view.edit_target(), Some(id));

        view.bus().publish(CHIRP_EDIT_CANCELED);
        assert_eq!(view.edit_target(), None);

        view.begin_edit(alice, id).unwrap();
        assert_eq!(view.edit_target(), Some(id));

        view.bus().publish(CHIRP_UPDATED);
        assert_eq!(view.edit_target(), None);
    }

    #[test]
    fn begin_edit_denied_for_non_author() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let mallory = add_user(&store, "mallory");
        let id = add_chirp(&store, alice, "mine", 1);

        let view = test_view(&store);
        let err = view.begin_edit(mallory, id).unwrap_err();
        assert!(matches!(err, FeedError::Unauthorized));
        assert_eq!(view.edit_target(), None);
    }

    #[test]
    fn update_saves_and_closes_edit() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let id = add_chirp(&store, alice, "draft", 1);

        let view = test_view(&store);
        view.begin_edit(alice, id).unwrap();
        view.update(alice, id, "final").unwrap();

        assert_eq!(view.edit_target(), None);
        let row = store.get_chirp(&id.to_string()).unwrap().unwrap();
        assert_eq!(row.body, "final");
        assert_ne!(row.created_at, row.updated_at);
    }

    #[test]
    fn update_by_non_author_is_denied() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let mallory = add_user(&store, "mallory");
        let id = add_chirp(&store, alice, "mine", 1);

        let view = test_view(&store);
        let err = view.update(mallory, id, "stolen").unwrap_err();
        assert!(matches!(err, FeedError::Unauthorized));

        let row = store.get_chirp(&id.to_string()).unwrap().unwrap();
        assert_eq!(row.body, "mine");
    }

    /// [A(t=1), B(t=2)] lists as [B, A]; A's author deletes A; a
    /// non-author's delete of B fails and changes nothing.
    #[test]
    fn feed_scenario() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        let a = add_chirp(&store, alice, "A", 1);
        let b = add_chirp(&store, bob, "B", 2);

        let view = test_view(&store);
        view.load().unwrap();
        assert_eq!(loaded_ids(&view), vec![b, a]);

        view.delete(alice, a).unwrap();
        assert_eq!(loaded_ids(&view), vec![b]);

        let err = view.delete(alice, b).unwrap_err();
        assert!(matches!(err, FeedError::Unauthorized));
        view.load().unwrap();
        assert_eq!(loaded_ids(&view), vec![b]);
    }

    #[test]
    fn render_reflects_viewer_identity() {
        let store = test_store();
        let alice = add_user(&store, "alice");
        let bob = add_user(&store, "bob");
        add_chirp(&store, alice, "hello world", 1);

        let view = test_view(&store);
        view.load().unwrap();

        assert!(view.render(alice).contains("chirp-actions"));
        assert!(!view.render(bob).contains("chirp-actions"));
    }
}
