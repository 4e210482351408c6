//! Feed component event names.
//!
//! Events are payload-free triggers matched by name on a per-view bus:
//! publishing one invokes that view's subscribed handlers synchronously
//! in registration order.

/// A new chirp was posted; feed views reload on this.
pub const CHIRP_CREATED: &str = "chirp-created";

/// An edited chirp was saved; closes the edit sub-view.
pub const CHIRP_UPDATED: &str = "chirp-updated";

/// The viewer abandoned an edit; closes the edit sub-view.
pub const CHIRP_EDIT_CANCELED: &str = "chirp-edit-canceled";
