pub mod bus;
pub mod policy;
pub mod render;
pub mod view;

pub use bus::EventBus;
pub use view::{FeedError, FeedView};
