//! Blog content relay.
//!
//! # Data Flow
//! ```text
//! GET /api/posts?limit&page       → upstream::content::list_posts
//! GET /api/posts/{slug}           → slug check → upstream::content::post_by_slug
//!     → content budget → retries → body relayed unchanged
//! ```
//!
//! Without a content key the routes answer 404.

pub mod handlers;

pub use handlers::{list_posts, post_by_slug, PostsQuery};
