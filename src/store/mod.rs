pub mod sqlite;

use crate::app::Result;
use crate::domain::{Feed, NewPost, NewUser, Post, User};

pub use sqlite::SqliteStore;

/// Persistence collaborator shared by the HTTP handlers and the ingestion
/// pipeline. Implementations provide their own concurrency safety.
pub trait Store {
    // User operations
    fn add_user(&self, user: &NewUser) -> Result<User>;
    fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn count_admins(&self) -> Result<i64>;

    // Post operations
    fn add_post(&self, post: &NewPost) -> Result<Post>;
    fn get_post(&self, id: i64) -> Result<Option<Post>>;
    fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>>;
    fn update_post(&self, id: i64, title: &str, content: &str) -> Result<()>;
    fn delete_post(&self, id: i64) -> Result<()>;

    // Feed operations
    fn add_feed(&self, url: &str) -> Result<Feed>;
    fn get_feed(&self, id: i64) -> Result<Option<Feed>>;
    fn list_enabled_feeds(&self) -> Result<Vec<Feed>>;
    fn set_feed_enabled(&self, id: i64, enabled: bool) -> Result<()>;
    fn delete_feed(&self, id: i64) -> Result<()>;
}
