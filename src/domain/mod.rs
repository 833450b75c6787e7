pub mod feed;
pub mod post;
pub mod user;

pub use feed::Feed;
pub use post::{NewPost, Post};
pub use user::{NewUser, User};
