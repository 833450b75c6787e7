use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{QuireError, Result};
use crate::domain::{Feed, NewPost, NewUser, Post, User};
use crate::store::Store;

const USER_COLUMNS: &str = "id, email, password_hash, is_admin, created_at";
const POST_COLUMNS: &str = "id, title, content, source, published_at, created_at";
const FEED_COLUMNS: &str = "id, url, enabled, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            QuireError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn created_at(row: &Row, idx: usize) -> DateTime<Utc> {
        row.get::<_, String>(idx)
            .ok()
            .and_then(|s| Self::parse_datetime(&s))
            .unwrap_or_else(Utc::now)
    }

    fn user_from_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            is_admin: row.get::<_, i32>(3)? != 0,
            created_at: Self::created_at(row, 4),
        })
    }

    fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            source: row.get(3)?,
            published_at: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| Self::parse_datetime(&s)),
            created_at: Self::created_at(row, 5),
        })
    }

    fn feed_from_row(row: &Row) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            url: row.get(1)?,
            enabled: row.get::<_, i32>(2)? != 0,
            created_at: Self::created_at(row, 3),
        })
    }

    fn ensure_changed(changed: usize, what: impl FnOnce() -> String) -> Result<()> {
        if changed == 0 {
            return Err(QuireError::NotFound(what()));
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn add_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.conn()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO users (email, password_hash, is_admin, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.email,
                user.password_hash,
                user.is_admin as i32,
                created_at.to_rfc3339()
            ],
        )
        .map_err(|e| QuireError::from_insert(e, format!("user {}", user.email)))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_admin: user.is_admin,
            created_at,
        })
    }

    fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"))?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn count_admins(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn add_post(&self, post: &NewPost) -> Result<Post> {
        let conn = self.conn()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO posts (title, content, source, published_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                post.title,
                post.content,
                post.source,
                post.published_at.map(|dt| dt.to_rfc3339()),
                created_at.to_rfc3339()
            ],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            title: post.title.clone(),
            content: post.content.clone(),
            source: post.source.clone(),
            published_at: post.published_at,
            created_at,
        })
    }

    fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.conn()?;
        let post = conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                Self::post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY id DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let posts = stmt
            .query_map(params![limit, offset], Self::post_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    fn update_post(&self, id: i64, title: &str, content: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE posts SET title = ?1, content = ?2 WHERE id = ?3",
            params![title, content, id],
        )?;
        Self::ensure_changed(changed, || format!("post {id}"))
    }

    fn delete_post(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Self::ensure_changed(changed, || format!("post {id}"))
    }

    fn add_feed(&self, url: &str) -> Result<Feed> {
        let conn = self.conn()?;
        let feed = Feed::new(url.to_string());

        conn.execute(
            "INSERT INTO feeds (url, enabled, created_at) VALUES (?1, 1, ?2)",
            params![feed.url, feed.created_at.to_rfc3339()],
        )
        .map_err(|e| QuireError::from_insert(e, format!("feed {url}")))?;

        Ok(Feed {
            id: conn.last_insert_rowid(),
            ..feed
        })
    }

    fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let conn = self.conn()?;
        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?1"),
                params![id],
                Self::feed_from_row,
            )
            .optional()?;
        Ok(feed)
    }

    fn list_enabled_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE enabled = 1 ORDER BY id DESC"
        ))?;
        let feeds = stmt
            .query_map([], Self::feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feeds)
    }

    fn set_feed_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE feeds SET enabled = ?1 WHERE id = ?2",
            params![enabled as i32, id],
        )?;
        Self::ensure_changed(changed, || format!("feed {id}"))
    }

    fn delete_feed(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM feeds WHERE id = ?1", params![id])?;
        Self::ensure_changed(changed, || format!("feed {id}"))
    }
}
