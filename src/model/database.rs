use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Params, Result as SqlResult, Row};

use super::{post, session, user, user::FollowCounts, Post, Session, User};
use crate::{
    auth,
    error::{Error, Result},
};

pub struct Database {
    conn: Connection,
}

/// Build the database.
impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Database> {
        let conn = Connection::open(path.as_ref())?;
        trace!("Opened database connection to {}", path.as_ref().display());

        Database::init_db(conn)
    }

    pub fn open_in_memory() -> Result<Database> {
        let conn = Connection::open_in_memory()?;
        trace!("Opened in-memory database connection.");

        Database::init_db(conn)
    }

    fn init_db(conn: Connection) -> Result<Database> {
        trace!("Initializing database...");

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id       INTEGER PRIMARY KEY,
                name     TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                id         INTEGER PRIMARY KEY,
                poster     INTEGER NOT NULL,
                body       TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                parent     INTEGER,
                FOREIGN KEY(poster) REFERENCES users(id),
                FOREIGN KEY(parent) REFERENCES posts(id)
            )",
            (),
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS posts_created_at ON posts (created_at)",
            (),
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS posts_parent ON posts (parent)",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS likes (
                user INTEGER NOT NULL,
                post INTEGER NOT NULL,
                PRIMARY KEY (user, post),
                FOREIGN KEY(user) REFERENCES users(id),
                FOREIGN KEY(post) REFERENCES posts(id)
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS follows (
                follower INTEGER NOT NULL,
                followed INTEGER NOT NULL,
                PRIMARY KEY (follower, followed),
                FOREIGN KEY(follower) REFERENCES users(id),
                FOREIGN KEY(followed) REFERENCES users(id)
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id    INTEGER PRIMARY KEY,
                token INTEGER NOT NULL UNIQUE,
                user  INTEGER NOT NULL,
                FOREIGN KEY(user) REFERENCES users(id)
            )",
            (),
        )?;

        info!("Finished initializing database");

        Ok(Database { conn })
    }
}

/// User stuff
impl Database {
    /// Insert a new user, failing with [`Error::DuplicateUsername`] if the
    /// name is taken.
    pub fn insert_user(&self, name: &str, password: &str) -> Result<user::Id> {
        debug!("Adding user {} to database", name);

        let result = self.conn.execute(
            "INSERT INTO users (name, password) VALUES (?1, ?2)",
            (name, password),
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                debug!("User name {} is already taken", name);
                Err(Error::DuplicateUsername(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn find_user_by_id(&self, id: user::Id) -> Result<User> {
        debug!("Getting user {}", id);
        self.conn
            .query_row(
                "SELECT id, name, password FROM users WHERE id=?1",
                (id,),
                map_user,
            )
            .optional()?
            .ok_or(Error::NotFound)
    }

    pub fn find_user_by_name(&self, name: &str) -> Result<User> {
        debug!("Getting user (name: {})", name);
        self.conn
            .query_row(
                "SELECT id, name, password FROM users WHERE name=?1",
                (name,),
                map_user,
            )
            .optional()?
            .ok_or(Error::NotFound)
    }

    pub fn update_password(&self, id: user::Id, password: &str) -> Result<()> {
        debug!("Updating password record for user {}", id);
        let changed = self
            .conn
            .execute("UPDATE users SET password=?1 WHERE id=?2", (password, id))?;

        match changed {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }
}

/// Posts stuff
impl Database {
    pub fn insert_post(
        &self,
        poster: user::Id,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<post::Id> {
        debug!("Adding post by user {} to database", poster);
        self.insert_post_row(poster, None, body, created_at)
    }

    /// Insert a post answering `parent`. Fails with [`Error::NotFound`] if
    /// either the poster or the parent is missing.
    pub fn insert_reply(
        &self,
        poster: user::Id,
        parent: post::Id,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<post::Id> {
        debug!("Adding reply to post {} by user {}", parent, poster);
        self.insert_post_row(poster, Some(parent), body, created_at)
    }

    fn insert_post_row(
        &self,
        poster: user::Id,
        parent: Option<post::Id>,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<post::Id> {
        let result = self.conn.execute(
            "INSERT INTO posts (poster, body, created_at, parent) VALUES (?1, ?2, ?3, ?4)",
            (poster, body, created_at.timestamp_micros(), parent),
        );

        match result {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                debug!("Added post {} to database", id);
                Ok(id)
            }
            // The only constraints on posts are the poster and parent foreign keys
            Err(err) => Err(missing_reference(err)),
        }
    }

    pub fn get_post(&self, id: post::Id) -> Result<Post> {
        debug!("Getting post {}", id);
        self.query_posts("WHERE id=?1", (id,))?
            .pop()
            .ok_or(Error::NotFound)
    }

    /// Get posts newest first.
    /// A negative `limit` gets every post.
    pub fn list_posts_descending(&self, limit: i64) -> Result<Vec<Post>> {
        trace!("Getting posts (limit: {})", limit);
        self.query_posts(
            "ORDER BY created_at DESC, id DESC LIMIT ?1",
            (sql_limit(limit),),
        )
    }

    /// Same as [`Database::list_posts_descending`], but only posts by `poster`.
    pub fn list_posts_by_poster(&self, poster: user::Id, limit: i64) -> Result<Vec<Post>> {
        trace!("Getting posts by user {} (limit: {})", poster, limit);
        self.query_posts(
            "WHERE poster=?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
            (poster, sql_limit(limit)),
        )
    }

    /// Replies to `parent`, most liked first, then oldest first.
    pub fn list_replies(&self, parent: post::Id) -> Result<Vec<Post>> {
        trace!("Getting replies to post {}", parent);
        self.query_posts(
            "WHERE parent=?1 ORDER BY like_count DESC, created_at ASC, id ASC",
            (parent,),
        )
    }

    /// Posts `user_id` has liked, newest first.
    pub fn list_posts_liked_by(&self, user_id: user::Id, limit: i64) -> Result<Vec<Post>> {
        trace!("Getting posts liked by user {} (limit: {})", user_id, limit);
        self.query_posts(
            "WHERE id IN (SELECT post FROM likes WHERE user=?1)
            ORDER BY created_at DESC, id DESC LIMIT ?2",
            (user_id, sql_limit(limit)),
        )
    }

    /// Run a post query. `filter` is everything after the `FROM` clause.
    fn query_posts(&self, filter: &str, params: impl Params) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT id, poster, body, created_at, parent,
                (SELECT COUNT(*) FROM likes WHERE likes.post = posts.id) AS like_count
            FROM posts {}",
            filter
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let posts = stmt
            .query_map(params, map_post)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(posts)
    }
}

/// Likes stuff
impl Database {
    /// Liking a post twice is the same as liking it once.
    pub fn like_post(&self, user_id: user::Id, post_id: post::Id) -> Result<()> {
        debug!("User {} likes post {}", user_id, post_id);
        self.conn
            .execute(
                "INSERT INTO likes (user, post) VALUES (?1, ?2)
                ON CONFLICT (user, post) DO NOTHING",
                (user_id, post_id),
            )
            .map_err(missing_reference)?;
        Ok(())
    }

    pub fn unlike_post(&self, user_id: user::Id, post_id: post::Id) -> Result<()> {
        debug!("User {} no longer likes post {}", user_id, post_id);
        self.conn.execute(
            "DELETE FROM likes WHERE user=?1 AND post=?2",
            (user_id, post_id),
        )?;
        Ok(())
    }

    pub fn has_liked(&self, user_id: user::Id, post_id: post::Id) -> Result<bool> {
        let liked = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user=?1 AND post=?2)",
            (user_id, post_id),
            |row| row.get(0),
        )?;
        Ok(liked)
    }
}

/// Follows stuff
impl Database {
    /// Following someone twice is the same as following them once.
    pub fn follow_user(&self, follower: user::Id, followed: user::Id) -> Result<()> {
        debug!("User {} follows user {}", follower, followed);
        self.conn
            .execute(
                "INSERT INTO follows (follower, followed) VALUES (?1, ?2)
                ON CONFLICT (follower, followed) DO NOTHING",
                (follower, followed),
            )
            .map_err(missing_reference)?;
        Ok(())
    }

    pub fn unfollow_user(&self, follower: user::Id, followed: user::Id) -> Result<()> {
        debug!("User {} unfollows user {}", follower, followed);
        self.conn.execute(
            "DELETE FROM follows WHERE follower=?1 AND followed=?2",
            (follower, followed),
        )?;
        Ok(())
    }

    pub fn is_following(&self, follower: user::Id, followed: user::Id) -> Result<bool> {
        let following = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower=?1 AND followed=?2)",
            (follower, followed),
            |row| row.get(0),
        )?;
        Ok(following)
    }

    pub fn count_follows(&self, user_id: user::Id) -> Result<FollowCounts> {
        let counts = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM follows WHERE follower=?1),
                (SELECT COUNT(*) FROM follows WHERE followed=?1)",
            (user_id,),
            |row| {
                Ok(FollowCounts {
                    following: row.get(0)?,
                    followers: row.get(1)?,
                })
            },
        )?;
        Ok(counts)
    }
}

/// Session stuff
impl Database {
    pub fn start_session(&self, user_id: user::Id) -> Result<Session> {
        let token = auth::token::generate_token();
        self.conn.execute(
            "INSERT INTO sessions (token, user) VALUES (?1, ?2)",
            (token, user_id),
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Added session {} for user {}", id, user_id);

        Ok(Session { id, token, user_id })
    }

    pub fn get_session_from_token(&self, token: session::Token) -> Result<Session> {
        trace!("Getting session from token");
        self.conn
            .query_row(
                "SELECT id, token, user FROM sessions WHERE token=?1",
                (token,),
                |row| {
                    Ok(Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        user_id: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::NotFound)
    }

    pub fn delete_session(&self, id: session::Id) -> Result<()> {
        debug!("Deleting session {}", id);
        self.conn
            .execute("DELETE FROM sessions WHERE id=?1", (id,))?;
        Ok(())
    }
}

impl Database {
    /// Run `f` in a transaction. Nothing `f` wrote is kept if it fails.
    pub fn atomically<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let transaction = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        transaction.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
impl Database {
    pub(crate) fn execute_unchecked(&self, sql: &str) {
        self.conn.execute_batch(sql).unwrap();
    }
}

/// SQLite treats any negative `LIMIT` as "no limit".
fn sql_limit(limit: i64) -> i64 {
    if limit < 0 {
        -1
    } else {
        limit
    }
}

fn map_user(row: &Row) -> SqlResult<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        password: row.get(2)?,
    })
}

fn map_post(row: &Row) -> SqlResult<Post> {
    let micros: i64 = row.get(3)?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, micros))?;

    Ok(Post {
        id: row.get(0)?,
        poster: row.get(1)?,
        body: row.get(2)?,
        created_at,
        parent: row.get(4)?,
        likes: row.get(5)?,
    })
}

/// Foreign key failures mean something referenced doesn't exist.
fn missing_reference(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Error::NotFound
        }
        err => err.into(),
    }
}
