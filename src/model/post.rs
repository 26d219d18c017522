use chrono::{DateTime, Utc};

use super::user;

pub type Id = i64;

/// Longest body a post may carry, in characters.
pub const MAX_BODY_CHARS: usize = 512;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub id: Id,
    pub poster: user::Id,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// The post this one replies to.
    pub parent: Option<Id>,
    pub likes: i64,
}

#[derive(Debug, serde::Deserialize)]
/// Basically just a [`Post`] without an id, poster or time.
pub struct SendPost {
    pub body: String,
}
