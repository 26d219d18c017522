use chrono::{DateTime, Utc};
use log::trace;

use crate::{
    error::Result,
    model::{post, Database, Post},
    timestamps,
};

/// A post ready to be shown: who wrote it, what they wrote and when.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FeedEntry {
    pub id: post::Id,
    pub username: String,
    pub body: String,
    pub timestamp: String,
    pub parent: Option<post::Id>,
    pub likes: i64,
}

/// One post with the post it answers and the answers to it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Thread {
    pub parent: Option<FeedEntry>,
    pub post: FeedEntry,
    pub replies: Vec<FeedEntry>,
}

/// Get the most recent posts, newest first.
/// A negative `limit` gets every post.
///
/// Fails with [`NotFound`](crate::error::Error::NotFound) if a post points
/// at a user that no longer exists.
pub fn get_posts(database: &Database, limit: i64, now: DateTime<Utc>) -> Result<Vec<FeedEntry>> {
    trace!("Assembling feed (limit: {})", limit);

    let posts = database.list_posts_descending(limit)?;
    assemble(database, posts, now)
}

/// Like [`get_posts`], but only posts by the user called `username`.
pub fn get_user_posts(
    database: &Database,
    username: &str,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<FeedEntry>> {
    trace!("Assembling feed for {} (limit: {})", username, limit);

    let user = database.find_user_by_name(username)?;
    let posts = database.list_posts_by_poster(user.id, limit)?;
    assemble(database, posts, now)
}

/// Posts the user called `username` has liked, newest first.
pub fn get_liked_posts(
    database: &Database,
    username: &str,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<FeedEntry>> {
    trace!("Assembling likes of {} (limit: {})", username, limit);

    let user = database.find_user_by_name(username)?;
    let posts = database.list_posts_liked_by(user.id, limit)?;
    assemble(database, posts, now)
}

pub fn get_thread(database: &Database, id: post::Id, now: DateTime<Utc>) -> Result<Thread> {
    trace!("Assembling thread for post {}", id);

    let post = database.get_post(id)?;
    let parent = match post.parent {
        Some(parent) => Some(entry(database, database.get_post(parent)?, now)?),
        None => None,
    };
    let replies = assemble(database, database.list_replies(id)?, now)?;

    Ok(Thread {
        parent,
        post: entry(database, post, now)?,
        replies,
    })
}

fn assemble(database: &Database, posts: Vec<Post>, now: DateTime<Utc>) -> Result<Vec<FeedEntry>> {
    posts
        .into_iter()
        .map(|post| entry(database, post, now))
        .collect()
}

fn entry(database: &Database, post: Post, now: DateTime<Utc>) -> Result<FeedEntry> {
    let poster = database.find_user_by_id(post.poster)?;
    Ok(FeedEntry {
        id: post.id,
        username: poster.name,
        body: post.body,
        timestamp: timestamps::format_timestamp(post.created_at, now),
        parent: post.parent,
        likes: post.likes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let alice = db.insert_user("alice", "pw").unwrap();
        let bob = db.insert_user("bob", "pw").unwrap();

        for minutes in 0..5 {
            let poster = if minutes % 2 == 0 { alice } else { bob };
            db.insert_post(
                poster,
                &format!("post {}", minutes),
                now() - Duration::minutes(10 - minutes),
            )
            .unwrap();
        }

        db
    }

    #[test]
    fn all_posts_newest_first() {
        let db = seeded();
        let feed = get_posts(&db, -1, now()).unwrap();

        let bodies: Vec<_> = feed.iter().map(|entry| entry.body.as_str()).collect();
        assert_eq!(bodies, ["post 4", "post 3", "post 2", "post 1", "post 0"]);

        let posts = db.list_posts_descending(-1).unwrap();
        assert!(posts
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn limit_takes_the_head() {
        let db = seeded();
        let all = get_posts(&db, -1, now()).unwrap();
        let three = get_posts(&db, 3, now()).unwrap();

        assert_eq!(three.len(), 3);
        assert_eq!(three[..], all[..3]);
        assert_eq!(get_posts(&db, 100, now()).unwrap().len(), 5);
        assert!(get_posts(&db, 0, now()).unwrap().is_empty());
    }

    #[test]
    fn entries_carry_username_and_formatted_time() {
        let db = seeded();
        let newest = get_posts(&db, 1, now()).unwrap().remove(0);

        assert_eq!(
            newest,
            FeedEntry {
                id: 5,
                username: "alice".into(),
                body: "post 4".into(),
                timestamp: "11:54:00 today".into(),
                parent: None,
                likes: 0,
            }
        );
    }

    #[test]
    fn empty_store_gives_empty_feed() {
        let db = Database::open_in_memory().unwrap();
        assert!(get_posts(&db, -1, now()).unwrap().is_empty());
    }

    #[test]
    fn user_feed_only_has_their_posts() {
        let db = seeded();
        let feed = get_user_posts(&db, "bob", -1, now()).unwrap();

        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|entry| entry.username == "bob"));
        assert!(matches!(
            get_user_posts(&db, "carol", -1, now()),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn dangling_poster_is_not_found() {
        let db = seeded();
        db.execute_unchecked(
            "PRAGMA foreign_keys = OFF;
            INSERT INTO posts (poster, body, created_at) VALUES (999, 'ghost', 0);",
        );

        assert!(matches!(get_posts(&db, -1, now()), Err(Error::NotFound)));
    }

    #[test]
    fn thread_has_parent_and_replies() {
        let db = seeded();
        let alice = db.find_user_by_name("alice").unwrap().id;
        let bob = db.find_user_by_name("bob").unwrap().id;

        let answer = db.insert_reply(bob, 1, "re: post 0", now()).unwrap();
        db.insert_reply(alice, answer, "re: re", now()).unwrap();
        db.like_post(alice, answer).unwrap();

        let thread = get_thread(&db, answer, now()).unwrap();
        assert_eq!(thread.post.body, "re: post 0");
        assert_eq!(thread.post.parent, Some(1));
        assert_eq!(thread.post.likes, 1);
        assert_eq!(thread.parent.unwrap().body, "post 0");
        assert_eq!(thread.replies.len(), 1);
        assert_eq!(thread.replies[0].username, "alice");

        let top = get_thread(&db, 1, now()).unwrap();
        assert!(top.parent.is_none());
        assert_eq!(top.replies[0].id, answer);

        assert!(matches!(get_thread(&db, 404, now()), Err(Error::NotFound)));
    }

    #[test]
    fn liked_posts_belong_to_the_liker() {
        let db = seeded();
        let bob = db.find_user_by_name("bob").unwrap().id;
        db.like_post(bob, 1).unwrap();

        let liked = get_liked_posts(&db, "bob", -1, now()).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].body, "post 0");
        assert_eq!(liked[0].username, "alice");
        assert_eq!(liked[0].likes, 1);

        assert!(get_liked_posts(&db, "alice", -1, now()).unwrap().is_empty());
        assert!(matches!(
            get_liked_posts(&db, "carol", -1, now()),
            Err(Error::NotFound)
        ));
    }
}
