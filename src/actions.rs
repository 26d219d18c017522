use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::{
    auth::hash,
    error::{Error, Field, Result},
    model::{post, user, Database},
};

/// Create an account and return its id.
///
/// Surrounding whitespace is not part of a username.
pub fn register(
    database: &Database,
    username: &str,
    password: &str,
    max_iterations: u32,
) -> Result<user::Id> {
    let username = username.trim();
    require(username, Field::Username)?;
    require(password, Field::Password)?;

    let encoded = hash::encode_password(password, max_iterations);
    let id = database.insert_user(username, &encoded.record)?;

    info!("Registered user {} ({})", username, id);
    Ok(id)
}

/// Check a user's password and return their id.
///
/// Every successful login re-encodes the password with a fresh iteration
/// count and overwrites the stored record.
pub fn login(
    database: &Database,
    username: &str,
    password: &str,
    max_iterations: u32,
) -> Result<user::Id> {
    let username = username.trim();
    require(username, Field::Username)?;
    require(password, Field::Password)?;

    let user = database.find_user_by_name(username)?;

    if !hash::validate_password(password, &user.password, max_iterations) {
        debug!("Password incorrect for user: {}", user.name);
        return Err(Error::InvalidCredential);
    }

    let encoded = hash::encode_password(password, max_iterations);
    database.update_password(user.id, &encoded.record)?;

    debug!("Logged in user {}", user.name);
    Ok(user.id)
}

/// Publish a post as `user_id`.
pub fn post(
    database: &Database,
    user_id: user::Id,
    body: &str,
    now: DateTime<Utc>,
) -> Result<post::Id> {
    check_body(body)?;
    database.insert_post(user_id, body, now)
}

/// Publish a post answering `parent`.
pub fn reply(
    database: &Database,
    user_id: user::Id,
    parent: post::Id,
    body: &str,
    now: DateTime<Utc>,
) -> Result<post::Id> {
    check_body(body)?;
    database.insert_reply(user_id, parent, body, now)
}

/// Like `post_id`, or take the like back if it is already there.
/// Returns whether the post is liked afterwards.
pub fn toggle_like(database: &Database, user_id: user::Id, post_id: post::Id) -> Result<bool> {
    let post = database.get_post(post_id)?;
    if post.poster == user_id {
        return Err(Error::Forbidden("you cannot like your own post"));
    }

    if database.has_liked(user_id, post_id)? {
        database.unlike_post(user_id, post_id)?;
        Ok(false)
    } else {
        database.like_post(user_id, post_id)?;
        Ok(true)
    }
}

/// Follow the user called `name`.
pub fn follow(database: &Database, follower: user::Id, name: &str) -> Result<()> {
    let followed = followable(database, follower, name)?;
    database.follow_user(follower, followed)
}

/// Stop following the user called `name`.
pub fn unfollow(database: &Database, follower: user::Id, name: &str) -> Result<()> {
    let followed = followable(database, follower, name)?;
    database.unfollow_user(follower, followed)
}

fn followable(database: &Database, follower: user::Id, name: &str) -> Result<user::Id> {
    let followed = database.find_user_by_name(name)?;
    if followed.id == follower {
        return Err(Error::Forbidden("you cannot follow yourself"));
    }
    Ok(followed.id)
}

fn check_body(body: &str) -> Result<()> {
    require(body, Field::Body)?;
    if body.chars().count() > post::MAX_BODY_CHARS {
        return Err(Error::TooLong {
            max: post::MAX_BODY_CHARS,
        });
    }
    Ok(())
}

fn require(value: &str, field: Field) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::EmptyInput(field));
    }
    Ok(())
}
