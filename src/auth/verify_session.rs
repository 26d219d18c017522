use log::{debug, error};

use crate::{
    error::Error as DbError,
    model::{session::Token, Database, Session},
};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    SessionNotFound,
    DatabaseError,
}

pub fn verify_session(token: Token, database: &Database) -> Result<Session, Error> {
    // Get and verify session
    match database.get_session_from_token(token) {
        Ok(session) => Ok(session),
        Err(DbError::NotFound) => {
            debug!("Session {} not found in database", token);
            Err(Error::SessionNotFound)
        }
        Err(err) => {
            error!("Failed to get session from database: {}", err);
            Err(Error::DatabaseError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_token_is_not_found() {
        let database = Database::open_in_memory().unwrap();
        assert_eq!(verify_session(42, &database), Err(Error::SessionNotFound));
    }

    #[test]
    fn started_session_verifies() {
        let database = Database::open_in_memory().unwrap();
        let user = database.insert_user("alice", "record").unwrap();
        let session = database.start_session(user).unwrap();

        let found = verify_session(session.token, &database).unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, user);
    }
}
