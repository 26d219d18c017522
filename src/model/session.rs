use super::user;

pub type Id = i64;
pub type Token = i64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: Id,
    pub token: Token,
    pub user_id: user::Id,
}
