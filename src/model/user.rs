pub type Id = i64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub password: String,
}

#[derive(Clone, serde::Deserialize)]
pub struct PartialUser {
    pub name: String,
    /// The (**unhashed**) password
    pub password: String,
}

impl core::fmt::Debug for PartialUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't print the password
        f.debug_struct("PartialUser")
            .field("name", &self.name)
            .finish()
    }
}

/// How many users someone follows, and how many follow them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FollowCounts {
    pub following: i64,
    pub followers: i64,
}
