use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The role a member plays in the cluster or for a database.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Role {
    Leader,
    Follower,
    ReadReplica,

    /// The only member of a non-clustered database.
    Single,

    /// A role this crate does not interpret; the reported text is kept so that
    /// a change of it is still noticed.
    Other(String),
}

impl Default for Role {
    fn default() -> Self {
        Role::Other(String::new())
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = match s.trim().to_ascii_uppercase().as_str() {
            "LEADER" => Role::Leader,
            "FOLLOWER" => Role::Follower,
            "READ_REPLICA" | "READ-REPLICA" | "READREPLICA" => Role::ReadReplica,
            "SINGLE" | "STANDALONE" => Role::Single,
            _ => Role::Other(s.to_string()),
        };
        Ok(role)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(r) => r,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => write!(f, "LEADER"),
            Role::Follower => write!(f, "FOLLOWER"),
            Role::ReadReplica => write!(f, "READ_REPLICA"),
            Role::Single => write!(f, "SINGLE"),
            Role::Other(s) => write!(f, "{}", s),
        }
    }
}
