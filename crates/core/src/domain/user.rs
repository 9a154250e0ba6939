use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Submitter,
    Approver,
    Admin,
}

impl Role {
    /// Coarse privilege ordering: submitter < approver < admin.
    pub fn rank(self) -> u8 {
        match self {
            Self::Submitter => 1,
            Self::Approver => 2,
            Self::Admin => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}
