/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Lifecycle status stored in the `status_id` column of every entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Inactive,
    Pending,
    Suspended,
}

impl Status {
    pub fn id(self) -> i16 {
        match self {
            Status::Active => 0,
            Status::Inactive => 1,
            Status::Pending => 2,
            Status::Suspended => 3,
        }
    }

    /// Unknown ids are treated as not active
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Status::Active),
            1 => Some(Status::Inactive),
            2 => Some(Status::Pending),
            3 => Some(Status::Suspended),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive/Deleted",
            Status::Pending => "Pending",
            Status::Suspended => "Suspended",
        }
    }
}

pub fn is_active(status_id: i16) -> bool {
    status_id == Status::Active.id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_zero_is_active() {
        assert!(is_active(0));
        assert!(!is_active(1));
        assert!(!is_active(3));
        assert!(!is_active(42));
        assert_eq!(Status::from_id(3), Some(Status::Suspended));
        assert_eq!(Status::from_id(9), None);
    }
}
