//! Account and plan status reported by the webhook backend.
//!
//! The backend sends free-form strings. Known values map to variants and
//! anything else is kept verbatim so a profile written back to the session
//! cache is unchanged.

use serde::{Deserialize, Serialize};

/// Subscription state of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanStatus {
    /// No plan purchased yet (empty string from the backend).
    #[default]
    None,
    /// Paid plan in good standing.
    Active,
    /// Checkout started, payment not confirmed.
    Pending,
    /// Plan was cancelled or expired.
    Canceled,
    /// Any other value.
    Other(String),
}

impl PlanStatus {
    /// Whether the user currently has a paid plan.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<String> for PlanStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Self::None,
            "active" | "paid" => Self::Active,
            "pending" => Self::Pending,
            "canceled" | "cancelled" | "expired" => Self::Canceled,
            _ => Self::Other(value),
        }
    }
}

impl From<PlanStatus> for String {
    fn from(status: PlanStatus) -> Self {
        match status {
            PlanStatus::None => Self::new(),
            PlanStatus::Active => "active".to_owned(),
            PlanStatus::Pending => "pending".to_owned(),
            PlanStatus::Canceled => "canceled".to_owned(),
            PlanStatus::Other(value) => value,
        }
    }
}

/// Lifecycle state of an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    /// Not reported.
    #[default]
    Unknown,
    /// Account usable.
    Active,
    /// Account blocked by the backend.
    Blocked,
    /// Any other value.
    Other(String),
}

impl From<String> for UserStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Self::Unknown,
            "active" => Self::Active,
            "blocked" | "inactive" | "suspended" => Self::Blocked,
            _ => Self::Other(value),
        }
    }
}

impl From<UserStatus> for String {
    fn from(status: UserStatus) -> Self {
        match status {
            UserStatus::Unknown => Self::new(),
            UserStatus::Active => "active".to_owned(),
            UserStatus::Blocked => "blocked".to_owned(),
            UserStatus::Other(value) => value,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_status_mapping() {
        assert_eq!(PlanStatus::from(String::new()), PlanStatus::None);
        assert!(PlanStatus::from("Active".to_owned()).is_active());
        assert_eq!(
            PlanStatus::from("cancelled".to_owned()),
            PlanStatus::Canceled
        );
    }

    #[test]
    fn test_unknown_values_survive_roundtrip() {
        let status: PlanStatus = serde_json::from_str("\"trial\"").unwrap();
        assert_eq!(status, PlanStatus::Other("trial".to_owned()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"trial\"");

        let user: UserStatus = serde_json::from_str("\"frozen\"").unwrap();
        assert_eq!(serde_json::to_string(&user).unwrap(), "\"frozen\"");
    }
}
