//! Status enums for carts and catalog items.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a cart.
///
/// A cart starts `Active` and moves to `Ordered` exactly once, at checkout.
/// `Ordered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "cart_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Accepting item additions.
    #[default]
    Active,
    /// Closed into an order; immutable.
    Ordered,
}

impl CartStatus {
    /// Whether items may still be added to a cart in this status.
    #[must_use]
    pub const fn accepts_items(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Ordered => write!(f, "ordered"),
        }
    }
}

impl std::str::FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "ordered" => Ok(Self::Ordered),
            _ => Err(format!("invalid cart status: {s}")),
        }
    }
}

/// Catalog item status.
///
/// Preserved as data only; nothing filters on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "item_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid item status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CartStatus::Ordered).unwrap(),
            "\"ordered\""
        );
        let parsed: CartStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, CartStatus::Active);
    }

    #[test]
    fn test_only_active_cart_accepts_items() {
        assert!(CartStatus::Active.accepts_items());
        assert!(!CartStatus::Ordered.accepts_items());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ordered".parse::<CartStatus>().unwrap(), CartStatus::Ordered);
        assert_eq!("inactive".parse::<ItemStatus>().unwrap(), ItemStatus::Inactive);
        assert!("closed".parse::<CartStatus>().is_err());
    }

    #[test]
    fn test_item_status_default_is_active() {
        assert_eq!(ItemStatus::default(), ItemStatus::Active);
        assert_eq!(ItemStatus::Inactive.to_string(), "inactive");
    }
}
