//! Operator notices: short, dismissible messages shown above the cart.

use pos_core::{DomainError, RemoteError};
use pos_products::ProductCode;

pub const INSUFFICIENT_STOCK: &str = "Insufficient stock!";
pub const CHECKOUT_SUCCEEDED: &str = "Successfully checked out!";
pub const CHECKOUT_FAILED: &str = "Something went wrong in processing checkout!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
    Success,
}

impl NoticeLevel {
    pub fn title(&self) -> &'static str {
        match self {
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
            NoticeLevel::Success => "Success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.level.title()
    }

    /// A command the cart refused, shown at `level`.
    pub fn rejected(level: NoticeLevel, err: &DomainError) -> Self {
        Self {
            level,
            message: err.message().to_string(),
        }
    }

    /// The product service did not deliver a product for `code`.
    pub fn lookup_failed(code: &ProductCode, err: &RemoteError) -> Self {
        let message = match err {
            RemoteError::NotFound => format!("There is no product with '{code}' product code!"),
            RemoteError::Unavailable(_) => {
                "Product service is unavailable, please try again!".to_string()
            }
            RemoteError::Rejected(reason) => format!("Lookup of '{code}' was rejected: {reason}"),
            RemoteError::Unknown(_) => format!("Could not look up product '{code}'!"),
        };
        Self::error(message)
    }

    /// The sale service did not accept the sale.
    pub fn checkout_failed(err: &RemoteError) -> Self {
        let message = match err {
            RemoteError::Unavailable(_) => {
                "Sale service is unavailable, please try again!".to_string()
            }
            RemoteError::Rejected(reason) => format!("Checkout was rejected: {reason}"),
            RemoteError::NotFound | RemoteError::Unknown(_) => CHECKOUT_FAILED.to_string(),
        };
        Self::error(message)
    }
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}] {}", self.title(), self.message)
    }
}
