//! Inventory items as reported by the authority, plus the payloads the client
//! sends back when mutating them.

use std::fmt;
use std::num::NonZeroU32;

use thiserror::Error;

use super::UserId;

/// Authority-issued item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId(String);

/// Validation errors returned when constructing [`ItemId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemIdValidationError {
    /// Identifier is empty after trimming whitespace.
    #[error("item id must not be empty")]
    Empty,
    /// Identifier contains characters that would break a request path.
    #[error("item id must not contain whitespace or '/'")]
    InvalidCharacter,
}

impl ItemId {
    /// Validate and construct an [`ItemId`].
    ///
    /// # Examples
    /// ```
    /// use sweets_client::domain::ItemId;
    ///
    /// let id = ItemId::new("665f1c").expect("valid id");
    /// assert_eq!(id.as_str(), "665f1c");
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, ItemIdValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(ItemIdValidationError::Empty);
        }
        if raw.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(ItemIdValidationError::InvalidCharacter);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Someone allowed to administer an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Owning user.
    pub id: UserId,
    /// Display name when the authority expanded the reference.
    pub name: Option<String>,
}

/// A stocked item.
///
/// Quantity is authority-owned; the client never adjusts it locally.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Identifier used in request paths.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Free-text category.
    pub category: String,
    /// Unit price, finite and non-negative.
    pub price: f64,
    /// Units in stock.
    pub quantity: u32,
    /// Image URL, when one was uploaded.
    pub image: Option<String>,
    /// Administrators of this item.
    pub owners: Vec<Owner>,
}

impl Item {
    /// Whether the purchase control should be offered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Binary image attached to a create or update request.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// File name reported to the authority.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Validated create or update payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPayload {
    /// Display name, non-empty.
    pub name: String,
    /// Category, non-empty.
    pub category: String,
    /// Finite, non-negative price.
    pub price: f64,
    /// Initial or replacement stock level.
    pub quantity: u32,
    /// Optional image upload.
    pub image: Option<ImageAttachment>,
    /// Administrator recorded against the item.
    pub admins: UserId,
}

/// Reasons a restock amount is refused before any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RestockAmountError {
    /// Nothing was entered.
    #[error("restock amount is empty")]
    Empty,
    /// Text does not parse as a number.
    #[error("restock amount is not a number")]
    NotANumber,
    /// Parsed to infinity or NaN.
    #[error("restock amount is not finite")]
    NotFinite,
    /// Zero or negative.
    #[error("restock amount must be positive")]
    NotPositive,
    /// Has a fractional part.
    #[error("restock amount must be a whole number")]
    NotWhole,
    /// Larger than the authority accepts.
    #[error("restock amount is too large")]
    TooLarge,
}

/// A strictly positive whole number of units to add to stock.
///
/// # Examples
/// ```
/// use sweets_client::domain::RestockAmount;
///
/// let amount = RestockAmount::parse(" 5 ").expect("valid amount");
/// assert_eq!(amount.get(), 5);
/// assert!(RestockAmount::parse("0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockAmount(NonZeroU32);

impl RestockAmount {
    /// Parse user-entered text.
    pub fn parse(text: &str) -> Result<Self, RestockAmountError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RestockAmountError::Empty);
        }
        if let Ok(whole) = trimmed.parse::<u64>() {
            let narrowed = u32::try_from(whole).map_err(|_| RestockAmountError::TooLarge)?;
            return NonZeroU32::new(narrowed)
                .map(Self)
                .ok_or(RestockAmountError::NotPositive);
        }
        Err(classify_non_integer(trimmed))
    }

    /// Units to add.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

fn classify_non_integer(text: &str) -> RestockAmountError {
    let Ok(value) = text.parse::<f64>() else {
        return RestockAmountError::NotANumber;
    };
    if !value.is_finite() {
        return RestockAmountError::NotFinite;
    }
    if value <= 0.0 {
        return RestockAmountError::NotPositive;
    }
    if value.fract() != 0.0 {
        return RestockAmountError::NotWhole;
    }
    // A whole, positive float that failed the u64 parse is out of range
    // ("1e12", "70000000000000000000").
    if value > f64::from(u32::MAX) {
        RestockAmountError::TooLarge
    } else {
        // "5.0" and "1e3" are whole and in range but were not plain digits.
        RestockAmountError::NotWhole
    }
}
