//! Create/update form state and its validation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::{ImageAttachment, Item, ItemId, ItemPayload, UserId};

/// Editable text fields of the item form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Item name.
    Name,
    /// Category.
    Category,
    /// Unit price.
    Price,
    /// Stock level.
    Quantity,
}

impl FormField {
    /// Every field, in form order.
    pub const ALL: [Self; 4] = [Self::Name, Self::Category, Self::Price, Self::Quantity];

    const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Price => "price",
            Self::Quantity => "quantity",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a form field name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field `{0}`")]
pub struct UnknownFormField(pub String);

impl FromStr for FormField {
    type Err = UnknownFormField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFormField(wanted.to_owned()))
    }
}

/// Reasons the form cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormValidationError {
    /// Name is blank.
    #[error("Name is required")]
    MissingName,
    /// Category is blank.
    #[error("Category is required")]
    MissingCategory,
    /// Price is not a finite, non-negative number.
    #[error("Price must be a non-negative number")]
    InvalidPrice,
    /// Quantity is not a non-negative whole number.
    #[error("Quantity must be a non-negative whole number")]
    InvalidQuantity,
}

/// Contents of the create/update form.
///
/// `editing` selects update (`Some`) or create (`None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemForm {
    editing: Option<ItemId>,
    name: String,
    category: String,
    price: String,
    quantity: String,
    image: Option<ImageAttachment>,
}

impl ItemForm {
    /// Form pre-filled from an existing item, in update mode.
    #[must_use]
    pub fn for_item(item: &Item) -> Self {
        Self {
            editing: Some(item.id.clone()),
            name: item.name.clone(),
            category: item.category.clone(),
            price: item.price.to_string(),
            quantity: item.quantity.to_string(),
            image: None,
        }
    }

    /// Item being updated, if any.
    #[must_use]
    pub const fn editing(&self) -> Option<&ItemId> {
        self.editing.as_ref()
    }

    /// Raw text of `field`.
    #[must_use]
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Category => &self.category,
            FormField::Price => &self.price,
            FormField::Quantity => &self.quantity,
        }
    }

    /// Replace the raw text of `field`.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Name => &mut self.name,
            FormField::Category => &mut self.category,
            FormField::Price => &mut self.price,
            FormField::Quantity => &mut self.quantity,
        };
        *slot = value.into();
    }

    /// Attached image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    /// Attach or replace the image upload.
    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    /// Validate the form into a payload owned by `admin`.
    pub fn validate(&self, admin: &UserId) -> Result<ItemPayload, FormValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormValidationError::MissingName);
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(FormValidationError::MissingCategory);
        }
        let price = parse_price(&self.price)?;
        let quantity = self
            .quantity
            .trim()
            .parse::<u32>()
            .map_err(|_| FormValidationError::InvalidQuantity)?;
        Ok(ItemPayload {
            name: name.to_owned(),
            category: category.to_owned(),
            price,
            quantity,
            image: self.image.clone(),
            admins: admin.clone(),
        })
    }
}

fn parse_price(text: &str) -> Result<f64, FormValidationError> {
    let price = text
        .trim()
        .parse::<f64>()
        .map_err(|_| FormValidationError::InvalidPrice)?;
    if !price.is_finite() || price < 0.0 {
        return Err(FormValidationError::InvalidPrice);
    }
    // Normalise "-0" so the authority never sees a negative zero.
    Ok(price.abs())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn admin() -> UserId {
        UserId::new("u1").expect("id")
    }

    fn filled(name: &str, category: &str, price: &str, quantity: &str) -> ItemForm {
        let mut form = ItemForm::default();
        form.set(FormField::Name, name);
        form.set(FormField::Category, category);
        form.set(FormField::Price, price);
        form.set(FormField::Quantity, quantity);
        form
    }

    #[rstest]
    #[case(filled("", "candy", "1", "1"), FormValidationError::MissingName)]
    #[case(filled("Fudge", "  ", "1", "1"), FormValidationError::MissingCategory)]
    #[case(filled("Fudge", "candy", "abc", "1"), FormValidationError::InvalidPrice)]
    #[case(filled("Fudge", "candy", "-1", "1"), FormValidationError::InvalidPrice)]
    #[case(filled("Fudge", "candy", "inf", "1"), FormValidationError::InvalidPrice)]
    #[case(filled("Fudge", "candy", "1", "-2"), FormValidationError::InvalidQuantity)]
    #[case(filled("Fudge", "candy", "1", "2.5"), FormValidationError::InvalidQuantity)]
    #[case(filled("Fudge", "candy", "1", ""), FormValidationError::InvalidQuantity)]
    fn rejects_invalid_forms(
        admin: UserId,
        #[case] form: ItemForm,
        #[case] expected: FormValidationError,
    ) {
        assert_eq!(form.validate(&admin).expect_err("invalid"), expected);
    }

    #[rstest]
    fn valid_form_becomes_payload(admin: UserId) {
        let payload = filled(" Fudge ", "candy", "2.50", "0")
            .validate(&admin)
            .expect("valid");
        assert_eq!(payload.name, "Fudge");
        assert_eq!(payload.quantity, 0);
        assert!((payload.price - 2.5).abs() < f64::EPSILON);
        assert_eq!(payload.admins, admin);
    }

    #[rstest]
    fn negative_zero_price_is_accepted(admin: UserId) {
        let payload = filled("Gum", "candy", "-0", "1").validate(&admin).expect("valid");
        assert!(payload.price.is_sign_positive());
    }

    #[test]
    fn editing_form_is_prefilled() {
        let item = crate::test_support::item("a1", "Fudge", 4).expect("fixture item");
        let form = ItemForm::for_item(&item);
        assert_eq!(form.editing().map(ItemId::as_str), Some("a1"));
        assert_eq!(form.get(FormField::Name), "Fudge");
        assert_eq!(form.get(FormField::Quantity), "4");
        assert_eq!(form.get(FormField::Price), "2.5");
    }
}
