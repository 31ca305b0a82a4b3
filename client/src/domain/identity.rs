//! Signed-in identity model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned when building identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// Identifier was missing or blank.
    EmptyId,
    /// Identifier carried leading or trailing whitespace.
    PaddedId,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::PaddedId => write!(f, "user id must not contain surrounding whitespace"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Opaque user identifier issued by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = id.into();
        if raw.trim().is_empty() {
            return Err(IdentityValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(IdentityValidationError::PaddedId);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Access role attached to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Inventory administrator.
    Admin,
    /// Shopper; unknown roles from the authority land here too.
    #[default]
    #[serde(other)]
    User,
}

impl Role {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person a session belongs to.
///
/// ## Invariants
/// - `id` is non-empty and trimmed.
/// - Immutable once built; a new login replaces the whole value.
///
/// # Examples
/// ```
/// use sweets_client::domain::{Identity, Role};
///
/// let identity = Identity::try_new("u1", "Ada", "ada@example.com", Role::Admin).unwrap();
/// assert!(identity.is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentityDto", into = "IdentityDto")]
pub struct Identity {
    id: UserId,
    name: String,
    email: String,
    role: Role,
}

impl Identity {
    /// Build an identity from validated parts.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    /// Fallible constructor from raw strings.
    pub fn try_new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Result<Self, IdentityValidationError> {
        Ok(Self::new(UserId::new(id)?, name, email, role))
    }

    /// Authority-issued identifier.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Contact email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Access role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the identity may use admin views.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityDto {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: Role,
}

impl From<Identity> for IdentityDto {
    fn from(value: Identity) -> Self {
        let Identity {
            id,
            name,
            email,
            role,
        } = value;
        Self {
            id: id.into(),
            name,
            email,
            role,
        }
    }
}

impl TryFrom<IdentityDto> for Identity {
    type Error = IdentityValidationError;

    fn try_from(value: IdentityDto) -> Result<Self, Self::Error> {
        Self::try_new(value.id, value.name, value.email, value.role)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", IdentityValidationError::EmptyId)]
    #[case("   ", IdentityValidationError::EmptyId)]
    #[case(" u1", IdentityValidationError::PaddedId)]
    fn user_id_rejects_bad_input(#[case] raw: &str, #[case] expected: IdentityValidationError) {
        assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
    }

    #[rstest]
    fn decodes_mongo_style_identifier() {
        let identity: Identity = serde_json::from_value(json!({
            "_id": "665f",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "admin"
        }))
        .expect("decodes");
        assert_eq!(identity.id().as_str(), "665f");
        assert!(identity.is_admin());
    }

    #[rstest]
    fn decodes_sparse_identity_with_defaults() {
        let identity: Identity =
            serde_json::from_value(json!({ "id": "u1", "role": "admin" })).expect("decodes");
        assert_eq!(identity.name(), "");
        assert_eq!(identity.email(), "");
        assert_eq!(identity.role(), Role::Admin);
    }

    #[rstest]
    #[case(json!("user"), Role::User)]
    #[case(json!("admin"), Role::Admin)]
    #[case(json!("superuser"), Role::User)]
    fn unknown_roles_fall_back_to_user(#[case] raw: serde_json::Value, #[case] expected: Role) {
        let role: Role = serde_json::from_value(raw).expect("role decodes");
        assert_eq!(role, expected);
    }

    #[rstest]
    fn identity_with_unrecognised_role_decodes_as_user() {
        let identity: Identity =
            serde_json::from_value(json!({ "id": "u1", "role": "superadmin" })).expect("decodes");
        assert_eq!(identity.role(), Role::User);
        assert!(!identity.is_admin());
    }

    #[rstest]
    fn serialises_with_plain_id_key() {
        let identity =
            Identity::try_new("u1", "Ada", "ada@example.com", Role::User).expect("valid identity");
        let value = serde_json::to_value(&identity).expect("serialises");
        assert_eq!(value.get("id"), Some(&json!("u1")));
        assert_eq!(value.get("role"), Some(&json!("user")));
    }
}
