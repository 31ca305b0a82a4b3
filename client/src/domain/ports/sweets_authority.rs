//! Port for the remote sweets authority.
//!
//! The authority owns every business rule (stock arithmetic, ownership,
//! credential checks). The client only issues requests through this trait and
//! reflects what comes back.

use async_trait::async_trait;

use crate::domain::{
    AuthToken, CollectionQuery, Identity, Item, ItemId, ItemPayload, LoginCredentials,
    Registration, RestockAmount,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by authority adapters.
    pub enum AuthorityError {
        /// The authority refused the bearer token or the credentials (401).
        Unauthenticated { message: Option<String> } =>
            "authority rejected the session: {message:?}",
        /// Any other non-success status.
        Rejected { status: u16, message: Option<String> } =>
            "authority rejected the request with status {status}: {message:?}",
        /// The request never produced a response.
        Transport { message: String } => "authority transport failed: {message}",
        /// No response arrived within the configured timeout.
        Timeout { message: String } => "authority request timed out: {message}",
        /// A success response could not be decoded.
        Decode { message: String } => "authority response could not be decoded: {message}",
    }
}

impl AuthorityError {
    /// Message supplied by the authority itself, if it sent one.
    #[must_use]
    pub fn authority_message(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated { message } | Self::Rejected { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty()),
            Self::Transport { .. } | Self::Timeout { .. } | Self::Decode { .. } => None,
        }
    }

    /// Whether the request failed before the authority answered.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Decode { .. }
        )
    }
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acknowledgement {
    /// Human-readable message, when the authority sent one.
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Acknowledgement carrying `message`.
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Non-blank message, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Decoded login response.
///
/// Both `token` and `user` must be present for the login to count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginGrant {
    /// Human-readable message.
    pub message: Option<String>,
    /// Issued bearer token.
    pub token: Option<AuthToken>,
    /// Identity the token belongs to.
    pub user: Option<Identity>,
}

/// The remote REST service.
#[async_trait]
pub trait SweetsAuthority: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, AuthorityError>;

    /// `POST /auth/register`.
    async fn register(&self, registration: &Registration)
    -> Result<Acknowledgement, AuthorityError>;

    /// `GET /sweets` or `GET /sweets/search`.
    async fn list_items(
        &self,
        bearer: Option<&AuthToken>,
        query: &CollectionQuery,
    ) -> Result<Vec<Item>, AuthorityError>;

    /// `POST /sweets`.
    async fn create_item(
        &self,
        bearer: &AuthToken,
        payload: &ItemPayload,
    ) -> Result<Acknowledgement, AuthorityError>;

    /// `PUT /sweets/:id`.
    async fn update_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
        payload: &ItemPayload,
    ) -> Result<Acknowledgement, AuthorityError>;

    /// `DELETE /sweets/:id`.
    async fn delete_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
    ) -> Result<Acknowledgement, AuthorityError>;

    /// `POST /sweets/:id/purchase`.
    async fn purchase_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
    ) -> Result<Acknowledgement, AuthorityError>;

    /// `POST /sweets/:id/restock`.
    async fn restock_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
        amount: RestockAmount,
    ) -> Result<Acknowledgement, AuthorityError>;
}
