//! Reqwest-backed sweets authority adapter.
//!
//! This adapter owns transport details only: URL construction, bearer
//! headers, multipart encoding, timeout and HTTP status mapping, and JSON
//! decoding into domain records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::json;
use tracing::debug;

use super::dto::{ItemListDto, LoginResponseDto, MessageDto};
use crate::domain::ports::{Acknowledgement, AuthorityError, LoginGrant, SweetsAuthority};
use crate::domain::{
    AuthToken, CollectionQuery, Item, ItemId, ItemPayload, LoginCredentials, Registration,
    RestockAmount,
};

/// Authority adapter that talks to one REST base URL.
pub struct HttpSweetsAuthority {
    client: Client,
    base: Url,
}

impl HttpSweetsAuthority {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, AuthorityError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            debug!(
                operation,
                status = status.as_u16(),
                body = %body_preview(body.as_ref()),
                "authority refused request"
            );
            return Err(map_status_error(status, body.as_ref()));
        }
        debug!(
            operation,
            status = status.as_u16(),
            bytes = body.len(),
            "authority answered"
        );
        Ok(body.to_vec())
    }

    async fn acknowledge(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Acknowledgement, AuthorityError> {
        let body = self.send(operation, request).await?;
        Ok(MessageDto::from_body(&body).into_acknowledgement())
    }
}

#[async_trait]
impl SweetsAuthority for HttpSweetsAuthority {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, AuthorityError> {
        let url = endpoint_url(&self.base, &["auth", "login"])?;
        let request = self.client.post(url).json(&json!({
            "email": credentials.email(),
            "password": credentials.password(),
        }));
        let body = self.send("login", request).await?;
        parse_login(&body)
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<Acknowledgement, AuthorityError> {
        let url = endpoint_url(&self.base, &["auth", "register"])?;
        let request = self.client.post(url).json(&json!({
            "name": registration.name(),
            "email": registration.email(),
            "password": registration.password(),
            "role": registration.role().as_str(),
        }));
        self.acknowledge("register", request).await
    }

    async fn list_items(
        &self,
        bearer: Option<&AuthToken>,
        query: &CollectionQuery,
    ) -> Result<Vec<Item>, AuthorityError> {
        let url = list_url(&self.base, query)?;
        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose());
        }
        let body = self.send("list_items", request).await?;
        parse_items(&body)
    }

    async fn create_item(
        &self,
        bearer: &AuthToken,
        payload: &ItemPayload,
    ) -> Result<Acknowledgement, AuthorityError> {
        let url = endpoint_url(&self.base, &["sweets"])?;
        let request = self
            .client
            .post(url)
            .bearer_auth(bearer.expose())
            .multipart(item_form(payload));
        self.acknowledge("create_item", request).await
    }

    async fn update_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
        payload: &ItemPayload,
    ) -> Result<Acknowledgement, AuthorityError> {
        let url = endpoint_url(&self.base, &["sweets", id.as_str()])?;
        let request = self
            .client
            .put(url)
            .bearer_auth(bearer.expose())
            .multipart(item_form(payload));
        self.acknowledge("update_item", request).await
    }

    async fn delete_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
    ) -> Result<Acknowledgement, AuthorityError> {
        let url = endpoint_url(&self.base, &["sweets", id.as_str()])?;
        let request = self.client.delete(url).bearer_auth(bearer.expose());
        self.acknowledge("delete_item", request).await
    }

    async fn purchase_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
    ) -> Result<Acknowledgement, AuthorityError> {
        let url = endpoint_url(&self.base, &["sweets", id.as_str(), "purchase"])?;
        let request = self.client.post(url).bearer_auth(bearer.expose());
        self.acknowledge("purchase_item", request).await
    }

    async fn restock_item(
        &self,
        bearer: &AuthToken,
        id: &ItemId,
        amount: RestockAmount,
    ) -> Result<Acknowledgement, AuthorityError> {
        let url = endpoint_url(&self.base, &["sweets", id.as_str(), "restock"])?;
        let request = self
            .client
            .post(url)
            .bearer_auth(bearer.expose())
            .json(&json!({ "amount": amount.get() }));
        self.acknowledge("restock_item", request).await
    }
}

/// Append `segments` to the base path, percent-encoding each one.
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, AuthorityError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| AuthorityError::transport(format!("base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn list_url(base: &Url, query: &CollectionQuery) -> Result<Url, AuthorityError> {
    match query {
        CollectionQuery::Storefront(canonical) if canonical.is_empty() => {
            endpoint_url(base, &["sweets"])
        }
        CollectionQuery::Storefront(canonical) => {
            let mut url = endpoint_url(base, &["sweets", "search"])?;
            url.set_query(Some(canonical.as_str()));
            Ok(url)
        }
        CollectionQuery::OwnedBy(owner) => {
            let mut url = endpoint_url(base, &["sweets", "search"])?;
            url.query_pairs_mut().append_pair("admin", owner.as_str());
            Ok(url)
        }
    }
}

fn item_form(payload: &ItemPayload) -> Form {
    let mut form = Form::new()
        .text("name", payload.name.clone())
        .text("category", payload.category.clone())
        .text("price", payload.price.to_string())
        .text("quantity", payload.quantity.to_string())
        .text("admins", payload.admins.to_string());
    if let Some(image) = &payload.image {
        let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        form = form.part("image", part);
    }
    form
}

fn parse_login(body: &[u8]) -> Result<LoginGrant, AuthorityError> {
    let decoded: LoginResponseDto = serde_json::from_slice(body).map_err(|error| {
        AuthorityError::decode(format!("invalid login payload: {error}"))
    })?;
    decoded.into_grant().map_err(AuthorityError::decode)
}

fn parse_items(body: &[u8]) -> Result<Vec<Item>, AuthorityError> {
    let decoded: ItemListDto = serde_json::from_slice(body).map_err(|error| {
        AuthorityError::decode(format!("invalid item list payload: {error}"))
    })?;
    decoded.into_domain_items().map_err(AuthorityError::decode)
}

fn map_transport_error(error: reqwest::Error) -> AuthorityError {
    if error.is_timeout() {
        AuthorityError::timeout(error.to_string())
    } else {
        AuthorityError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthorityError {
    let message = MessageDto::from_body(body).into_text();
    if status == StatusCode::UNAUTHORIZED {
        AuthorityError::Unauthenticated { message }
    } else {
        AuthorityError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
