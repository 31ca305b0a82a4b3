//! Scripted authority double with per-endpoint gates.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::ports::{Acknowledgement, AuthorityError, LoginGrant, SweetsAuthority};
use crate::domain::{
    AuthToken, CollectionQuery, Item, ItemId, ItemPayload, LoginCredentials, Registration,
    RestockAmount, Role,
};

/// Authority endpoints, for scripting and gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /auth/login`.
    Login,
    /// `POST /auth/register`.
    Register,
    /// `GET /sweets` and `/sweets/search`.
    ListItems,
    /// `POST /sweets`.
    CreateItem,
    /// `PUT /sweets/:id`.
    UpdateItem,
    /// `DELETE /sweets/:id`.
    DeleteItem,
    /// `POST /sweets/:id/purchase`.
    PurchaseItem,
    /// `POST /sweets/:id/restock`.
    RestockItem,
}

/// One recorded request.
///
/// `bearer` fields hold the exposed token the call carried.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorityCall {
    /// Login attempt.
    Login {
        /// Submitted email.
        email: String,
    },
    /// Registration attempt.
    Register {
        /// Submitted email.
        email: String,
        /// Requested role.
        role: Role,
    },
    /// Collection fetch.
    ListItems {
        /// Token, when signed in.
        bearer: Option<String>,
        /// Requested scope.
        query: CollectionQuery,
    },
    /// Item creation.
    CreateItem {
        /// Token.
        bearer: String,
        /// Submitted fields.
        payload: ItemPayload,
    },
    /// Item update.
    UpdateItem {
        /// Token.
        bearer: String,
        /// Target item.
        id: ItemId,
        /// Submitted fields.
        payload: ItemPayload,
    },
    /// Item deletion.
    DeleteItem {
        /// Token.
        bearer: String,
        /// Target item.
        id: ItemId,
    },
    /// Purchase of one unit.
    PurchaseItem {
        /// Token.
        bearer: String,
        /// Target item.
        id: ItemId,
    },
    /// Restock.
    RestockItem {
        /// Token.
        bearer: String,
        /// Target item.
        id: ItemId,
        /// Units added.
        amount: u32,
    },
}

impl AuthorityCall {
    /// Endpoint this call went to.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Login { .. } => Endpoint::Login,
            Self::Register { .. } => Endpoint::Register,
            Self::ListItems { .. } => Endpoint::ListItems,
            Self::CreateItem { .. } => Endpoint::CreateItem,
            Self::UpdateItem { .. } => Endpoint::UpdateItem,
            Self::DeleteItem { .. } => Endpoint::DeleteItem,
            Self::PurchaseItem { .. } => Endpoint::PurchaseItem,
            Self::RestockItem { .. } => Endpoint::RestockItem,
        }
    }
}

#[derive(Default)]
struct StubState {
    calls: Vec<AuthorityCall>,
    inventory: Vec<Item>,
    logins: VecDeque<Result<LoginGrant, AuthorityError>>,
    lists: VecDeque<Result<Vec<Item>, AuthorityError>>,
    acks: HashMap<Endpoint, VecDeque<Result<Acknowledgement, AuthorityError>>>,
    held: HashSet<Endpoint>,
    waiters: Vec<(Endpoint, oneshot::Sender<()>)>,
}

/// In-memory authority whose replies are queued by the test.
///
/// Unscripted calls fall back to: login rejected as unauthenticated, list
/// returns the configured inventory, everything else acknowledges with no
/// message. Held endpoints park each call until [`StubAuthority::release`].
#[derive(Default)]
pub struct StubAuthority {
    state: Mutex<StubState>,
}

impl StubAuthority {
    /// Authority with no inventory and nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items returned by unscripted list calls.
    pub fn set_inventory(&self, items: Vec<Item>) {
        self.lock().inventory = items;
    }

    /// Queue the reply to the next login.
    pub fn push_login(&self, reply: Result<LoginGrant, AuthorityError>) {
        self.lock().logins.push_back(reply);
    }

    /// Queue the reply to the next collection fetch.
    pub fn push_list(&self, reply: Result<Vec<Item>, AuthorityError>) {
        self.lock().lists.push_back(reply);
    }

    /// Queue a reply for a mutating endpoint or registration.
    pub fn push_ack(&self, endpoint: Endpoint, reply: Result<Acknowledgement, AuthorityError>) {
        self.lock().acks.entry(endpoint).or_default().push_back(reply);
    }

    /// Park future calls to `endpoint` until released.
    pub fn hold(&self, endpoint: Endpoint) {
        self.lock().held.insert(endpoint);
    }

    /// Let the oldest parked call to `endpoint` proceed.
    pub fn release(&self, endpoint: Endpoint) -> bool {
        let mut state = self.lock();
        let Some(position) = state.waiters.iter().position(|(e, _)| *e == endpoint) else {
            return false;
        };
        let (_, gate) = state.waiters.remove(position);
        gate.send(()).is_ok()
    }

    /// Let the `index`-th currently parked call to `endpoint` proceed.
    pub fn release_nth(&self, endpoint: Endpoint, index: usize) -> bool {
        let mut state = self.lock();
        let Some(position) = state
            .waiters
            .iter()
            .enumerate()
            .filter(|(_, (e, _))| *e == endpoint)
            .nth(index)
            .map(|(position, _)| position)
        else {
            return false;
        };
        let (_, gate) = state.waiters.remove(position);
        gate.send(()).is_ok()
    }

    /// Number of parked calls to `endpoint`.
    #[must_use]
    pub fn parked(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .waiters
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<AuthorityCall> {
        self.lock().calls.clone()
    }

    /// Calls recorded for `endpoint`.
    #[must_use]
    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .count()
    }

    /// Most recent call to `endpoint`.
    #[must_use]
    pub fn last_call(&self, endpoint: Endpoint) -> Option<AuthorityCall> {
        self.lock()
            .calls
            .iter()
            .rev()
            .find(|call| call.endpoint() == endpoint)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit<T>(
        &self,
        call: AuthorityCall,
        reply: impl FnOnce(&mut StubState) -> T,
    ) -> (T, Option<oneshot::Receiver<()>>) {
        let mut state = self.lock();
        let endpoint = call.endpoint();
        state.calls.push(call);
        let value = reply(&mut state);
        let gate = if state.held.contains(&endpoint) {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push((endpoint, sender));
            Some(receiver)
        } else {
            None
        };
        (value, gate)
    }

    async fn ack(
        &self,
        call: AuthorityCall,
    ) -> Result<Acknowledgement, AuthorityError> {
        let endpoint = call.endpoint();
        let (reply, gate) = self.admit(call, |state| {
            state
                .acks
                .get_mut(&endpoint)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(Acknowledgement::default()))
        });
        pass(gate).await;
        reply
    }
}

async fn pass(gate: Option<oneshot::Receiver<()>>) {
    if let Some(receiver) = gate {
        drop(receiver.await);
    }
}

fn bearer(token: &AuthToken) -> String {
    token.expose().to_owned()
}

#[async_trait]
impl SweetsAuthority for StubAuthority {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, AuthorityError> {
        let call = AuthorityCall::Login {
            email: credentials.email().to_owned(),
        };
        let (reply, gate) = self.admit(call, |state| {
            state
                .logins
                .pop_front()
                .unwrap_or(Err(AuthorityError::Unauthenticated { message: None }))
        });
        pass(gate).await;
        reply
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<Acknowledgement, AuthorityError> {
        self.ack(AuthorityCall::Register {
            email: registration.email().to_owned(),
            role: registration.role(),
        })
        .await
    }

    async fn list_items(
        &self,
        token: Option<&AuthToken>,
        query: &CollectionQuery,
    ) -> Result<Vec<Item>, AuthorityError> {
        let call = AuthorityCall::ListItems {
            bearer: token.map(bearer),
            query: query.clone(),
        };
        let (reply, gate) = self.admit(call, |state| {
            let inventory = state.inventory.clone();
            state.lists.pop_front().unwrap_or(Ok(inventory))
        });
        pass(gate).await;
        reply
    }

    async fn create_item(
        &self,
        token: &AuthToken,
        payload: &ItemPayload,
    ) -> Result<Acknowledgement, AuthorityError> {
        self.ack(AuthorityCall::CreateItem {
            bearer: bearer(token),
            payload: payload.clone(),
        })
        .await
    }

    async fn update_item(
        &self,
        token: &AuthToken,
        id: &ItemId,
        payload: &ItemPayload,
    ) -> Result<Acknowledgement, AuthorityError> {
        self.ack(AuthorityCall::UpdateItem {
            bearer: bearer(token),
            id: id.clone(),
            payload: payload.clone(),
        })
        .await
    }

    async fn delete_item(
        &self,
        token: &AuthToken,
        id: &ItemId,
    ) -> Result<Acknowledgement, AuthorityError> {
        self.ack(AuthorityCall::DeleteItem {
            bearer: bearer(token),
            id: id.clone(),
        })
        .await
    }

    async fn purchase_item(
        &self,
        token: &AuthToken,
        id: &ItemId,
    ) -> Result<Acknowledgement, AuthorityError> {
        self.ack(AuthorityCall::PurchaseItem {
            bearer: bearer(token),
            id: id.clone(),
        })
        .await
    }

    async fn restock_item(
        &self,
        token: &AuthToken,
        id: &ItemId,
        amount: RestockAmount,
    ) -> Result<Acknowledgement, AuthorityError> {
        self.ack(AuthorityCall::RestockItem {
            bearer: bearer(token),
            id: id.clone(),
            amount: amount.get(),
        })
        .await
    }
}
