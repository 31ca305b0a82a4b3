//! Inventory mutations: create, update, delete, restock and purchase.
//!
//! Every mutation follows validate, request, reconcile. Reconciliation is a
//! full refresh of the displayed collection; quantities are never adjusted
//! locally. Each mutation kind admits one outstanding request at a time.
//! Every failure is reported through the notifier exactly once before the
//! method returns it.

mod form;
mod in_flight;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::catalogue::Catalogue;
use super::ports::{Acknowledgement, AuthorityError, Notice, Notifier, SweetsAuthority};
use super::session_expiry::authority_error;
use super::{
    AuthToken, Error, Identity, ImageAttachment, ItemId, RestockAmount, SessionExpiryPolicy,
    SessionStore,
};

pub use form::{FormField, FormValidationError, ItemForm, UnknownFormField};
use in_flight::{InFlight, InFlightGuard};
pub use in_flight::MutationKind;

const SWEET_ADDED: &str = "Sweet added!";
const SWEET_UPDATED: &str = "Sweet updated!";
const ADD_FAILED: &str = "Failed to add sweet";
const UPDATE_FAILED: &str = "Failed to update sweet";
const SWEET_DELETED: &str = "Sweet deleted!";
const DELETE_FAILED: &str = "Failed to delete sweet";
const SWEET_RESTOCKED: &str = "Sweet restocked!";
const RESTOCK_FAILED: &str = "Failed to restock";
const INVALID_QUANTITY: &str = "Invalid quantity";
const PURCHASED: &str = "Purchase successful!";
const PURCHASE_TRANSPORT_FAILED: &str = "Something went wrong while purchasing.";
const SIGN_IN_REQUIRED: &str = "Please log in to continue";
const BUSY: &str = "Please wait for the current request to finish";

/// Restock confirmation awaiting an amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRestock {
    /// Item to restock.
    pub id: ItemId,
    /// Amount text as typed.
    pub amount: String,
}

#[derive(Debug, Default)]
struct ControllerState {
    form: ItemForm,
    delete: Option<ItemId>,
    restock: Option<PendingRestock>,
}

/// Collaborators of [`InventoryMutationController`].
#[derive(Clone)]
pub struct MutationPorts {
    /// Remote authority.
    pub authority: Arc<dyn SweetsAuthority>,
    /// Session used for bearer tokens and the `admins` field.
    pub session: Arc<SessionStore>,
    /// Collection refreshed after each mutation.
    pub catalogue: Catalogue,
    /// Destination for success and failure notices.
    pub notifier: Arc<dyn Notifier>,
}

/// Issues inventory mutations and reconciles the displayed collection.
pub struct InventoryMutationController {
    ports: MutationPorts,
    expiry: SessionExpiryPolicy,
    in_flight: Arc<InFlight>,
    state: Mutex<ControllerState>,
}

impl InventoryMutationController {
    /// Create a controller with an empty form and no open confirmations.
    #[must_use]
    pub fn new(ports: MutationPorts, expiry: SessionExpiryPolicy) -> Self {
        Self {
            ports,
            expiry,
            in_flight: Arc::new(InFlight::default()),
            state: Mutex::new(ControllerState::default()),
        }
    }

    /// Copy of the form.
    #[must_use]
    pub fn form(&self) -> ItemForm {
        self.state().form.clone()
    }

    /// Load a displayed item into the form for updating.
    pub fn begin_edit(&self, id: &ItemId) -> Result<(), Error> {
        let Some(item) = self.ports.catalogue.find(id) else {
            return Err(self.fail(Error::invalid_request(format!("No sweet with id {id}"))));
        };
        self.state().form = ItemForm::for_item(&item);
        Ok(())
    }

    /// Discard the form, leaving update mode.
    pub fn cancel_edit(&self) {
        self.state().form = ItemForm::default();
    }

    /// Change one form field.
    pub fn edit_field(&self, field: FormField, value: impl Into<String>) {
        self.state().form.set(field, value);
    }

    /// Attach an image to the form.
    pub fn attach_image(&self, image: ImageAttachment) {
        self.state().form.attach_image(image);
    }

    /// Validate the form and create or update the item.
    ///
    /// The form is cleared only when the authority accepted it and nothing
    /// was edited while the request was outstanding.
    pub async fn submit_form(&self) -> Result<(), Error> {
        let guard = self.begin(MutationKind::Save)?;
        let (token, identity) = self.credentials()?;
        let form = self.form();
        let payload = form
            .validate(identity.id())
            .map_err(|err| self.fail(Error::invalid_request(err.to_string())))?;

        let editing = form.editing().cloned();
        let result = match editing.as_ref() {
            Some(id) => {
                self.ports
                    .authority
                    .update_item(&token, id, &payload)
                    .await
            }
            None => self.ports.authority.create_item(&token, &payload).await,
        };
        drop(guard);

        match result {
            Ok(ack) => {
                self.clear_form_if_unchanged(&form);
                let message = match editing {
                    Some(id) => {
                        info!(item_id = %id, "sweet updated");
                        SWEET_UPDATED.to_owned()
                    }
                    None => {
                        info!(name = %payload.name, "sweet added");
                        ack.text().unwrap_or(SWEET_ADDED).to_owned()
                    }
                };
                self.ports.notifier.notify(Notice::success(message));
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                let fallback = if editing.is_some() {
                    UPDATE_FAILED
                } else {
                    ADD_FAILED
                };
                Err(self.authority_failure(&err, fallback))
            }
        }
    }

    fn clear_form_if_unchanged(&self, submitted: &ItemForm) {
        let mut state = self.state();
        if state.form == *submitted {
            state.form = ItemForm::default();
        } else {
            debug!("form edited during save; keeping the newer input");
        }
    }

    /// Open the delete confirmation for `id`.
    pub fn request_delete(&self, id: ItemId) {
        self.state().delete = Some(id);
    }

    /// Close the delete confirmation without a request.
    pub fn cancel_delete(&self) {
        self.state().delete = None;
    }

    /// Item awaiting delete confirmation.
    #[must_use]
    pub fn pending_delete(&self) -> Option<ItemId> {
        self.state().delete.clone()
    }

    /// Delete the item under confirmation, then refresh and close the
    /// confirmation whatever the outcome.
    pub async fn confirm_delete(&self) -> Result<(), Error> {
        let Some(id) = self.pending_delete() else {
            return Err(self.fail(Error::invalid_request("Nothing to delete")));
        };
        let guard = self.begin(MutationKind::Delete)?;
        let (token, _) = self.credentials()?;
        let result = self.ports.authority.delete_item(&token, &id).await;
        drop(guard);

        let outcome = self.settle(result, SWEET_DELETED, DELETE_FAILED);
        if outcome.is_ok() {
            info!(item_id = %id, "sweet deleted");
        }
        self.state().delete = None;
        self.refresh().await;
        outcome
    }

    /// Open the restock confirmation for `id` with an empty amount.
    pub fn request_restock(&self, id: ItemId) {
        self.state().restock = Some(PendingRestock {
            id,
            amount: String::new(),
        });
    }

    /// Update the amount typed into the restock confirmation.
    pub fn set_restock_amount(&self, amount: impl Into<String>) {
        if let Some(pending) = self.state().restock.as_mut() {
            pending.amount = amount.into();
        }
    }

    /// Close the restock confirmation without a request.
    pub fn cancel_restock(&self) {
        self.state().restock = None;
    }

    /// Restock confirmation currently open.
    #[must_use]
    pub fn pending_restock(&self) -> Option<PendingRestock> {
        self.state().restock.clone()
    }

    /// Validate the amount and restock.
    ///
    /// An invalid amount keeps the confirmation open and sends nothing.
    /// Otherwise the confirmation closes and the collection refreshes
    /// whatever the outcome.
    pub async fn confirm_restock(&self) -> Result<(), Error> {
        let Some(pending) = self.pending_restock() else {
            return Err(self.fail(Error::invalid_request("Nothing to restock")));
        };
        let amount = RestockAmount::parse(&pending.amount).map_err(|err| {
            debug!(reason = %err, "restock amount refused");
            self.fail(Error::invalid_request(INVALID_QUANTITY))
        })?;
        let guard = self.begin(MutationKind::Restock)?;
        let (token, _) = self.credentials()?;
        let result = self
            .ports
            .authority
            .restock_item(&token, &pending.id, amount)
            .await;
        drop(guard);

        let outcome = self.settle(result, SWEET_RESTOCKED, RESTOCK_FAILED);
        if outcome.is_ok() {
            info!(item_id = %pending.id, amount = amount.get(), "sweet restocked");
        }
        self.state().restock = None;
        self.refresh().await;
        outcome
    }

    /// Whether the purchase control for `id` should be enabled.
    #[must_use]
    pub fn can_purchase(&self, id: &ItemId) -> bool {
        !self.in_flight.is_busy(MutationKind::Purchase)
            && self
                .ports
                .catalogue
                .find(id)
                .is_some_and(|item| item.in_stock())
    }

    /// Whether a mutation of `kind` is outstanding.
    #[must_use]
    pub fn is_busy(&self, kind: MutationKind) -> bool {
        self.in_flight.is_busy(kind)
    }

    /// Buy one unit of a displayed item.
    ///
    /// Refused locally when the displayed quantity is zero.
    pub async fn purchase(&self, id: &ItemId) -> Result<(), Error> {
        let Some(item) = self.ports.catalogue.find(id) else {
            return Err(self.fail(Error::invalid_request(format!("No sweet with id {id}"))));
        };
        if !item.in_stock() {
            return Err(self.fail(Error::invalid_request("Out of stock")));
        }
        let guard = self.begin(MutationKind::Purchase)?;
        let (token, _) = self.credentials()?;
        let result = self.ports.authority.purchase_item(&token, id).await;
        drop(guard);

        match result {
            Ok(_) => {
                info!(item_id = %id, "sweet purchased");
                self.ports.notifier.notify(Notice::success(PURCHASED));
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                warn!(item_id = %id, error = %err, kind = err.kind(), "purchase failed");
                self.expiry.reconcile(&self.ports.session, &err);
                let message = if err.is_transport() {
                    PURCHASE_TRANSPORT_FAILED.to_owned()
                } else {
                    format!(
                        "Purchase failed: {}",
                        err.authority_message().unwrap_or("Unknown error")
                    )
                };
                Err(self.fail(authority_error(&err, "").with_message(message)))
            }
        }
    }

    fn begin(&self, kind: MutationKind) -> Result<InFlightGuard, Error> {
        self.in_flight.begin(kind).ok_or_else(|| {
            debug!(%kind, "mutation already in flight");
            self.fail(Error::busy(BUSY))
        })
    }

    fn credentials(&self) -> Result<(AuthToken, Identity), Error> {
        self.ports
            .session
            .current()
            .map(|session| (session.token().clone(), session.identity().clone()))
            .ok_or_else(|| self.fail(Error::unauthorized(SIGN_IN_REQUIRED)))
    }

    fn settle(
        &self,
        result: Result<Acknowledgement, AuthorityError>,
        success: &str,
        fallback: &str,
    ) -> Result<(), Error> {
        match result {
            Ok(ack) => {
                self.ports
                    .notifier
                    .notify(Notice::success(ack.text().unwrap_or(success)));
                Ok(())
            }
            Err(err) => Err(self.authority_failure(&err, fallback)),
        }
    }

    fn authority_failure(&self, err: &AuthorityError, fallback: &str) -> Error {
        warn!(error = %err, kind = err.kind(), "mutation rejected");
        self.expiry.reconcile(&self.ports.session, err);
        self.fail(authority_error(err, fallback))
    }

    fn fail(&self, error: Error) -> Error {
        self.ports.notifier.notify(Notice::error(error.message()));
        error
    }

    async fn refresh(&self) {
        if let Err(err) = self.ports.catalogue.refresh_current().await {
            warn!(error = %err, "refresh after mutation failed");
        }
    }

    // Plain field assignments only; a poisoned guard is still coherent.
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
