//! Line-oriented shell over the assembled client.
//!
//! The shell is the only inbound adapter: it parses one command per line,
//! calls the matching service and renders the resulting view. Service
//! failures have already been delivered through the notifier by the time a
//! call returns, so the shell only decides where to land afterwards.

mod command;
mod image;
mod render;

use std::io::{self, Write};

use camino::Utf8Path;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use crate::app::App;
use crate::domain::{Error, GuardDecision, NavigationMenu, RouteTarget};

use self::command::{DialogArg, ShellCommand, ShellLine, split_words};

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the shell.
    Quit,
}

/// Interactive shell writing views to `out`.
pub struct Shell<W> {
    app: App,
    out: W,
}

impl<W: Write> Shell<W> {
    /// Shell driving `app`.
    #[must_use]
    pub const fn new(app: App, out: W) -> Self {
        Self { app, out }
    }

    /// The client being driven.
    #[must_use]
    pub const fn app(&self) -> &App {
        &self.app
    }

    /// Recover the output sink.
    #[must_use]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Land on the view the location points at, as a page load would.
    ///
    /// # Errors
    ///
    /// Returns an error when the output cannot be written.
    pub async fn start(&mut self) -> io::Result<()> {
        let requested = self.app.current_view().unwrap_or(RouteTarget::Home);
        let landed = self.app.navigate(requested).await;
        self.show_view(landed)
    }

    /// Write the prompt, which carries the current address.
    ///
    /// # Errors
    ///
    /// Returns an error when the output cannot be written.
    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "sweets {}> ", self.app.location().current().href())?;
        self.out.flush()
    }

    /// Run one input line.
    ///
    /// # Errors
    ///
    /// Returns an error when the output cannot be written.
    pub async fn execute(&mut self, line: &str) -> io::Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let words = match split_words(line) {
            Ok(words) => words,
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(Flow::Continue);
            }
        };
        match ShellLine::try_parse_from(words) {
            Ok(parsed) => self.dispatch(parsed.command).await,
            Err(err) => {
                if !matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    debug!(error = %err, "unparsable shell line");
                }
                write!(self.out, "{}", err.render())?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn dispatch(&mut self, command: ShellCommand) -> io::Result<Flow> {
        match command {
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Login { email, password } => {
                if let Ok(landing) = self.app.auth().login(&email, &password).await {
                    self.open(landing).await?;
                }
            }
            ShellCommand::Register {
                name,
                email,
                password,
                role,
            } => {
                let registered = self
                    .app
                    .auth()
                    .register(&name, &email, &password, role.into())
                    .await;
                if let Ok(landing) = registered {
                    self.open(landing).await?;
                }
            }
            ShellCommand::Logout => {
                if let Ok(landing) = self.app.auth().logout().await {
                    self.open(landing).await?;
                }
            }
            ShellCommand::Whoami => {
                let session = self.app.session().current();
                render::identity(&mut self.out, session.as_ref().map(|s| s.identity()))?;
                render::menu(&mut self.out, NavigationMenu::for_session(session.as_ref()))?;
            }
            ShellCommand::Open { view } => self.open(view.into()).await?,
            ShellCommand::Filter { field, value } => {
                self.app.search().on_field_edit(field, value);
                let filter = self.app.search().filter();
                writeln!(
                    self.out,
                    "Filter: {} (searching after {} ms)",
                    display_query(filter.canonical_query().as_str()),
                    self.app.search().delay().as_millis()
                )?;
            }
            ShellCommand::Search => match self.app.search().submit().await {
                Ok(_) => self.list()?,
                Err(err) => self.report(&err)?,
            },
            ShellCommand::Navigate { address } => self.navigate(&address).await?,
            ShellCommand::List => self.list()?,
            ShellCommand::Purchase { id } => {
                let outcome = self.app.mutations().purchase(&id).await;
                self.after_mutation(outcome)?;
            }
            admin => self.dispatch_admin(admin).await?,
        }
        Ok(Flow::Continue)
    }

    async fn dispatch_admin(&mut self, command: ShellCommand) -> io::Result<()> {
        if self.app.current_view() != Some(RouteTarget::Admin) {
            return writeln!(self.out, "Open the admin view first (`open admin`).");
        }
        let mutations = self.app.mutations();
        match command {
            ShellCommand::Form { field, value } => {
                mutations.edit_field(field, value);
                render::form(&mut self.out, &mutations.form())?;
            }
            ShellCommand::Image { path } => match image::read_image(Utf8Path::new(&path)) {
                Ok(attachment) => {
                    mutations.attach_image(attachment);
                    render::form(&mut self.out, &mutations.form())?;
                }
                Err(err) => writeln!(self.out, "{err}")?,
            },
            ShellCommand::Edit { id } => {
                if mutations.begin_edit(&id).is_ok() {
                    render::form(&mut self.out, &mutations.form())?;
                }
            }
            ShellCommand::Save => {
                let outcome = mutations.submit_form().await;
                self.after_mutation(outcome)?;
            }
            ShellCommand::CancelEdit => {
                mutations.cancel_edit();
                render::form(&mut self.out, &mutations.form())?;
            }
            ShellCommand::Delete { id } => {
                let name = self.app.catalogue().find(&id).map(|item| item.name);
                mutations.request_delete(id.clone());
                render::delete_prompt(&mut self.out, &id, name.as_deref())?;
            }
            ShellCommand::Restock { id } => {
                mutations.request_restock(id);
                self.restock_prompt()?;
            }
            ShellCommand::Amount { text } => {
                mutations.set_restock_amount(text);
                self.restock_prompt()?;
            }
            ShellCommand::Confirm { dialog } => {
                let outcome = match dialog {
                    DialogArg::Delete => mutations.confirm_delete().await,
                    DialogArg::Restock => mutations.confirm_restock().await,
                };
                self.after_mutation(outcome)?;
            }
            ShellCommand::Dismiss { dialog } => match dialog {
                DialogArg::Delete => mutations.cancel_delete(),
                DialogArg::Restock => mutations.cancel_restock(),
            },
            other => debug!(?other, "not an admin command"),
        }
        Ok(())
    }

    async fn open(&mut self, requested: RouteTarget) -> io::Result<()> {
        let landed = self.app.navigate(requested).await;
        self.show_view(landed)
    }

    async fn navigate(&mut self, address: &str) -> io::Result<()> {
        let typed = self.app.location().navigate(address);
        let Some(view) = RouteTarget::from_path(&typed.path) else {
            return writeln!(self.out, "Nothing lives at {}.", typed.path);
        };
        let allowed = self.app.session().guard(view.required_access()) == GuardDecision::Allow;
        if view != RouteTarget::Home || !allowed {
            return self.open(view).await;
        }
        match self.app.search().on_location_changed().await {
            Some(Err(err)) => self.report(&err),
            Some(Ok(_)) | None => self.show_view(view),
        }
    }

    fn show_view(&mut self, view: RouteTarget) -> io::Result<()> {
        let href = self.app.location().current().href();
        render::landed(&mut self.out, view, &href)?;
        match view {
            RouteTarget::Home | RouteTarget::Admin => self.list(),
            RouteTarget::Login | RouteTarget::Register => Ok(()),
        }
    }

    fn list(&mut self) -> io::Result<()> {
        let mutations = self.app.mutations();
        render::items(&mut self.out, &self.app.catalogue().items(), |item| {
            mutations.can_purchase(&item.id)
        })
    }

    fn restock_prompt(&mut self) -> io::Result<()> {
        match self.app.mutations().pending_restock() {
            Some(pending) => render::restock_prompt(&mut self.out, &pending),
            None => Ok(()),
        }
    }

    /// Mutation failures were already notified by the controller.
    fn after_mutation(&mut self, outcome: Result<(), Error>) -> io::Result<()> {
        match outcome {
            Ok(()) => self.list(),
            Err(err) => match self.app.after_failure(&err) {
                Some(view) => self.show_view(view),
                None => Ok(()),
            },
        }
    }

    fn report(&mut self, err: &Error) -> io::Result<()> {
        match self.app.report(err) {
            Some(view) => self.show_view(view),
            None => Ok(()),
        }
    }
}

fn display_query(query: &str) -> &str {
    if query.is_empty() { "(none)" } else { query }
}
