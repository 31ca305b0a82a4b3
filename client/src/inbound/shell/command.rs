//! Line grammar for the interactive shell.
//!
//! Each input line is split into words (double or single quotes group words)
//! and parsed with clap as one subcommand.

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::{FormField, ItemId, Role, RouteTarget, SearchField};

/// One parsed input line.
#[derive(Debug, Parser)]
#[command(
    name = "sweets",
    no_binary_name = true,
    disable_version_flag = true,
    arg_required_else_help = true
)]
pub(super) struct ShellLine {
    #[command(subcommand)]
    pub(super) command: ShellCommand,
}

#[derive(Debug, Subcommand)]
pub(super) enum ShellCommand {
    /// Sign in.
    Login { email: String, password: String },
    /// Create an account.
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    /// Sign out.
    Logout,
    /// Show who is signed in and the navigation menu.
    Whoami,
    /// Open a view.
    Open {
        #[arg(value_enum)]
        view: ViewArg,
    },
    /// Edit one search field; the search runs after a quiet period.
    Filter {
        #[arg(value_parser = parse_search_field)]
        field: SearchField,
        #[arg(default_value = "", allow_hyphen_values = true)]
        value: String,
    },
    /// Run the search now.
    Search,
    /// Type an address into the address bar, for example `/?category=cake`.
    Navigate { address: String },
    /// Show the displayed sweets.
    List,
    /// Buy one unit.
    Purchase {
        #[arg(value_parser = parse_item_id)]
        id: ItemId,
    },
    /// Edit one field of the sweet form.
    Form {
        #[arg(value_parser = parse_form_field)]
        field: FormField,
        #[arg(default_value = "", allow_hyphen_values = true)]
        value: String,
    },
    /// Attach an image file to the sweet form.
    Image { path: String },
    /// Load a displayed sweet into the form.
    Edit {
        #[arg(value_parser = parse_item_id)]
        id: ItemId,
    },
    /// Submit the sweet form.
    Save,
    /// Discard the sweet form.
    CancelEdit,
    /// Ask to delete a sweet.
    Delete {
        #[arg(value_parser = parse_item_id)]
        id: ItemId,
    },
    /// Ask to restock a sweet.
    Restock {
        #[arg(value_parser = parse_item_id)]
        id: ItemId,
    },
    /// Type the restock amount.
    Amount {
        #[arg(default_value = "", allow_hyphen_values = true)]
        text: String,
    },
    /// Confirm an open dialog.
    Confirm {
        #[arg(value_enum)]
        dialog: DialogArg,
    },
    /// Close an open dialog.
    Dismiss {
        #[arg(value_enum)]
        dialog: DialogArg,
    },
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum RoleArg {
    User,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::User => Self::User,
            RoleArg::Admin => Self::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum ViewArg {
    Home,
    Admin,
    Login,
    Register,
}

impl From<ViewArg> for RouteTarget {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Home => Self::Home,
            ViewArg::Admin => Self::Admin,
            ViewArg::Login => Self::Login,
            ViewArg::Register => Self::Register,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum DialogArg {
    Delete,
    Restock,
}

fn parse_search_field(raw: &str) -> Result<SearchField, String> {
    raw.parse().map_err(|err: crate::domain::UnknownSearchField| err.to_string())
}

fn parse_form_field(raw: &str) -> Result<FormField, String> {
    raw.parse().map_err(|err: crate::domain::UnknownFormField| err.to_string())
}

fn parse_item_id(raw: &str) -> Result<ItemId, String> {
    ItemId::new(raw).map_err(|err| err.to_string())
}

/// Unterminated quote in an input line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unterminated {0} quote")]
pub(super) struct UnterminatedQuote(char);

/// Split `line` into words. Quotes group words and may be empty (`""`).
pub(super) fn split_words(line: &str) -> Result<Vec<String>, UnterminatedQuote> {
    let mut words = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;
    for ch in line.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.get_or_insert_with(String::new).push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                current.get_or_insert_with(String::new);
            }
            None if ch.is_whitespace() => words.extend(current.take()),
            None => current.get_or_insert_with(String::new).push(ch),
        }
    }
    if let Some(open) = quote {
        return Err(UnterminatedQuote(open));
    }
    words.extend(current);
    Ok(words)
}
