//! Plain-text views for the shell.

use std::io::{self, Write};

use crate::domain::mutations::PendingRestock;
use crate::domain::{FormField, Identity, Item, ItemForm, ItemId, NavigationMenu, RouteTarget};

pub(super) fn items(
    out: &mut impl Write,
    items: &[Item],
    purchasable: impl Fn(&Item) -> bool,
) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No sweets to show.");
    }
    writeln!(
        out,
        "{:<14} {:<22} {:<14} {:>8} {:>6}",
        "id", "name", "category", "price", "stock"
    )?;
    for item in items {
        let status = if !item.in_stock() {
            "  sold out"
        } else if purchasable(item) {
            ""
        } else {
            "  busy"
        };
        writeln!(
            out,
            "{:<14} {:<22} {:<14} {:>8.2} {:>6}{status}",
            item.id.as_str(),
            item.name,
            item.category,
            item.price,
            item.quantity,
        )?;
    }
    Ok(())
}

pub(super) fn identity(out: &mut impl Write, identity: Option<&Identity>) -> io::Result<()> {
    match identity {
        Some(who) => writeln!(
            out,
            "Signed in as {} <{}> ({})",
            who.name(),
            who.email(),
            who.role()
        ),
        None => writeln!(out, "Not signed in."),
    }
}

pub(super) fn menu(out: &mut impl Write, menu: NavigationMenu) -> io::Result<()> {
    let mut links = vec![RouteTarget::Home.path()];
    if menu.show_admin {
        links.push(RouteTarget::Admin.path());
    }
    if menu.show_sign_in {
        links.extend([RouteTarget::Login.path(), RouteTarget::Register.path()]);
    }
    let logout = if menu.show_logout { " | logout" } else { "" };
    writeln!(out, "Menu: {}{logout}", links.join(" "))
}

pub(super) fn landed(out: &mut impl Write, view: RouteTarget, href: &str) -> io::Result<()> {
    writeln!(out, "Viewing {} at {href}", view_name(view))
}

pub(super) fn form(out: &mut impl Write, form: &ItemForm) -> io::Result<()> {
    match form.editing() {
        Some(id) => writeln!(out, "Editing {id}")?,
        None => writeln!(out, "New sweet")?,
    }
    for field in FormField::ALL {
        writeln!(out, "  {field:<9} {}", form.get(field))?;
    }
    if let Some(image) = form.image() {
        writeln!(out, "  {:<9} {} ({} bytes)", "image", image.file_name, image.bytes.len())?;
    }
    Ok(())
}

pub(super) fn delete_prompt(out: &mut impl Write, id: &ItemId, name: Option<&str>) -> io::Result<()> {
    writeln!(
        out,
        "Delete {}? Type `confirm delete` or `dismiss delete`.",
        name.unwrap_or(id.as_str())
    )
}

pub(super) fn restock_prompt(out: &mut impl Write, pending: &PendingRestock) -> io::Result<()> {
    writeln!(
        out,
        "Restock {} by `{}`. Type `amount <n>`, then `confirm restock` or `dismiss restock`.",
        pending.id, pending.amount
    )
}

const fn view_name(view: RouteTarget) -> &'static str {
    match view {
        RouteTarget::Home => "storefront",
        RouteTarget::Admin => "admin",
        RouteTarget::Login => "login",
        RouteTarget::Register => "register",
    }
}
