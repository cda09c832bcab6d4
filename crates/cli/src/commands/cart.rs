//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! cartsync cart add --unique-id <ID> --item-code IM31790673 --qty 1 --new-price 20
//! cartsync cart list --user-id 1007
//! cartsync cart update --cart-id 28447 --qty 2
//! cartsync cart delete --cart-id 28447
//! cartsync cart smoke --item-code IM31790673 --new-price 20
//! ```

use cartsync_client::{AddStatus, CartClient, CartConfig};
use cartsync_core::{
    CartId, CartIdentity, CartLineItem, CartSummary, ItemCode, NewCartItem, Price, Quantity,
    UniqueId, UserId,
};
use clap::{Args, Subcommand};
use tracing::info;

use crate::CliError;

#[derive(Subcommand)]
pub enum CartCommand {
    /// Add an item (bumps the quantity if already in the cart)
    Add {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Item code
        #[arg(long)]
        item_code: ItemCode,

        /// Number of units
        #[arg(long, default_value = "1", value_parser = parse_quantity)]
        qty: Quantity,

        /// Selling price
        #[arg(long)]
        new_price: Price,

        /// Price before discount (default: the selling price)
        #[arg(long)]
        old_price: Option<Price>,

        /// Discount amount
        #[arg(long)]
        discount: Option<Price>,
    },
    /// Show the cart
    List {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Print the lines as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a line's quantity
    Update {
        /// Cart line ID, as shown by `cart list`
        #[arg(long)]
        cart_id: CartId,

        /// New number of units
        #[arg(long, value_parser = parse_quantity)]
        qty: Quantity,
    },
    /// Remove a line
    Delete {
        /// Cart line ID, as shown by `cart list`
        #[arg(long)]
        cart_id: CartId,
    },
    /// Add, list, update and delete against a fresh guest session
    Smoke {
        /// Item code to exercise
        #[arg(long)]
        item_code: ItemCode,

        /// Selling price to send
        #[arg(long)]
        new_price: Price,
    },
}

/// Exactly one of `--user-id` / `--unique-id`.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct IdentityArgs {
    /// Signed-in shopper ID
    #[arg(long)]
    user_id: Option<UserId>,

    /// Guest session token (see `cartsync session new`)
    #[arg(long)]
    unique_id: Option<UniqueId>,
}

impl IdentityArgs {
    fn into_identity(self) -> Option<CartIdentity> {
        self.user_id
            .map(CartIdentity::User)
            .or_else(|| self.unique_id.map(CartIdentity::Anonymous))
    }
}

fn parse_quantity(s: &str) -> Result<Quantity, String> {
    let units: u32 = s.trim().parse().map_err(|e| format!("{e}"))?;
    Quantity::new(units).ok_or_else(|| "quantity must be at least 1".to_string())
}

/// Run a cart command.
///
/// # Errors
///
/// Returns error if configuration is missing or the backend call fails.
pub async fn run(command: CartCommand) -> Result<(), CliError> {
    let config = CartConfig::from_env()?;
    let client = CartClient::new(config)?;

    match command {
        CartCommand::Add {
            identity,
            item_code,
            qty,
            new_price,
            old_price,
            discount,
        } => {
            let identity = require_identity(identity)?;
            let mut item = NewCartItem::new(item_code, qty, new_price);
            if let Some(old_price) = old_price {
                item = item.with_old_price(old_price);
            }
            if let Some(discount) = discount {
                item = item.with_discount(discount);
            }

            let added = client.add_item(&identity, &item).await?;
            let verb = match added.status {
                AddStatus::Added => "Added",
                AddStatus::Updated => "Updated quantity of",
            };
            info!(
                "{verb} {} (code {}): {}",
                item.item_code, added.code, added.message
            );
            if let Some(cart_id) = added.item.cart_id {
                info!("  Cart line: {cart_id}");
            }
        }
        CartCommand::List { identity, json } => {
            let identity = require_identity(identity)?;
            let items = client.list_items(&identity).await?;
            if json {
                print_json(&items);
            } else {
                log_cart(&items);
            }
        }
        CartCommand::Update { cart_id, qty } => {
            client.update_quantity(Some(cart_id), qty).await?;
            info!("Cart line {cart_id} set to {qty}");
        }
        CartCommand::Delete { cart_id } => {
            client.delete_item(Some(cart_id)).await?;
            info!("Cart line {cart_id} deleted");
        }
        CartCommand::Smoke {
            item_code,
            new_price,
        } => {
            let identity = CartIdentity::new_guest();
            info!(
                "Running cart smoke test as guest {}",
                identity.unique_id_field()
            );
            smoke(&client, &identity, item_code, new_price).await?;
            info!("Smoke test passed");
        }
    }
    Ok(())
}

fn require_identity(args: IdentityArgs) -> Result<CartIdentity, CliError> {
    // clap enforces the group; this only fires if that is bypassed.
    args.into_identity().ok_or_else(|| {
        CliError::Cart(cartsync_client::CartError::PreconditionFailed(
            "--user-id or --unique-id is required".to_string(),
        ))
    })
}

fn log_cart(items: &[CartLineItem]) {
    if items.is_empty() {
        info!("Cart is empty");
        return;
    }
    for item in items {
        let cart_id = item
            .cart_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        info!(
            "  [{cart_id}] {} x{} @ {} = {}{}",
            item.item_code,
            item.quantity,
            item.new_price,
            item.line_total(),
            item.item_name
                .as_deref()
                .map(|n| format!("  ({n})"))
                .unwrap_or_default()
        );
    }
    let summary = CartSummary::of(items);
    info!(
        "{} line(s), {} unit(s), subtotal {}",
        summary.lines, summary.units, summary.subtotal
    );
}

#[allow(clippy::print_stdout)]
fn print_json(items: &[CartLineItem]) {
    match serde_json::to_string_pretty(items) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize cart"),
    }
}

/// Exercise add, list, update and delete against `identity`'s cart.
///
/// # Errors
///
/// Returns `CliError::Smoke` naming the first step whose result does not
/// match, or `CliError::Cart` if a call fails outright.
pub async fn smoke(
    client: &CartClient,
    identity: &CartIdentity,
    item_code: ItemCode,
    new_price: Price,
) -> Result<(), CliError> {
    let item = NewCartItem::new(item_code.clone(), Quantity::ONE, new_price);

    let added = client.add_item(identity, &item).await?;
    info!(status = ?added.status, code = added.code, "add: ok");

    let items = client.list_items(identity).await?;
    let line = single_line(&items, &item_code, "list after add")?;
    expect_quantity(line, 1, "list after add")?;
    let cart_id = line.cart_id;
    info!(cart_id = ?cart_id, "list after add: ok");

    let two = Quantity::new(2).ok_or_else(|| smoke_error("update", "invalid quantity"))?;
    client.update_quantity(cart_id, two).await?;
    let items = client.list_items(identity).await?;
    let line = items
        .iter()
        .find(|i| i.cart_id == cart_id)
        .ok_or_else(|| smoke_error("list after update", "line disappeared"))?;
    expect_quantity(line, 2, "list after update")?;
    info!("update: ok");

    client.delete_item(cart_id).await?;
    let items = client.list_items(identity).await?;
    if items.iter().any(|i| i.cart_id == cart_id) {
        return Err(smoke_error("list after delete", "line still present"));
    }
    info!("delete: ok");

    Ok(())
}

fn single_line<'a>(
    items: &'a [CartLineItem],
    item_code: &ItemCode,
    step: &'static str,
) -> Result<&'a CartLineItem, CliError> {
    let mut matching = items.iter().filter(|i| &i.item_code == item_code);
    match (matching.next(), matching.next()) {
        (Some(line), None) => Ok(line),
        (None, _) => Err(smoke_error(step, format!("no line for {item_code}"))),
        (Some(_), Some(_)) => Err(smoke_error(
            step,
            format!("more than one line for {item_code}"),
        )),
    }
}

fn expect_quantity(line: &CartLineItem, expected: u32, step: &'static str) -> Result<(), CliError> {
    if line.quantity.get() == expected {
        Ok(())
    } else {
        Err(smoke_error(
            step,
            format!("expected qty {expected}, got {}", line.quantity),
        ))
    }
}

fn smoke_error(step: &'static str, reason: impl Into<String>) -> CliError {
    CliError::Smoke {
        step,
        reason: reason.into(),
    }
}
