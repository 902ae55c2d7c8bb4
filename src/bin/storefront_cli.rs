use std::{str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use storefront_api::{
    auth::AuthService,
    client::{ClientError, HttpStorefrontClient, StorefrontApi},
    config,
    entities::user::{ROLE_ADMIN, ROLE_USER},
    services::{
        commerce::{
            cart::{Cart, CartAction, CartLine},
            checkout::CheckoutResult,
            checkout_flow::{CheckoutError, CheckoutFlow},
        },
        shipping::{CourierCostRequest, CourierOption},
    },
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "storefront-cli", about = "Command line client for the storefront API")]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[arg(
        long,
        global = true,
        env = "STOREFRONT_URL",
        default_value = "http://localhost:8080/api/v1",
        help = "Versioned API root of the storefront server"
    )]
    base_url: String,
    #[arg(
        long,
        global = true,
        env = "STOREFRONT_TOKEN",
        hide_env_values = true,
        help = "Bearer token sent with every request"
    )]
    token: Option<String>,
    #[arg(long, global = true, default_value_t = 15, help = "Request timeout in seconds")]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a bearer token with the server's configured secret
    Token(TokenArgs),
    /// List shipping destinations
    Cities,
    /// Look up a voucher's discount
    Voucher(VoucherArgs),
    /// Quote couriers for a destination and parcel weight
    Couriers(CouriersArgs),
    /// Build a cart and place an order with payment
    Checkout(CheckoutArgs),
}

#[derive(Args)]
struct TokenArgs {
    #[arg(long, help = "Numeric user id placed in the token subject")]
    user_id: i32,
    #[arg(long, help = "Display name claim")]
    name: Option<String>,
    #[arg(long, help = "Email claim")]
    email: Option<String>,
    #[arg(long, action = ArgAction::SetTrue, help = "Grant the admin role")]
    admin: bool,
}

#[derive(Args)]
struct VoucherArgs {
    code: String,
}

#[derive(Args)]
struct CouriersArgs {
    #[arg(long, help = "Destination city id")]
    destination: String,
    #[arg(long, help = "Parcel weight in grams")]
    weight: u32,
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(
        long = "item",
        required = true,
        help = "Item to buy as ID or ID:QUANTITY; repeat for more lines"
    )]
    items: Vec<ItemSpec>,
    #[arg(long, help = "Destination city id")]
    city: String,
    #[arg(long, help = "Delivery address")]
    address: String,
    #[arg(long, help = "Courier option name; defaults to the cheapest quote")]
    courier: Option<String>,
    #[arg(long, help = "Voucher code to apply")]
    voucher: Option<String>,
    #[arg(long, default_value_t = 1000, help = "Weight of one unit in grams")]
    item_weight: u32,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Submit order and payment through the single transactional endpoint"
    )]
    atomic: bool,
}

#[derive(Debug, Clone, Copy)]
struct ItemSpec {
    id: i32,
    quantity: u32,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = match raw.split_once(':') {
            Some((id, quantity)) => (id, quantity),
            None => (raw, "1"),
        };
        let id = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid item id in '{raw}'"))?;
        let quantity = quantity
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity in '{raw}'"))?;
        if quantity == 0 {
            return Err(format!("quantity must be at least 1 in '{raw}'"));
        }
        Ok(Self { id, quantity })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Token(args) => handle_token(args, cli.json)?,
        Commands::Cities => handle_cities(&client(&cli)?, cli.json).await?,
        Commands::Voucher(args) => handle_voucher(&client(&cli)?, args, cli.json).await?,
        Commands::Couriers(args) => handle_couriers(&client(&cli)?, args, cli.json).await?,
        Commands::Checkout(args) => handle_checkout(client(&cli)?, args, cli.json).await?,
    }

    Ok(())
}

fn client(cli: &Cli) -> Result<HttpStorefrontClient> {
    HttpStorefrontClient::new(
        &cli.base_url,
        cli.token.clone(),
        Duration::from_secs(cli.timeout_secs),
    )
    .context("failed to build storefront client")
}

/// Turns a client failure into a readable error, preferring the server's message
fn describe(err: ClientError) -> anyhow::Error {
    match err.server_message() {
        Some(message) => anyhow!("{message}"),
        None => anyhow!(err),
    }
}

fn describe_checkout(err: CheckoutError) -> anyhow::Error {
    match err {
        CheckoutError::Api(client_err) => describe(client_err),
        other => anyhow!(other),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_token(args: &TokenArgs, json: bool) -> Result<()> {
    let cfg = config::load_config().context("failed to load server configuration")?;
    let auth = AuthService::new((&cfg).into());

    let mut roles = vec![ROLE_USER.to_string()];
    if args.admin {
        roles.push(ROLE_ADMIN.to_string());
    }

    let token = auth
        .issue_token(args.user_id, args.name.clone(), args.email.clone(), roles)
        .context("failed to issue token")?;

    if json {
        print_json(&serde_json::json!({ "token": token }))?;
    } else {
        println!("{token}");
    }
    Ok(())
}

async fn handle_cities(api: &impl StorefrontApi, json: bool) -> Result<()> {
    let cities = api.cities().await.map_err(describe)?;
    if json {
        return print_json(&cities);
    }
    for city in &cities {
        println!("{:>5}  {}", city.value, city.label);
    }
    Ok(())
}

async fn handle_voucher(api: &impl StorefrontApi, args: &VoucherArgs, json: bool) -> Result<()> {
    if args.code.trim().is_empty() {
        bail!("Voucher code must not be empty!");
    }
    let voucher = api.voucher(args.code.trim()).await.map_err(describe)?;
    if json {
        print_json(&voucher)
    } else {
        println!("{} gives {}% off", args.code.trim(), voucher.discount);
        Ok(())
    }
}

async fn handle_couriers(api: &impl StorefrontApi, args: &CouriersArgs, json: bool) -> Result<()> {
    let request = CourierCostRequest {
        destination: args.destination.clone(),
        weight: args.weight,
    };
    let options = api.courier_costs(&request).await.map_err(describe)?;
    if json {
        return print_json(&options);
    }
    for option in &options {
        render_courier(option);
    }
    Ok(())
}

fn render_courier(option: &CourierOption) {
    println!(
        "- {} • {} • etd {}",
        option.name,
        option.cost,
        option.etd.as_deref().unwrap_or("?")
    );
}

async fn build_cart(api: &impl StorefrontApi, specs: &[ItemSpec]) -> Result<Cart> {
    let mut cart = Cart::new();
    for spec in specs {
        let item = api
            .item(spec.id)
            .await
            .map_err(describe)
            .with_context(|| format!("failed to look up item {}", spec.id))?;
        cart.dispatch(CartAction::Add(CartLine {
            item_id: item.id,
            name: item.name,
            unit_price: item.price,
            quantity: spec.quantity,
        }))?;
    }
    Ok(cart)
}

async fn handle_checkout(api: HttpStorefrontClient, args: &CheckoutArgs, json: bool) -> Result<()> {
    let cart = build_cart(&api, &args.items).await?;
    let mut flow = CheckoutFlow::new(api, cart, args.item_weight);

    flow.load_destinations().await.map_err(describe_checkout)?;

    if let Some(code) = &args.voucher {
        flow.set_voucher_input(code.clone());
        if let Err(err) = flow.apply_voucher().await {
            eprintln!("voucher not applied: {}", describe_checkout(err));
        }
    }

    flow.select_destination(&args.city)
        .map_err(describe_checkout)?;
    flow.set_address(args.address.clone());

    let options = flow
        .fetch_courier_options()
        .await
        .map_err(describe_checkout)?
        .to_vec();
    let chosen = match &args.courier {
        Some(name) => name.clone(),
        None => options
            .iter()
            .min_by_key(|option| option.cost)
            .map(|option| option.name.clone())
            .ok_or_else(|| anyhow!("no courier serves this destination"))?,
    };
    flow.choose_courier(&chosen).map_err(describe_checkout)?;
    debug!(courier = %chosen, weight = flow.total_weight(), "Courier chosen");

    if !json {
        println!("Subtotal:  {}", flow.cart().total_price());
        println!("Discount: -{} ({}%)", flow.discount_amount(), flow.discount());
        if let Some(courier) = flow.courier() {
            println!("Delivery:  {} via {}", courier.cost, courier.name);
        }
        println!("Total:     {}", flow.final_price());
    }

    let receipt = if args.atomic {
        flow.finish_order_atomic().await
    } else {
        flow.finish_order().await
    }
    .map_err(describe_checkout)?;

    if json {
        print_json(&receipt)
    } else {
        render_receipt(&receipt);
        Ok(())
    }
}

fn render_receipt(receipt: &CheckoutResult) {
    println!("Order {} placed with {} line(s)", receipt.order_id, receipt.orders.len());
    println!(
        "Payment #{} • {} • pay before {}",
        receipt.payment.id,
        receipt.payment.final_price,
        receipt.payment.expired_time.to_rfc3339()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_spec_defaults_quantity_to_one() {
        let spec: ItemSpec = "12".parse().unwrap();
        assert_eq!((spec.id, spec.quantity), (12, 1));

        let spec: ItemSpec = "3:4".parse().unwrap();
        assert_eq!((spec.id, spec.quantity), (3, 4));
    }

    #[test]
    fn item_spec_rejects_zero_quantity() {
        assert!("3:0".parse::<ItemSpec>().is_err());
        assert!("abc".parse::<ItemSpec>().is_err());
    }
}
