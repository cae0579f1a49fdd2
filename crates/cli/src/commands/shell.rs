//! Interactive shell.
//!
//! A line-oriented view over [`Shop`]. Commands:
//!
//! ```text
//! products                          list the catalog
//! login <email> <password>          sign in
//! signup <email> <name> <password>  create an account (name may not contain spaces)
//! logout                            sign out
//! add|inc|dec <product-id>          edit the cart
//! cart [--json]                     show the cart
//! clear                             empty the cart
//! checkout                          place an order
//! quit                              leave
//! ```
//!
//! The cart is redrawn whenever the shop reports a change.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use shopfront_core::ProductId;
use shopfront_storefront::models::{CartSnapshot, SessionState};
use shopfront_storefront::{Backends, Shop, ShopConfig, ShopError, ShopEvent};

use super::CliError;

/// A parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Products,
    Login { email: String, password: String },
    Signup { email: String, name: String, password: String },
    Logout,
    Add(ProductId),
    Increase(ProductId),
    Decrease(ProductId),
    Cart { json: bool },
    Clear,
    Checkout,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Ok(None),
            ["products"] => Self::Products,
            ["login", email, password] => Self::Login {
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            ["signup", email, name, password] => Self::Signup {
                email: (*email).to_string(),
                name: (*name).to_string(),
                password: (*password).to_string(),
            },
            ["logout"] => Self::Logout,
            ["add", id] => Self::Add(ProductId::new(*id)),
            ["inc", id] => Self::Increase(ProductId::new(*id)),
            ["dec", id] => Self::Decrease(ProductId::new(*id)),
            ["cart"] => Self::Cart { json: false },
            ["cart", "--json"] => Self::Cart { json: true },
            ["clear"] => Self::Clear,
            ["checkout"] => Self::Checkout,
            ["help"] => Self::Help,
            ["quit" | "exit"] => Self::Quit,
            [other, ..] => return Err(format!("Unknown command '{other}'. Type 'help'.")),
        };
        Ok(Some(command))
    }
}

/// Run the shell until `quit` or end of input.
///
/// # Errors
///
/// Returns `CliError` if the backend cannot be created or stdin fails.
/// Shop errors are printed and the shell keeps going.
pub async fn run(config: &ShopConfig) -> Result<(), CliError> {
    let backends = Backends::from_config(config).await?;
    let mut shop = Shop::new(&backends, config).await;
    let mut events = shop.subscribe();

    shop.refresh_session().await?;
    say("Welcome to Shopfront. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(shop.session());
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                say(&message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        if let Err(e) = execute(&mut shop, command).await {
            e.report();
            say(&e.user_message());
        }
        redraw(&mut events);
    }

    Ok(())
}

async fn execute(shop: &mut Shop, command: Command) -> Result<(), ShopError> {
    match command {
        Command::Products => {
            for product in shop.products().await? {
                say(&format!(
                    "  {:<6} {:<20} {:>10}",
                    product.id.as_str(),
                    product.name,
                    product.price.display()
                ));
            }
        }
        Command::Login { email, password } => {
            let identity = shop.sign_in(&email, &password).await?;
            say(&format!("Welcome back, {}.", identity.display_name));
        }
        Command::Signup {
            email,
            name,
            password,
        } => {
            let identity = shop.sign_up(&email, &name, &password).await?;
            say(&format!("Account created. Welcome, {}.", identity.display_name));
        }
        Command::Logout => {
            shop.sign_out().await?;
            say("Signed out.");
        }
        Command::Add(id) => {
            shop.add_to_cart(&id).await?;
        }
        Command::Increase(id) => {
            shop.increase(&id).await?;
        }
        Command::Decrease(id) => {
            shop.decrease(&id).await?;
        }
        Command::Cart { json: false } => render_cart(&shop.cart()),
        Command::Cart { json: true } => match serde_json::to_string_pretty(&shop.cart()) {
            Ok(text) => say(&text),
            Err(e) => tracing::warn!(error = %e, "Could not encode cart"),
        },
        Command::Clear => {
            shop.clear_cart().await?;
        }
        Command::Checkout => {
            let order = shop.place_order().await?;
            say(&format!(
                "Order {} placed: {} item(s), {}.",
                order.id,
                order.item_count(),
                order.total.display()
            ));
        }
        Command::Help => say(HELP),
        Command::Quit => {}
    }
    Ok(())
}

const HELP: &str = "\
  products                          list the catalog
  login <email> <password>          sign in
  signup <email> <name> <password>  create an account
  logout                            sign out
  add|inc|dec <product-id>          edit the cart
  cart [--json]                     show the cart
  clear                             empty the cart
  checkout                          place an order
  quit                              leave";

/// Drain pending events and redraw the cart once if it changed.
fn redraw(events: &mut broadcast::Receiver<ShopEvent>) {
    let mut latest = None;
    while let Ok(event) = events.try_recv() {
        if let ShopEvent::CartChanged(cart) = event {
            latest = Some(cart);
        }
    }
    if let Some(cart) = latest {
        render_cart(&cart);
    }
}

fn render_cart(cart: &CartSnapshot) {
    if cart.is_empty() {
        say("Your cart is empty.");
        return;
    }
    for line in &cart.lines {
        say(&format!(
            "  {:<6} {:<20} {:>3} x {:>10} = {:>10}",
            line.product_id.as_str(),
            line.name,
            line.quantity,
            line.price.display(),
            line.line_total().display()
        ));
    }
    say(&format!(
        "  {} item(s), total {}",
        cart.count,
        cart.total.display()
    ));
}

fn prompt(session: &SessionState) {
    let who = session
        .identity()
        .map_or("guest", |identity| identity.email.as_str());

    #[allow(clippy::print_stdout)]
    {
        use std::io::Write;
        print!("{who}> ");
        let _ = std::io::stdout().flush();
    }
}

#[allow(clippy::print_stdout)]
fn say(message: &str) {
    println!("{message}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("add p1").unwrap(),
            Some(Command::Add(ProductId::new("p1")))
        );
        assert_eq!(
            Command::parse("login a@b.co secret1").unwrap(),
            Some(Command::Login {
                email: "a@b.co".to_string(),
                password: "secret1".to_string(),
            })
        );
        assert_eq!(
            Command::parse("cart --json").unwrap(),
            Some(Command::Cart { json: true })
        );
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_unknown_and_bad_arity() {
        assert!(Command::parse("dance").is_err());
        assert!(Command::parse("add").is_err());
        assert!(Command::parse("login only-email").is_err());
    }
}
