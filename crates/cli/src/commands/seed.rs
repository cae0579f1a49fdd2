//! Catalog seeding command.

use shopfront_storefront::services::Catalog;
use shopfront_storefront::{Backends, ShopConfig};

use super::CliError;

/// Seed the demo catalog into an empty store and print the catalog.
///
/// Against the memory backend this only shows what would be seeded, since
/// the store does not outlive the process.
///
/// # Errors
///
/// Returns `CliError` if the backend cannot be created or a write fails.
pub async fn run(config: &ShopConfig) -> Result<(), CliError> {
    let backends = Backends::from_config(config).await?;
    let catalog = Catalog::new(
        backends.store().clone(),
        config.fallbacks(),
        config.catalog_ttl,
    );

    let written = catalog.seed_if_empty().await?;
    if written == 0 {
        tracing::info!("Catalog already populated, nothing seeded");
    } else {
        tracing::info!(count = written, "Seeded catalog");
    }

    let products = catalog.list_products().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:<6} {:<20} {:>10}", "ID", "NAME", "PRICE");
        for product in &products {
            println!(
                "{:<6} {:<20} {:>10}",
                product.id.as_str(),
                product.name,
                product.price.display()
            );
        }
    }

    Ok(())
}
