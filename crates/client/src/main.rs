//! `aquaroute` command-line entry point.

use anyhow::{Context, bail};

use aquaroute_client::{AppContext, ClientConfig};
use aquaroute_core::{AdjustmentId, ProductId};
use aquaroute_gateway::{Role, SessionContext, SessionUser};

const USAGE: &str = "usage: aquaroute <command>

commands:
  products
  clients [search]
  adjustments
  register-stock <product_id> <quantity> [description]
  finalize <adjustment_id>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to read AQUAROUTE_* configuration")?;
    aquaroute_observability::init_with(config.log_format);

    let session = match (&config.token, config.user_id) {
        (Some(token), Some(user_id)) => {
            tracing::info!(%user_id, "session seeded from environment");
            SessionContext::signed_in(
                token.clone(),
                SessionUser {
                    id: user_id,
                    name: "aquaroute-cli".to_string(),
                    email: String::new(),
                    role: Role::Admin,
                },
            )
        }
        _ => {
            tracing::info!("no session token configured; write commands will be rejected");
            SessionContext::new()
        }
    };

    let app = AppContext::connect(&config, session).context("failed to build HTTP client")?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["products"] => {
            for p in app.catalog().products().await? {
                let stock = p.stock.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}\t{}\t{}", p.id, p.sku, p.name, p.sale_price, stock);
            }
        }
        ["clients", rest @ ..] => {
            let search = rest.join(" ");
            for c in app.catalog().clients(&search).await? {
                println!("{}\t{}\t{}", c.id, c.name, c.phone.as_deref().unwrap_or("-"));
            }
        }
        ["adjustments"] => {
            for record in app.catalog().adjustments().await? {
                let adj = &record.attributes;
                println!(
                    "{}\t{}\t{:?}\t{} item(s)\t{}",
                    record.id,
                    adj.kind().as_str(),
                    adj.status(),
                    record.related_items.len(),
                    adj.description().unwrap_or("")
                );
            }
        }
        ["register-stock", product_id, quantity, description @ ..] => {
            let product_id: ProductId = product_id.parse().context("invalid product id")?;
            let quantity: i64 = quantity.parse().context("invalid quantity")?;
            let description = description.join(" ");

            let product = app.catalog().product(product_id).await?;
            let receipt = app
                .adjustments()
                .register_stock(&product, quantity, Some(description.as_str()))
                .await
                .context("stock registration failed")?;
            println!("adjustment {} finalized ({})", receipt.header_id, receipt.commit_id);
        }
        ["finalize", adjustment_id] => {
            let id: AdjustmentId = adjustment_id.parse().context("invalid adjustment id")?;
            let receipt = app
                .adjustments()
                .finalize_existing(id)
                .await
                .context("finalize failed")?;
            println!("adjustment {} finalized ({})", receipt.header_id, receipt.commit_id);
        }
        _ => bail!("{USAGE}"),
    }

    Ok(())
}
