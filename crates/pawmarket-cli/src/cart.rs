//! `cart` command handlers. Every mutation is written back to the cart file
//! before returning.

use clap::Subcommand;
use pawmarket_checkout::presenter::render_cart;
use pawmarket_core::{CartItem, ProductId};

use crate::Context;

/// Sub-commands available under `cart`.
#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Add a product, looking up its current price and vendor
    Add {
        product_id: i64,
        #[arg(long, short, default_value = "1")]
        quantity: u32,
    },
    /// Set the quantity of a product already in the cart (0 or less removes it)
    Set {
        product_id: i64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove { product_id: i64 },
    /// Show cart contents and subtotal
    Show,
    /// Empty the cart and drop any applied coupon
    Clear,
}

pub(crate) async fn run(ctx: &Context, command: CartCommands) -> anyhow::Result<()> {
    let session = ctx.session().await?;

    match command {
        CartCommands::Add {
            product_id,
            quantity,
        } => {
            let detail = ctx.client.get_product(ProductId(product_id)).await?;
            let mut item = CartItem::new(detail.id, detail.name.clone(), detail.price)
                .with_quantity(quantity);
            item.vendor_id = detail.vendor_id;
            item.image_url = detail.image_url;
            item.store_name = detail.store_name;

            session.cart.lock().await.add_item(item)?;
            ctx.save(&session).await?;
            println!("added {quantity} x {} to the cart", detail.name);
        }
        CartCommands::Set {
            product_id,
            quantity,
        } => {
            let changed = session
                .cart
                .lock()
                .await
                .update_quantity(ProductId(product_id), quantity)?;
            if changed {
                ctx.save(&session).await?;
                println!("cart updated");
            } else {
                println!("nothing to change");
            }
        }
        CartCommands::Remove { product_id } => {
            let removed = session.cart.lock().await.remove_item(ProductId(product_id));
            if removed {
                ctx.save(&session).await?;
                println!("removed product {product_id}");
            } else {
                println!("product {product_id} is not in the cart");
            }
        }
        CartCommands::Show => {}
        CartCommands::Clear => {
            session.cart.lock().await.clear();
            ctx.save(&session).await?;
            println!("cart cleared");
            return Ok(());
        }
    }

    print!("{}", render_cart(&session.cart.snapshot().await));
    Ok(())
}
