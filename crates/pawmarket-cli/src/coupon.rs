use std::time::Duration;

use clap::Subcommand;
use pawmarket_checkout::presenter::render_cart;
use pawmarket_checkout::CouponValidator;

use crate::Context;

/// Sub-commands available under `coupon`.
#[derive(Debug, Subcommand)]
pub enum CouponCommands {
    /// Validate a code and apply it to the cart, replacing any previous coupon
    Apply { code: String },
    /// Remove the applied coupon
    Clear,
}

pub(crate) async fn run(ctx: &Context, command: CouponCommands) -> anyhow::Result<()> {
    let session = ctx.session().await?;

    match command {
        CouponCommands::Apply { code } => {
            let validator =
                CouponValidator::new(Duration::from_secs(ctx.config.request_timeout_secs));
            match validator.apply(&ctx.client, &session.cart, &code).await {
                Ok(coupon) => {
                    ctx.save(&session).await?;
                    println!("coupon {} applied", coupon.code);
                }
                Err(rejection) => {
                    anyhow::bail!("coupon not applied: {rejection}");
                }
            }
        }
        CouponCommands::Clear => {
            let removed = session.cart.lock().await.clear_coupon();
            match removed {
                Some(coupon) => {
                    ctx.save(&session).await?;
                    println!("coupon {} removed", coupon.code);
                }
                None => println!("no coupon applied"),
            }
        }
    }

    print!("{}", render_cart(&session.cart.snapshot().await));
    Ok(())
}
