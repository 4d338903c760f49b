//! `quote`, `address suggest` and `checkout` handlers.

use std::time::Duration;

use pawmarket_checkout::presenter::{render_confirmation, render_partial_failure, render_quote};
use pawmarket_checkout::{
    suggest_addresses, CancelSignal, CheckoutError, CheckoutOrchestrator, CheckoutRequest,
    CheckoutSettings, CheckoutState,
};
use pawmarket_core::round_for_display;

use crate::{Context, DeliveryArgs};

pub(crate) async fn run_quote(ctx: &Context, delivery: &DeliveryArgs) -> anyhow::Result<()> {
    let session = ctx.session().await?;
    if session.cart.lock().await.is_empty() {
        println!("the cart is empty; add products with `cart add` first");
        return Ok(());
    }

    let orchestrator =
        CheckoutOrchestrator::new(ctx.client.clone(), CheckoutSettings::from_config(&ctx.config));
    let address = delivery.address();
    let quote = orchestrator
        .quote(&session, delivery.method(), address.as_ref())
        .await;
    print!("{}", render_quote(&quote));
    Ok(())
}

pub(crate) async fn run_address_suggest(
    ctx: &Context,
    query: &str,
    region: Option<&str>,
    comuna: Option<&str>,
) -> anyhow::Result<()> {
    let suggestions = suggest_addresses(
        &ctx.client,
        query,
        region,
        comuna,
        Duration::from_secs(ctx.config.request_timeout_secs),
    )
    .await;

    if suggestions.is_empty() {
        println!("no suggestions for '{query}'");
        return Ok(());
    }

    let origin = ctx.config.origin;
    println!("{:<4}{:<10}{:<24}ADDRESS", "#", "KM", "COORDINATES");
    for (index, s) in suggestions.iter().enumerate() {
        let km = round_for_display(pawmarket_core::distance_km(
            origin.lat, origin.lon, s.lat, s.lon,
        ));
        println!(
            "{:<4}{:<10.1}{:<24}{}",
            index + 1,
            km,
            format!("{:.5},{:.5}", s.lat, s.lon),
            s.display
        );
    }
    println!();
    println!("use --street \"<street>\" --lat <lat> --lon <lon> with `quote` or `checkout`");
    Ok(())
}

pub(crate) async fn run_checkout(
    ctx: &Context,
    delivery: &DeliveryArgs,
    payment_method: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    let session = ctx.session().await?;
    let orchestrator =
        CheckoutOrchestrator::new(ctx.client.clone(), CheckoutSettings::from_config(&ctx.config));

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling after the current order; placed orders stay valid");
            on_interrupt.cancel();
        }
    });

    let mut progress = orchestrator.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let state = *progress.borrow_and_update();
            if let CheckoutState::Submitting { current, total } = state {
                eprintln!("placing order {current} of {total}...");
            }
        }
    });

    let request = CheckoutRequest {
        delivery_method: delivery.method(),
        address: delivery.address(),
        payment_method,
        customer_email: email,
    };
    let outcome = orchestrator.checkout(&session, request, &cancel).await;
    interrupt.abort();
    drop(orchestrator);
    let _ = reporter.await;

    // Vendor lookups enrich the cart even when checkout stops early.
    ctx.save(&session).await?;

    match outcome {
        Ok(confirmation) => {
            print!("{}", render_confirmation(&confirmation));
            Ok(())
        }
        Err(CheckoutError::Submission(failure)) => {
            print!("{}", render_partial_failure(&failure));
            anyhow::bail!("checkout did not complete")
        }
        Err(err) => Err(err.into()),
    }
}
