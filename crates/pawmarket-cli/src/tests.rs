use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pawmarket"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_cart_add_with_default_quantity() {
    let cli = Cli::try_parse_from(["pawmarket", "cart", "add", "42"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Add {
                product_id: 42,
                quantity: 1
            }
        })
    ));
}

#[test]
fn parses_cart_set_with_negative_quantity() {
    let cli = Cli::try_parse_from(["pawmarket", "cart", "set", "42", "-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Set {
                product_id: 42,
                quantity: -1
            }
        })
    ));
}

#[test]
fn parses_coupon_apply() {
    let cli = Cli::try_parse_from(["pawmarket", "coupon", "apply", "guau10"]).unwrap();
    match cli.command {
        Some(Commands::Coupon {
            command: CouponCommands::Apply { code },
        }) => assert_eq!(code, "guau10"),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_pickup_quote_without_address() {
    let cli = Cli::try_parse_from(["pawmarket", "quote", "--pickup"]).unwrap();
    let Some(Commands::Quote(delivery)) = cli.command else {
        panic!("expected quote command");
    };
    assert_eq!(delivery.method(), DeliveryMethod::Pickup);
    assert!(delivery.address().is_none());
}

#[test]
fn parses_checkout_with_full_address() {
    let cli = Cli::try_parse_from([
        "pawmarket",
        "checkout",
        "--region",
        "Metropolitana",
        "--comuna",
        "Providencia",
        "--street",
        "Av. Providencia 1234",
        "--dwelling",
        "departamento",
        "--lat",
        "-33.4263",
        "--lon",
        "-70.6190",
        "--payment-method",
        "webpay",
    ])
    .unwrap();

    let Some(Commands::Checkout {
        delivery,
        payment_method,
        ..
    }) = cli.command
    else {
        panic!("expected checkout command");
    };
    assert_eq!(payment_method.as_deref(), Some("webpay"));
    let address = delivery.address().unwrap();
    assert!(address.is_complete());
    assert_eq!(address.dwelling_type, DwellingType::Apartment);
    let location = address.location.unwrap();
    assert!((location.lat - -33.4263).abs() < 1e-9);
}

#[test]
fn lat_without_lon_is_rejected() {
    let result = Cli::try_parse_from(["pawmarket", "quote", "--lat", "-33.4"]);
    assert!(result.is_err());
}

#[test]
fn parses_address_suggest_with_scope() {
    let cli = Cli::try_parse_from([
        "pawmarket",
        "address",
        "suggest",
        "los leones 456",
        "--comuna",
        "Providencia",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Address {
            command:
                AddressCommands::Suggest {
                    query,
                    region,
                    comuna,
                },
        }) => {
            assert_eq!(query, "los leones 456");
            assert!(region.is_none());
            assert_eq!(comuna.as_deref(), Some("Providencia"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
