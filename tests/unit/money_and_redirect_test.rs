// Property-based tests for the two pure pieces of the payment path:
// minor-unit money conversion and redirect URL sanitization.

use proptest::prelude::*;
use rust_decimal::Decimal;

use rainbowpay::core::Currency;
use rainbowpay::modules::payments::services::RedirectPolicy;

fn policy() -> RedirectPolicy {
    RedirectPolicy::new(
        "https://app.rainbowbridge.ph",
        "/payments/success",
        "/payments/failed",
    )
    .unwrap()
}

proptest! {
    // Any whole-centavo amount survives the round trip to the gateway's
    // integer representation and back.
    #[test]
    fn test_minor_units_round_trip(centavos in 1i64..1_000_000_000_000i64) {
        let amount = Currency::PHP.from_minor_units(centavos);
        let minor = Currency::PHP.to_minor_units(amount).unwrap();
        prop_assert_eq!(minor, centavos);
        prop_assert_eq!(Currency::PHP.from_minor_units(minor), amount);
    }

    // Sub-centavo precision can never reach the gateway.
    #[test]
    fn test_fractional_centavos_rejected(centavos in 1i64..1_000_000i64, frac in 1u32..10u32) {
        // e.g. 123.451 pesos
        let amount = Decimal::new(centavos * 10 + frac as i64, 3);
        if amount.normalize().scale() > 2 {
            prop_assert!(Currency::PHP.to_minor_units(amount).is_err());
        }
    }

    #[test]
    fn test_non_positive_amounts_rejected(centavos in 0i64..1_000_000i64) {
        let amount = Currency::PHP.from_minor_units(-centavos);
        prop_assert!(Currency::PHP.to_minor_units(amount).is_err());
    }

    // A redirect pointed at any other host is always replaced with the
    // configured default, never passed through.
    #[test]
    fn test_foreign_host_never_survives(host in "[a-z]{3,12}\\.(com|net|org)", path in "[a-z0-9/]{0,20}") {
        prop_assume!(host != "app.rainbowbridge.ph");
        let candidate = format!("https://{}/{}", host, path);
        let urls = policy().resolve(Some(&candidate), Some(&candidate));
        prop_assert_eq!(urls.success_url, "https://app.rainbowbridge.ph/payments/success");
        prop_assert_eq!(urls.failure_url, "https://app.rainbowbridge.ph/payments/failed");
    }

    // Same-origin URLs are honored verbatim.
    #[test]
    fn test_same_origin_survives(path in "[a-z0-9]{1,10}(/[a-z0-9]{1,10}){0,3}") {
        let candidate = format!("https://app.rainbowbridge.ph/{}", path);
        let urls = policy().resolve(Some(&candidate), None);
        prop_assert_eq!(urls.success_url, candidate);
    }

    // Whatever garbage comes in, the resolved URLs always point at the
    // configured origin.
    #[test]
    fn test_resolved_urls_always_on_own_origin(garbage in ".{0,40}") {
        let urls = policy().resolve(Some(&garbage), Some(&garbage));
        prop_assert!(urls.success_url.starts_with("https://app.rainbowbridge.ph/"));
        prop_assert!(urls.failure_url.starts_with("https://app.rainbowbridge.ph/"));
    }
}
