//! Request signing against published reference vectors and invariants

use client_core::signing::{hmac_sha256_hex, sign, FixedClock, RequestParams, RequestSigner, SigningError};

const EXCHANGE_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

#[test]
fn test_rfc4231_case_2() {
    assert_eq!(
        hmac_sha256_hex("Jefe", b"what do ya want for nothing?").unwrap(),
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn test_exchange_documented_order() {
    let params = RequestParams::new()
        .with("symbol", "LTCBTC")
        .with("side", "BUY")
        .with("type", "LIMIT")
        .with("timeInForce", "GTC")
        .with("quantity", 1)
        .with("price", "0.1")
        .with("recvWindow", 5000);
    let signer = RequestSigner::with_clock(EXCHANGE_SECRET, FixedClock(1499827319559));
    let signed = signer.sign(&params).unwrap();

    assert_eq!(
        signed.payload(),
        "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559"
    );
    assert_eq!(
        signed.signature(),
        "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
    );
    // Caller's params are not mutated
    assert!(!params.contains_key("timestamp"));
}

#[test]
fn test_presigned_params_rejected() {
    let params = RequestParams::new().with("symbol", "BTCAUD").with("signature", "abc");
    let err = sign(&params, EXCHANGE_SECRET, &FixedClock(0)).unwrap_err();
    assert!(matches!(err, SigningError::InvalidArgument(_)));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn params() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[a-zA-Z]{1,12}", "[ -~]{0,24}"), 0..8)
    }

    proptest! {
        /// Same params, secret and clock reading give byte-identical output.
        #[test]
        fn prop_sign_deterministic(
            pairs in params(),
            secret in "[a-zA-Z0-9]{1,64}",
            now in 0i64..4_102_444_800_000i64,
        ) {
            prop_assume!(pairs.iter().all(|(k, _)| k != "signature"));
            let params: RequestParams = pairs.into_iter().collect();
            let a = sign(&params, &secret, &FixedClock(now)).unwrap();
            let b = sign(&params, &secret, &FixedClock(now)).unwrap();

            prop_assert_eq!(a.query_string(), b.query_string());
            prop_assert_eq!(a.signature().len(), 64);
            prop_assert!(a.signature().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            let stamp = format!("timestamp={now}");
            let infix = format!("{stamp}&");
            prop_assert!(
                a.payload().ends_with(&stamp) || a.payload().contains(&infix),
                "payload {} lacks {}",
                a.payload(),
                stamp
            );
        }
    }
}
