//! Venue client tests against a mocked HTTP server.

use rust_decimal_macros::dec;
use serde_json::json;
use signal_rotator::config::VenueConfig;
use signal_rotator::exchange::{OrderSide, RoostooClient, TradingVenue, VenueError};
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RoostooClient {
    RoostooClient::new(&VenueConfig {
        api_key: "test-key".to_string(),
        secret_key: "test-secret".to_string(),
        base_url: server.uri(),
    })
    .unwrap()
}

#[tokio::test]
async fn exchange_rules_map_pair_precisions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TradePairs": {
                "BTC/USD": {"AmountPrecision": 4},
                "SHIB/USD": {"AmountPrecision": 0}
            }
        })))
        .mount(&server)
        .await;

    let rules = client_for(&server).exchange_rules().await.unwrap();
    assert_eq!(rules["BTC/USD"], 4);
    assert_eq!(rules["SHIB/USD"], 0);
}

#[tokio::test]
async fn exchange_rules_empty_map_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"TradePairs": {}})))
        .mount(&server)
        .await;

    let result = client_for(&server).exchange_rules().await;
    assert!(matches!(result, Err(VenueError::Rejected(_))));
}

#[tokio::test]
async fn wallet_splits_cash_from_holdings_and_drops_dust() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/balance"))
        .and(header_exists("RST-API-KEY"))
        .and(header_exists("MSG-SIGNATURE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "SpotWallet": {
                "USD": {"Free": 25000.5, "Lock": 100},
                "BTC": {"Free": 0.4, "Lock": 0.1},
                "DUST": {"Free": 0.000000001, "Lock": 0}
            }
        })))
        .mount(&server)
        .await;

    let wallet = client_for(&server).wallet().await.unwrap();
    // Only free USD counts as deployable cash.
    assert_eq!(wallet.cash, dec!(25000.5));
    // Holdings are free + locked; sub-dust balances are dropped.
    assert_eq!(wallet.holdings["BTC"], dec!(0.5));
    assert!(!wallet.holdings.contains_key("DUST"));
    assert!(!wallet.holdings.contains_key("USD"));
}

#[tokio::test]
async fn ticker_extracts_last_prices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "Data": {
                "BTC/USD": {"LastPrice": 42000.25},
                "ETH/USD": {"LastPrice": 2500}
            }
        })))
        .mount(&server)
        .await;

    let prices = client_for(&server).ticker().await.unwrap();
    assert_eq!(prices["BTC/USD"], dec!(42000.25));
    assert_eq!(prices["ETH/USD"], dec!(2500));
}

#[tokio::test]
async fn place_order_sends_signed_form_and_parses_fill() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/place_order"))
        .and(header_exists("RST-API-KEY"))
        .and(header_exists("MSG-SIGNATURE"))
        .and(body_string_contains("pair=BTC/USD"))
        .and(body_string_contains("side=SELL"))
        .and(body_string_contains("type=MARKET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "OrderDetail": {"UnitChange": 4200.5, "FilledQuantity": 0.1}
        })))
        .mount(&server)
        .await;

    let fill = client_for(&server)
        .place_order("BTC/USD", OrderSide::Sell, dec!(0.1))
        .await
        .unwrap();
    assert_eq!(fill.proceeds_usd, dec!(4200.5));
    assert_eq!(fill.filled_quantity, dec!(0.1));
}

#[tokio::test]
async fn place_order_surfaces_venue_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/place_order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": false,
            "ErrMsg": "insufficient balance"
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .place_order("BTC/USD", OrderSide::Buy, dec!(1))
        .await;
    match result {
        Err(VenueError::Rejected(msg)) => assert!(msg.contains("insufficient balance")),
        other => panic!("expected rejection, got {other:?}"),
    }
}
