//! HTTP API tests
//!
//! Every test drives the router over in-memory stores seeded with the
//! standard chart.

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{date, ChartFixtures, StandardFixture};

fn server_with(config: ApiConfig) -> (TestServer, StandardFixture) {
    let fixture = ChartFixtures::standard();
    let state = AppState::in_memory(config, fixture.chart.clone());
    let server = TestServer::new(create_router(state)).unwrap();
    (server, fixture)
}

fn server() -> (TestServer, StandardFixture) {
    server_with(ApiConfig::default())
}

fn amount(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap()
}

fn voucher(narration: &str, on: &str, debit: Value, credit: Value, amount: &str) -> Value {
    json!({
        "date": on,
        "narration": narration,
        "entries": [
            { "account_id": debit, "debit": amount },
            { "account_id": credit, "credit": amount }
        ]
    })
}

async fn post_capital_and_sale(server: &TestServer, f: &StandardFixture) {
    server
        .post("/api/v1/vouchers")
        .json(&voucher("Owner capital", "2024-04-01", json!(f.cash), json!(f.capital), "5000"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/vouchers")
        .json(&voucher("Cash sale", "2024-05-15", json!(f.cash), json!(f.sales), "500"))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_endpoints() {
    let (server, _) = server();

    let health = server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "healthy");

    let ready = server.get("/health/ready").await;
    ready.assert_status_ok();
    let body = ready.json::<Value>();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_post_voucher_and_trial_balance() {
    let (server, f) = server();
    post_capital_and_sale(&server, &f).await;

    let response = server.get("/api/v1/reports/trial-balance").await;
    response.assert_status_ok();
    let report = response.json::<Value>();

    assert_eq!(amount(&report["total_debit"]), dec!(5500));
    assert_eq!(amount(&report["total_credit"]), dec!(5500));
    assert_eq!(report["is_balanced"], true);
    assert!(report["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_trial_balance_as_of_cutoff() {
    let (server, f) = server();
    post_capital_and_sale(&server, &f).await;

    let report = server
        .get("/api/v1/reports/trial-balance")
        .add_query_param("as_of", "2024-04-30")
        .await
        .json::<Value>();

    assert_eq!(amount(&report["total_debit"]), dec!(5000));
}

#[tokio::test]
async fn test_unbalanced_voucher_is_rejected() {
    let (server, f) = server();

    let response = server
        .post("/api/v1/vouchers")
        .json(&json!({
            "date": "2024-05-15",
            "narration": "Short credit",
            "entries": [
                { "account_id": f.cash, "debit": "500" },
                { "account_id": f.sales, "credit": "400" }
            ]
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"], "validation_error");

    let listed = server.get("/api/v1/vouchers").await.json::<Value>();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_entry_with_both_columns_is_rejected() {
    let (server, f) = server();

    let response = server
        .post("/api/v1/vouchers")
        .json(&json!({
            "date": "2024-05-15",
            "narration": "Both sides",
            "entries": [
                { "account_id": f.cash, "debit": "500", "credit": "500" },
                { "account_id": f.sales, "credit": "500" }
            ]
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_account_is_rejected() {
    let (server, f) = server();

    let response = server
        .post("/api/v1/vouchers")
        .json(&voucher(
            "Ghost ledger",
            "2024-05-15",
            json!(uuid::Uuid::new_v4()),
            json!(f.sales),
            "100",
        ))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_blank_narration_fails_validation() {
    let (server, f) = server();

    let response = server
        .post("/api/v1/vouchers")
        .json(&voucher("", "2024-05-15", json!(f.cash), json!(f.sales), "100"))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert!(body["details"][0].as_str().unwrap().starts_with("narration"));
}

#[tokio::test]
async fn test_voucher_lifecycle() {
    let (server, f) = server();

    let created = server
        .post("/api/v1/vouchers")
        .json(&voucher("Cash sale", "2024-05-15", json!(f.cash), json!(f.sales), "500"))
        .await
        .json::<Value>();
    let id = created["id"].as_str().unwrap().to_string();

    let fetched = server.get(&format!("/api/v1/vouchers/{}", id)).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["narration"], "Cash sale");

    let replaced = server
        .put(&format!("/api/v1/vouchers/{}", id))
        .json(&voucher("Corrected sale", "2024-05-16", json!(f.cash), json!(f.sales), "450"))
        .await;
    replaced.assert_status_ok();
    let replaced = replaced.json::<Value>();
    assert_eq!(replaced["id"].as_str(), Some(id.as_str()));
    assert_eq!(replaced["date"], "2024-05-16");

    server
        .delete(&format!("/api/v1/vouchers/{}", id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/v1/vouchers/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reversal_nets_movement_to_zero() {
    let (server, f) = server();

    let sale = server
        .post("/api/v1/vouchers")
        .json(&voucher("Cash sale", "2024-05-15", json!(f.cash), json!(f.sales), "500"))
        .await
        .json::<Value>();

    server
        .post(&format!("/api/v1/vouchers/{}/reverse", sale["id"].as_str().unwrap()))
        .json(&json!({ "date": "2024-05-20", "reason": "Returned goods" }))
        .await
        .assert_status(StatusCode::CREATED);

    let balances = server
        .get("/api/v1/reports/balances")
        .add_query_param("mode", "movement")
        .add_query_param("from", "2024-05-01")
        .add_query_param("to", "2024-05-31")
        .await
        .json::<Value>();

    for line in balances["balances"].as_array().unwrap() {
        assert_eq!(amount(&line["balance"]), Decimal::ZERO);
    }
    assert_eq!(amount(&balances["total"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_cumulative_balances_reject_window() {
    let (server, _) = server();

    server
        .get("/api/v1/reports/balances")
        .add_query_param("from", "2024-05-01")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lock_date_blocks_posting() {
    let mut config = ApiConfig::default();
    config.ledger = config.ledger.with_lock_date(date(2024, 4, 30));
    let (server, f) = server_with(config);

    let response = server
        .post("/api/v1/vouchers")
        .json(&voucher("Backdated", "2024-04-15", json!(f.cash), json!(f.sales), "100"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profit_and_loss_uses_ledger_cogs_without_orders() {
    let (server, f) = server();
    post_capital_and_sale(&server, &f).await;
    server
        .post("/api/v1/vouchers")
        .json(&voucher("Cost of sale", "2024-05-15", json!(f.cogs), json!(f.inventory), "200"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/vouchers")
        .json(&voucher("May rent", "2024-05-31", json!(f.rent), json!(f.cash), "100"))
        .await
        .assert_status(StatusCode::CREATED);

    let report = server
        .get("/api/v1/reports/profit-and-loss")
        .add_query_param("from", "2024-05-01")
        .add_query_param("to", "2024-05-31")
        .await
        .json::<Value>();

    assert_eq!(amount(&report["total_income"]), dec!(500));
    assert_eq!(amount(&report["cost_of_goods_sold"]), dec!(200));
    assert_eq!(amount(&report["gross_profit"]), dec!(300));
    assert_eq!(amount(&report["total_expenses"]), dec!(100));
    assert_eq!(amount(&report["net_profit"]), dec!(200));
}

#[tokio::test]
async fn test_inverted_window_is_bad_request() {
    let (server, _) = server();

    server
        .get("/api/v1/reports/profit-and-loss")
        .add_query_param("from", "2024-06-01")
        .add_query_param("to", "2024-05-01")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_balance_sheet_and_statement() {
    let (server, f) = server();
    post_capital_and_sale(&server, &f).await;

    let sheet = server.get("/api/v1/reports/balance-sheet").await.json::<Value>();
    assert_eq!(amount(&sheet["total_assets"]), dec!(5500));
    assert_eq!(amount(&sheet["current_earnings"]), dec!(500));

    let statement = server
        .get(&format!("/api/v1/ledgers/{}/statement", f.cash.as_uuid()))
        .add_query_param("from", "2024-05-01")
        .await
        .json::<Value>();
    assert_eq!(amount(&statement["opening"]), dec!(5000));
    assert_eq!(amount(&statement["closing"]), dec!(5500));
    assert_eq!(statement["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_group_tree_rolls_up_subtree() {
    let (server, f) = server();
    post_capital_and_sale(&server, &f).await;

    let groups = server.get("/api/v1/groups").await.json::<Value>();
    let assets = groups
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["name"] == "Assets")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let tree = server
        .get(&format!("/api/v1/groups/{}/tree", assets))
        .await
        .json::<Value>();
    assert_eq!(amount(&tree["total"]), dec!(5500));
    assert!(!tree["children"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chart_management() {
    let (server, _) = server();

    server
        .post("/api/v1/groups")
        .json(&json!({ "name": "Orphan" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let root = server
        .post("/api/v1/groups")
        .json(&json!({ "name": "Investments", "nature": "asset" }))
        .await;
    root.assert_status(StatusCode::CREATED);
    let root_id = root.json::<Value>()["id"].as_str().unwrap().to_string();

    let child = server
        .post("/api/v1/groups")
        .json(&json!({ "name": "Bonds", "parent_id": root_id }))
        .await
        .json::<Value>();
    assert_eq!(child["nature"], "asset");
    assert_eq!(child["level"], 1);

    // a root cannot move under its own child
    server
        .put(&format!("/api/v1/groups/{}/parent", root_id))
        .json(&json!({ "parent_id": child["id"] }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let ledger = server
        .post("/api/v1/ledgers")
        .json(&json!({
            "name": "Treasury Bond",
            "group_id": child["id"],
            "opening_balance": { "amount": "1200", "side": "dr", "as_of": "2024-04-01" }
        }))
        .await;
    ledger.assert_status(StatusCode::CREATED);
    let ledger = ledger.json::<Value>();
    assert_eq!(ledger["ledger_type"], "general");
    assert_eq!(ledger["is_posting"], true);

    server
        .get(&format!("/api/v1/ledgers/{}", ledger["id"].as_str().unwrap()))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_party_ledger_resolution_is_idempotent() {
    let (server, f) = server();

    let party = server
        .post("/api/v1/parties")
        .json(&json!({ "name": "Acme Retail", "kind": "customer", "email": "ap@acme.test" }))
        .await;
    party.assert_status(StatusCode::CREATED);
    let party_id = party.json::<Value>()["id"].as_str().unwrap().to_string();

    let first = server
        .post(&format!("/api/v1/parties/{}/ledger", party_id))
        .await
        .json::<Value>();
    let second = server
        .post(&format!("/api/v1/parties/{}/ledger", party_id))
        .await
        .json::<Value>();

    assert_eq!(first["ledger"]["id"], second["ledger"]["id"]);
    assert_eq!(first["ledger"]["ledger_type"], "receivable");
    assert_eq!(second["party"]["coa_ledger_id"], first["ledger"]["id"]);

    server
        .post("/api/v1/vouchers")
        .json(&voucher(
            "Credit sale",
            "2024-05-15",
            first["ledger"]["id"].clone(),
            json!(f.sales),
            "300",
        ))
        .await
        .assert_status(StatusCode::CREATED);

    let report = server
        .get("/api/v1/reports/receivables-payables")
        .await
        .json::<Value>();
    assert_eq!(amount(&report["total_receivable"]), dec!(300));
    assert_eq!(report["receivables"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_party_validation_and_lookup() {
    let (server, _) = server();

    server
        .post("/api/v1/parties")
        .json(&json!({ "name": "Bad Mail", "kind": "supplier", "email": "not-an-email" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    server
        .get(&format!("/api/v1/parties/{}", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post(&format!("/api/v1/parties/{}/ledger", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let listed = server
        .get("/api/v1/parties")
        .add_query_param("active_only", "true")
        .await
        .json::<Value>();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (server, _) = server();

    let generated = server.get("/health").await;
    assert!(generated.headers().contains_key("x-request-id"));

    let supplied = server
        .get("/api/v1/parties")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            axum::http::HeaderValue::from_static("req-42"),
        )
        .await;
    assert_eq!(supplied.headers()["x-request-id"], "req-42");
}
