use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use matcon_auth::{JwtClaims, PrincipalId, Role};
use matcon_core::CompanyId;
use matcon_infra::{CONSUMPTION_SEQUENCE, SequenceFormat, Sequences};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let sequences = Sequences::new().with_format(
            CONSUMPTION_SEQUENCE,
            SequenceFormat {
                prefix: "MCR/".into(),
                padding: 5,
            },
        );
        let services = Arc::new(matcon_api::app::AppServices::in_memory(sequences));
        let app = matcon_api::app::build_app(SECRET.to_string(), services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(company_id: CompanyId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        company_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

fn decimal(v: &Value) -> Decimal {
    match v {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

/// Master data registered by an admin of the company.
struct Catalog {
    stock: String,
    cement: String,
    target_account: String,
}

async fn seed_catalog(client: &reqwest::Client, srv: &TestServer, admin: &str) -> Catalog {
    let stock = new_id();
    let consumed = new_id();
    let cement = new_id();
    let target_account = new_id();

    let calls = [
        (
            "/catalog/locations",
            json!({ "id": stock, "company_id": null, "name": "WH/Stock", "usage": "internal" }),
        ),
        (
            "/catalog/locations",
            json!({ "id": consumed, "company_id": null, "name": "Virtual/Consumption", "usage": "inventory" }),
        ),
        (
            "/catalog/accounts",
            json!({ "id": target_account, "code": "6100", "name": "Project expenses", "kind": "expense" }),
        ),
        (
            "/catalog/products",
            json!({
                "id": cement,
                "company_id": null,
                "name": "Cement",
                "default_code": "CEM",
                "kind": "storable",
                "uom_rounding": "1",
                "standard_price": "12.5",
                "category": {
                    "id": new_id(),
                    "name": "Raw materials",
                    "accounts": {
                        "expense": new_id(),
                        "stock_input": new_id(),
                        "stock_output": new_id(),
                        "stock_valuation": new_id(),
                        "stock_journal": new_id(),
                    }
                }
            }),
        ),
    ];
    for (path, body) in calls {
        let res = client
            .post(srv.url(path))
            .bearer_auth(admin)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED, "POST {path}");
    }

    let res = client
        .put(srv.url("/catalog/consumption-location"))
        .bearer_auth(admin)
        .json(&json!({ "location_id": consumed }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .put(srv.url("/catalog/quantities"))
        .bearer_auth(admin)
        .json(&json!({ "product_id": cement, "location_id": stock, "quantity": "10" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    Catalog {
        stock,
        cement,
        target_account,
    }
}

async fn post_action(client: &reqwest::Client, srv: &TestServer, token: &str, id: &str, action: &str) -> reqwest::Response {
    client
        .post(srv.url(&format!("/consumptions/{id}/{action}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn company_context_is_derived_from_token() {
    let srv = TestServer::spawn().await;

    let company_id = CompanyId::new();
    let token = mint_jwt(company_id, vec![Role::STOCK_USER]);

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["company_id"].as_str().unwrap(), company_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "stock_user"));
}

#[tokio::test]
async fn master_data_is_admin_only() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CompanyId::new(), vec![Role::STOCK_MANAGER]);

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/catalog/locations"))
        .bearer_auth(&token)
        .json(&json!({ "id": new_id(), "company_id": null, "name": "WH/Stock", "usage": "internal" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "permission_denied");
}

#[tokio::test]
async fn products_without_positive_rounding_are_rejected() {
    let srv = TestServer::spawn().await;
    let admin = mint_jwt(CompanyId::new(), vec![Role::ADMIN]);
    let client = reqwest::Client::new();

    for rounding in ["0", "-1"] {
        let res = client
            .post(srv.url("/catalog/products"))
            .bearer_auth(&admin)
            .json(&json!({
                "id": new_id(),
                "company_id": null,
                "name": "Gravel",
                "default_code": null,
                "kind": "storable",
                "uom_rounding": rounding,
                "standard_price": "3",
                "category": {
                    "id": new_id(),
                    "name": "Raw materials",
                    "accounts": {
                        "expense": new_id(),
                        "stock_input": new_id(),
                        "stock_output": new_id(),
                        "stock_valuation": new_id(),
                        "stock_journal": new_id(),
                    }
                }
            }))
            .send()
            .await
            .unwrap();
        assert!(res.status().is_client_error(), "rounding {rounding}: {}", res.status());
    }

    let res = client
        .get(srv.url("/consumptions"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn wip_consumption_lifecycle_and_adjustment() {
    let srv = TestServer::spawn().await;
    let company_id = CompanyId::new();
    let admin = mint_jwt(company_id, vec![Role::ADMIN]);
    let user = mint_jwt(company_id, vec![Role::STOCK_USER]);
    let manager = mint_jwt(company_id, vec![Role::STOCK_MANAGER]);

    let client = reqwest::Client::new();
    let catalog = seed_catalog(&client, &srv, &admin).await;

    // Create
    let res = client
        .post(srv.url("/consumptions"))
        .bearer_auth(&user)
        .json(&json!({
            "location_ids": [catalog.stock],
            "product_ids": [catalog.cement],
            "op_type": "wip",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["reference"], "MCR/00001");
    assert_eq!(created["state"], "draft");
    let id = created["id"].as_str().unwrap().to_string();

    // Start, then count
    let res = post_action(&client, &srv, &user, &id, "start").await;
    assert_eq!(res.status(), StatusCode::OK);
    let lines: Value = client
        .get(srv.url(&format!("/consumptions/{id}/lines")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let lines = lines.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(decimal(&lines[0]["theoretical_qty"]), Decimal::from(10));
    let line_id = lines[0]["id"].as_str().unwrap().to_string();

    let res = client
        .put(srv.url(&format!("/consumptions/lines/{line_id}")))
        .bearer_auth(&user)
        .json(&json!({ "consume_qty": "3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let line: Value = res.json().await.unwrap();
    assert_eq!(decimal(&line["variance"]), Decimal::from(-3));

    let res = post_action(&client, &srv, &user, &id, "approve").await;
    assert_eq!(res.status(), StatusCode::OK);

    // Validation needs the manager role
    let res = post_action(&client, &srv, &user, &id, "validate").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = post_action(&client, &srv, &manager, &id, "validate").await;
    assert_eq!(res.status(), StatusCode::OK);
    let validated: Value = res.json().await.unwrap();
    assert_eq!(validated["state"], "validated");
    assert_eq!(validated["adjusted"], false);

    let moves: Value = client
        .get(srv.url(&format!("/consumptions/{id}/moves")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let moves = moves.as_array().unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(decimal(&moves[0]["quantity"]), Decimal::from(3));
    assert_eq!(moves[0]["direction"], "outbound");

    // Adjust once
    let res = client
        .post(srv.url(&format!("/consumptions/{id}/adjustment")))
        .bearer_auth(&manager)
        .json(&json!({ "account_id": catalog.target_account }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["adjusted"].as_array().unwrap().len(), 1);
    assert_eq!(outcome["entries"].as_array().unwrap().len(), 1);

    let res = client
        .post(srv.url(&format!("/consumptions/{id}/adjustment")))
        .bearer_auth(&manager)
        .json(&json!({ "account_id": catalog.target_account }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "already_adjusted");

    // Validated requests are kept
    let res = client
        .delete(srv.url(&format!("/consumptions/{id}")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn company_isolation_blocks_cross_company_reads_and_writes() {
    let srv = TestServer::spawn().await;
    let company1 = CompanyId::new();
    let admin1 = mint_jwt(company1, vec![Role::ADMIN]);
    let user1 = mint_jwt(company1, vec![Role::STOCK_USER]);
    let admin2 = mint_jwt(CompanyId::new(), vec![Role::ADMIN]);

    let client = reqwest::Client::new();
    let catalog = seed_catalog(&client, &srv, &admin1).await;

    let res = client
        .post(srv.url("/consumptions"))
        .bearer_auth(&user1)
        .json(&json!({
            "location_ids": [catalog.stock],
            "product_ids": [catalog.cement],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url(&format!("/consumptions/{id}")))
        .bearer_auth(&admin2)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = post_action(&client, &srv, &admin2, &id, "start").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let listed: Value = client
        .get(srv.url("/consumptions"))
        .bearer_auth(&admin2)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}
