use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use cartline_api::app::services::{InMemoryBackends, build_in_memory_services};
use cartline_auth::JwtClaims;
use cartline_catalog::{
    CampaignStatus, DiscountTier, FlashSaleCampaign, GroupBuyCampaign, PointsRule, Product,
    ProductStatus, SkuSelector, ValidityWindow, Variant,
};
use cartline_core::{CampaignId, Clock, FixedClock, MemberId, ProductId, TenantId, VariantId};

const JWT_SECRET: &str = "test-secret";
const TTL: u64 = 600;

struct TestServer {
    base_url: String,
    backends: InMemoryBackends,
    clock: Arc<FixedClock>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let clock = Arc::new(FixedClock::at(Utc::now().timestamp()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let (services, backends) = build_in_memory_services(TTL, dyn_clock);
        // Same router as prod, bound to an ephemeral port.
        let app = cartline_api::app::build_app_with(Arc::new(services), JWT_SECRET);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            base_url,
            backends,
            clock,
            handle,
        }
    }

    fn now(&self) -> i64 {
        self.clock.now()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(tenant_id: TenantId, member_id: Option<MemberId>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: member_id,
        tenant_id,
        issued_at: now - ChronoDuration::seconds(1),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn seed_product(srv: &TestServer, tenant_id: TenantId) -> ProductId {
    let product = Product {
        id: ProductId::new(),
        tenant_id,
        category_id: None,
        title: "Oolong".to_string(),
        price: dec!(100.00),
        stock: 20,
        weight: dec!(0.25),
        image: None,
        earn: PointsRule::none(),
        pay_points: 0,
        points_price: dec!(0),
        points_only: false,
        status: ProductStatus::Active,
    };
    let id = product.id;
    srv.backends.catalog.insert_product(product);
    id
}

fn decimal(v: &serde_json::Value) -> Decimal {
    v.as_str().expect("decimal as string").parse().unwrap()
}

async fn post_intent(
    client: &reqwest::Client,
    srv: &TestServer,
    token: &str,
    body: serde_json::Value,
) -> reqwest::Response {
    client
        .post(format!("{}/purchase-intents", srv.base_url))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_purchase_intents() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/purchase-intents", srv.base_url))
        .json(&json!({ "product_id": ProductId::new().to_string(), "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn context_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let member_id = MemberId::new();

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(mint_jwt(tenant_id, Some(member_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["tenant_id"], tenant_id.to_string());
    assert_eq!(body["member_id"], member_id.to_string());
}

#[tokio::test]
async fn regular_purchase_intent_lifecycle() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let product_id = seed_product(&srv, tenant_id);
    srv.backends.catalog.add_variant(
        tenant_id,
        Variant {
            id: VariantId::new(),
            product_id,
            campaign_id: None,
            tokens: SkuSelector::parse("green,500g"),
            price: dec!(80.00),
            stock: 5,
            image: None,
        },
    );
    srv.backends
        .catalog
        .add_discount_tier(tenant_id, product_id, DiscountTier::new(3, dec!(90)).unwrap());
    let token = mint_jwt(tenant_id, None);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/purchase-intents", srv.base_url))
        .bearer_auth(&token)
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .json(&json!({ "product_id": product_id.to_string(), "quantity": 3, "sku": "500g,green" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let intent_id = created["intent_id"].as_str().unwrap().to_string();
    assert_eq!(decimal(&created["line"]["unit_price"]), dec!(72));
    assert_eq!(decimal(&created["line"]["total"]), dec!(216));
    assert_eq!(created["line"]["pricing_path"], "regular");
    assert_eq!(created["line"]["quantity"], 3);

    let res = client
        .get(format!("{}/purchase-intents/{}", srv.base_url, intent_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["intent"]["line"], created["line"]);
    assert_eq!(fetched["intent"]["status"], "open");
    assert_eq!(fetched["intent"]["client_ip"], "203.0.113.7");
    assert_eq!(fetched["intent"]["expires_at"], srv.now() + TTL as i64);

    // Another tenant cannot see it.
    let res = client
        .get(format!("{}/purchase-intents/{}", srv.base_url, intent_id))
        .bearer_auth(mint_jwt(TenantId::new(), None))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Expired intents read as absent.
    srv.clock.advance(TTL as i64);
    let res = client
        .get(format!("{}/purchase-intents/{}", srv.base_url, intent_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejections_map_to_status_codes() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let product_id = seed_product(&srv, tenant_id);
    let token = mint_jwt(tenant_id, None);
    let client = reqwest::Client::new();

    let res = post_intent(
        &client,
        &srv,
        &token,
        json!({ "product_id": ProductId::new().to_string(), "quantity": 1 }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = post_intent(
        &client,
        &srv,
        &token,
        json!({
            "product_id": product_id.to_string(),
            "quantity": 1,
            "group_buy_id": CampaignId::new().to_string(),
            "flash_sale_id": CampaignId::new().to_string(),
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "conflicting_promotions");

    let res = post_intent(
        &client,
        &srv,
        &token,
        json!({ "product_id": product_id.to_string(), "quantity": 0 }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_intent(
        &client,
        &srv,
        &token,
        json!({ "product_id": product_id.to_string(), "quantity": 21 }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "stock_insufficient");

    assert!(srv.backends.intents.is_empty());
}

#[tokio::test]
async fn full_group_buy_is_unprocessable() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let product_id = seed_product(&srv, tenant_id);
    let campaign = GroupBuyCampaign {
        id: CampaignId::new(),
        tenant_id,
        product_id,
        window: ValidityWindow::new(srv.now() - 60, srv.now() + 3_600).unwrap(),
        status: CampaignStatus::Active,
        head_count: 1,
        buy_limit: 5,
        buy_max: 0,
        price: dec!(50.00),
        version: 2,
    };
    srv.backends.catalog.insert_group_buy(campaign.clone());
    let token = mint_jwt(tenant_id, None);
    let client = reqwest::Client::new();
    let body = json!({
        "product_id": product_id.to_string(),
        "quantity": 1,
        "group_buy_id": campaign.id.to_string(),
    });

    let res = post_intent(&client, &srv, &token, body.clone()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    // The first buyer holds the only seat.
    assert_eq!(created["line"]["campaign_version"], 3);
    assert!(created["line"]["seat_id"].is_string());
    assert_eq!(decimal(&created["line"]["unit_price"]), dec!(50));

    let res = post_intent(&client, &srv, &token, body).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "capacity_exceeded");
    assert_eq!(err["message"], "campaign full");
}

#[tokio::test]
async fn flash_sale_needs_a_logged_in_member() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let product_id = seed_product(&srv, tenant_id);
    let sale = FlashSaleCampaign {
        id: CampaignId::new(),
        tenant_id,
        product_id,
        window: ValidityWindow::new(srv.now() - 60, srv.now() + 60).unwrap(),
        status: CampaignStatus::Active,
        buy_limit: 1,
        buy_max: 0,
        member_buy_max: 0,
        price: dec!(1.00),
        version: 1,
    };
    srv.backends.catalog.insert_flash_sale(sale.clone());
    let client = reqwest::Client::new();
    let body = json!({
        "product_id": product_id.to_string(),
        "quantity": 1,
        "flash_sale_id": sale.id.to_string(),
    });

    let res = post_intent(&client, &srv, &mint_jwt(tenant_id, None), body.clone()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let member_id = MemberId::new();
    let res = post_intent(&client, &srv, &mint_jwt(tenant_id, Some(member_id)), body).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["line"]["member_id"], member_id.to_string());
    assert_eq!(created["line"]["pricing_path"], "flash_sale");
}
