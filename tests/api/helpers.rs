use inventory_smoke::configuration::{Settings, get_configuration};
use inventory_smoke::report::RunReport;
use inventory_smoke::runner::{RunError, SmokeRunner};
use inventory_smoke::telemetry::{get_subscriber, init_subscriber};
use std::sync::LazyLock;
use wiremock::matchers::{bearer_token, body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";
pub const PRODUCT_ID: &str = "2c8a21e3-c882-4b40-9f27-35413e5e64e7";

// Ensure that the `tracing` stack is only initialised once using `LazyLock`
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // The sink is part of the subscriber's type, hence the two branches.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to install the test subscriber.");
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).expect("Failed to install the test subscriber.");
    }
});

/// Matches requests that carry no `Authorization` header.
pub struct NoAuthorization;

impl wiremock::Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

pub struct TestInventory {
    pub server: MockServer,
    pub settings: Settings,
}

pub struct SmokeOutput {
    pub result: Result<RunReport, RunError>,
    pub stdout: String,
}

impl SmokeOutput {
    pub fn report(self) -> RunReport {
        self.result.expect("The smoke run returned an error.")
    }

    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

impl TestInventory {
    pub async fn run(&self) -> SmokeOutput {
        let mut output = Vec::new();
        let result = match SmokeRunner::build(&self.settings, &mut output) {
            Ok(runner) => runner.run().await,
            Err(e) => Err(e),
        };
        SmokeOutput {
            result,
            stdout: String::from_utf8(output).expect("Report is not valid UTF-8."),
        }
    }

    /// The first registration answers `first`, every later one `then`.
    pub async fn mount_registration(&self, first: u16, then: u16) {
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(first).set_body_json(serde_json::json!({
                "username": self.settings.credentials.username
            })))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(
                ResponseTemplate::new(then)
                    .set_body_json(serde_json::json!({"error": "Email already in use"})),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_login(&self, success: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_partial_json(serde_json::json!({"password": "wrongpassword"})))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": "Invalid credentials"})),
            )
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(success)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_add_product(&self, created: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/products"))
            .and(body_partial_json(serde_json::json!({"sku": ""})))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "Invalid product fields"})),
            )
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/products"))
            .and(bearer_token(TOKEN))
            .respond_with(created)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_get_by_id(&self, product_id_value: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/products/by-id"))
            .and(bearer_token(TOKEN))
            .and(query_param("product_id", product_id_value))
            .respond_with(ResponseTemplate::new(status).set_body_json(phone_listing(5)))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_update_quantity(&self, quantity: i64) {
        Mock::given(method("PUT"))
            .and(path(format!("/products/{}/quantity", PRODUCT_ID)))
            .and(bearer_token(TOKEN))
            .and(body_json(serde_json::json!({"quantity": quantity})))
            .respond_with(ResponseTemplate::new(200).set_body_json(phone_listing(quantity)))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_listing(&self, listing: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(bearer_token(TOKEN))
            .respond_with(listing)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_delete(&self) {
        Mock::given(method("DELETE"))
            .and(path(format!("/products/{}", PRODUCT_ID)))
            .and(bearer_token(TOKEN))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Every core endpoint answers the way a healthy service would.
    pub async fn mount_well_behaved_service(&self) {
        self.mount_registration(201, 409).await;
        self.mount_login(token_response()).await;
        self.mount_add_product(created_response()).await;
        self.mount_get_by_id(PRODUCT_ID, 200).await;
        self.mount_update_quantity(15).await;
        self.mount_listing(listing_response(15)).await;
        self.mount_delete().await;
    }
}

pub fn token_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": TOKEN}))
}

pub fn created_response() -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "message": "Product inserted successfully",
        "product_id": PRODUCT_ID
    }))
}

pub fn phone_listing(quantity: i64) -> serde_json::Value {
    serde_json::json!({
        "id": PRODUCT_ID,
        "name": "Phone",
        "type": "Electronics",
        "sku": "PHN-001",
        "image_url": "https://example.com/phone.jpg",
        "description": "Latest Phone",
        "quantity": quantity,
        "price": 999.99
    })
}

pub fn listing_response(phone_quantity: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!([
        {"name": "Laptop", "quantity": 3},
        phone_listing(phone_quantity)
    ]))
}

pub async fn spawn_inventory() -> TestInventory {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    LazyLock::force(&TRACING);

    let server = MockServer::start().await;
    let settings = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.target.base_url = server.uri();
        c.target.timeout_milliseconds = Some(2_000);
        c.credentials.username = "puja".into();
        c.credentials.unique_username = false;
        c.suite.by_id_query_quirk = false;
        c.suite.extended_checks = false;
        c
    };

    TestInventory { server, settings }
}
