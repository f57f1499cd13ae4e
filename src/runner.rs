use crate::configuration::{FixtureSettings, Settings, SuiteSettings};
use crate::domain::{
    AuthToken, CreatedProduct, Credentials, FixtureError, LoginResponse, ProductId,
    ProductListing, UpdatedProduct,
};
use crate::inventory_client::{ApiResponse, InventoryClient, QuantityExtreme};
use crate::report::{Expectation, Reporter, RunReport, TestOutcome};
use crate::telemetry::error_chain_fmt;
use std::io::Write;

pub const LOGIN_GATE_MESSAGE: &str = "Login failed. Skipping further tests.";
pub const PRODUCT_GATE_MESSAGE: &str = "Product creation failed. Skipping further tests.";

const MALFORMED_PRODUCT_ID: &str = "not-a-uuid";
const PAGE_LIMIT: u32 = 1;

#[derive(thiserror::Error)]
pub enum RunError {
    #[error("Failed to reach the inventory service.")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to write the test report.")]
    Output(#[from] std::io::Error),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

impl std::fmt::Debug for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Drives the ordered smoke checks against one inventory service.
pub struct SmokeRunner<W: Write> {
    client: InventoryClient,
    credentials: Credentials,
    wrong_credentials: Credentials,
    fixtures: FixtureSettings,
    suite: SuiteSettings,
    reporter: Reporter<W>,
}

impl<W: Write> SmokeRunner<W> {
    /// Validate the fixtures and set up the HTTP client. No request is sent.
    pub fn build(settings: &Settings, writer: W) -> Result<Self, RunError> {
        settings.fixtures.product.ensure_well_formed()?;
        settings.fixtures.invalid_product.ensure_malformed()?;

        let credentials = settings.credentials.credentials();
        let wrong_credentials = settings.credentials.with_wrong_password(&credentials);
        Ok(Self {
            client: settings.client()?,
            credentials,
            wrong_credentials,
            fixtures: settings.fixtures.clone(),
            suite: settings.suite.clone(),
            reporter: Reporter::new(writer),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[tracing::instrument(
        name = "Smoke run",
        skip_all,
        fields(base_url = %self.client.base_url(), username = %self.credentials.username)
    )]
    pub async fn run(mut self) -> Result<RunReport, RunError> {
        let extended = self.suite.extended_checks;

        self.register_user().await?;
        self.register_duplicate_user().await?;
        self.login_with_invalid_credentials().await?;

        let Some(token) = self.login().await? else {
            self.reporter.abort(LOGIN_GATE_MESSAGE)?;
            return Ok(self.reporter.finish()?);
        };

        let Some(product_id) = self.add_product(&token).await? else {
            self.reporter.abort(PRODUCT_GATE_MESSAGE)?;
            return Ok(self.reporter.finish()?);
        };

        self.add_invalid_product(&token).await?;
        self.get_product_by_id(&token, &product_id).await?;
        if extended {
            self.get_product_by_malformed_id(&token).await?;
        }

        let new_quantity = self.fixtures.updated_quantity;
        self.update_quantity(&token, &product_id, new_quantity)
            .await?;
        self.list_products(&token, new_quantity).await?;

        if extended {
            self.list_products_paginated(&token).await?;
            self.quantity_extreme(&token, QuantityExtreme::Most).await?;
            self.quantity_extreme(&token, QuantityExtreme::Least).await?;
            self.quantity_extremes_without_flag(&token).await?;
            self.update_negative_quantity(&token, &product_id).await?;
            self.products_without_token().await?;
        }

        self.delete_product(&token, &product_id).await?;
        if extended {
            self.get_deleted_product(&token, &product_id).await?;
        }

        Ok(self.reporter.finish()?)
    }

    pub async fn register_user(&mut self) -> Result<(), RunError> {
        let response = self.client.register(&self.credentials).await?;
        let outcome = status_outcome("User Registration", &response, &[201, 409])
            .with_request(&self.credentials.redacted());
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn register_duplicate_user(&mut self) -> Result<(), RunError> {
        let response = self.client.register(&self.credentials).await?;
        let outcome = status_outcome("Register Duplicate User", &response, &[409])
            .with_request(&self.credentials.redacted());
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn login_with_invalid_credentials(&mut self) -> Result<(), RunError> {
        let response = self.client.login(&self.wrong_credentials).await?;
        let outcome = status_outcome("Login with Invalid Credentials", &response, &[401])
            .with_request(&self.wrong_credentials.redacted());
        self.reporter.record(outcome)?;
        Ok(())
    }

    /// Returns the access token, or `None` on any failure.
    pub async fn login(&mut self) -> Result<Option<AuthToken>, RunError> {
        let response = self.client.login(&self.credentials).await?;
        let token = if response.status.as_u16() == 200 {
            response
                .json::<LoginResponse>()
                .ok()
                .and_then(LoginResponse::into_token)
        } else {
            None
        };
        let outcome = TestOutcome::check("Login Test", token.is_some())
            .with_request(&self.credentials.redacted())
            .with_expectation(Expectation::new(
                "200 and access_token",
                response.status.as_u16(),
            ))
            .with_response_body(&response.body);
        self.reporter.record(outcome)?;
        Ok(token)
    }

    /// Returns the id of the created product, or `None` when creation
    /// failed or the body carries no usable id.
    pub async fn add_product(&mut self, token: &AuthToken) -> Result<Option<ProductId>, RunError> {
        let product = &self.fixtures.product;
        let response = self.client.add_product(token, product).await?;
        if response.status.as_u16() != 201 {
            let outcome = status_outcome("Add Product", &response, &[201])
                .with_request(&serde_json::to_value(product).unwrap_or_default());
            self.reporter.record(outcome)?;
            return Ok(None);
        }
        self.reporter.record(TestOutcome::pass("Add Product"))?;
        Ok(response
            .json::<CreatedProduct>()
            .ok()
            .and_then(CreatedProduct::into_id))
    }

    pub async fn add_invalid_product(&mut self, token: &AuthToken) -> Result<(), RunError> {
        let product = &self.fixtures.invalid_product;
        let response = self.client.add_product(token, product).await?;
        let outcome = status_outcome("Add Invalid Product", &response, &[400])
            .with_request(&serde_json::to_value(product).unwrap_or_default());
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn get_product_by_id(
        &mut self,
        token: &AuthToken,
        product_id: &ProductId,
    ) -> Result<(), RunError> {
        let response = self
            .client
            .get_product_by_id(token, product_id, self.suite.by_id_query())
            .await?;
        let outcome = status_outcome("Get Product by ID", &response, &[200])
            .with_request(&serde_json::json!({ "product_id": product_id.as_ref() }));
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn get_product_by_malformed_id(&mut self, token: &AuthToken) -> Result<(), RunError> {
        let response = self
            .client
            .get_product_by_raw_id(token, MALFORMED_PRODUCT_ID)
            .await?;
        let outcome = status_outcome("Get Product by Malformed ID", &response, &[400])
            .with_request(&serde_json::json!({ "product_id": MALFORMED_PRODUCT_ID }));
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn update_quantity(
        &mut self,
        token: &AuthToken,
        product_id: &ProductId,
        new_quantity: i64,
    ) -> Result<(), RunError> {
        let response = self
            .client
            .update_quantity(token, product_id, new_quantity)
            .await?;
        let outcome = if response.status.as_u16() == 200 {
            // Display only, the listing check asserts on the quantity.
            let summary = match response.json::<UpdatedProduct>() {
                Ok(updated) => {
                    let quantity = match updated.quantity {
                        Some(serde_json::Value::String(s)) => s,
                        Some(q) => q.to_string(),
                        None => "unknown".to_string(),
                    };
                    format!(", Updated quantity: {}", quantity)
                }
                Err(_) => ", but response body is not valid JSON".to_string(),
            };
            TestOutcome::pass("Update Quantity").with_summary(summary)
        } else {
            status_outcome("Update Quantity", &response, &[200])
                .with_request(&serde_json::json!({ "quantity": new_quantity }))
        };
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn list_products(
        &mut self,
        token: &AuthToken,
        expected_quantity: i64,
    ) -> Result<(), RunError> {
        const NAME: &str = "Get Products";
        let response = self.client.list_products(token).await?;
        let outcome = match listing(NAME, &response) {
            Err(outcome) => outcome,
            Ok(products) => {
                let wanted = &self.fixtures.product.name;
                match products
                    .iter()
                    .find(|p| p.name.as_deref() == Some(wanted.as_str()))
                {
                    None => TestOutcome::fail(NAME)
                        .with_summary(format!(" - Product '{}' not found", wanted)),
                    Some(product) if product.quantity_equals(expected_quantity) => {
                        TestOutcome::pass(NAME)
                            .with_summary(format!(" (Quantity = {})", expected_quantity))
                    }
                    Some(product) => {
                        let actual = product
                            .quantity
                            .as_ref()
                            .map(|q| q.to_string())
                            .unwrap_or_else(|| "missing".to_string());
                        TestOutcome::fail(NAME).with_expectation(Expectation::labelled(
                            "Expected Quantity",
                            expected_quantity,
                            actual,
                        ))
                    }
                }
            }
        };
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn list_products_paginated(&mut self, token: &AuthToken) -> Result<(), RunError> {
        const NAME: &str = "Get Products Paginated";
        let response = self
            .client
            .list_products_page(token, 1, PAGE_LIMIT)
            .await?;
        let outcome = match listing(NAME, &response) {
            Err(outcome) => outcome,
            Ok(products) => TestOutcome::check(NAME, products.len() <= PAGE_LIMIT as usize)
                .with_expectation(Expectation::labelled(
                    "Expected At Most",
                    PAGE_LIMIT,
                    products.len(),
                ))
                .with_response_body(&response.body),
        }
        .with_request(&serde_json::json!({ "pagenum": 1, "limit": PAGE_LIMIT }));
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn quantity_extreme(
        &mut self,
        token: &AuthToken,
        extreme: QuantityExtreme,
    ) -> Result<(), RunError> {
        let (name, request) = match extreme {
            QuantityExtreme::Most => ("Product With Most Quantity", serde_json::json!({ "most": true })),
            QuantityExtreme::Least => ("Product With Least Quantity", serde_json::json!({ "least": true })),
        };
        let response = self
            .client
            .get_quantity_extreme(token, Some(extreme))
            .await?;
        let outcome = status_outcome(name, &response, &[200]).with_request(&request);
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn quantity_extremes_without_flag(
        &mut self,
        token: &AuthToken,
    ) -> Result<(), RunError> {
        let response = self.client.get_quantity_extreme(token, None).await?;
        let outcome = status_outcome("Quantity Extremes Without Flag", &response, &[400]);
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn update_negative_quantity(
        &mut self,
        token: &AuthToken,
        product_id: &ProductId,
    ) -> Result<(), RunError> {
        let response = self.client.update_quantity(token, product_id, -1).await?;
        let outcome = TestOutcome::check("Update Negative Quantity", response.status.is_client_error())
            .with_request(&serde_json::json!({ "quantity": -1 }))
            .with_expectation(Expectation::new("4xx", response.status.as_u16()))
            .with_response_body(&response.body);
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn products_without_token(&mut self) -> Result<(), RunError> {
        let response = self.client.list_products_unauthenticated().await?;
        let outcome = status_outcome("Products Without Token", &response, &[401]);
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn delete_product(
        &mut self,
        token: &AuthToken,
        product_id: &ProductId,
    ) -> Result<(), RunError> {
        let response = self.client.delete_product(token, product_id).await?;
        let outcome = status_outcome("Delete Product", &response, &[200])
            .with_request(&serde_json::json!({ "product_id": product_id.as_ref() }));
        self.reporter.record(outcome)?;
        Ok(())
    }

    pub async fn get_deleted_product(
        &mut self,
        token: &AuthToken,
        product_id: &ProductId,
    ) -> Result<(), RunError> {
        let response = self
            .client
            .get_product_by_id(token, product_id, self.suite.by_id_query())
            .await?;
        let outcome = status_outcome("Get Deleted Product", &response, &[404])
            .with_request(&serde_json::json!({ "product_id": product_id.as_ref() }));
        self.reporter.record(outcome)?;
        Ok(())
    }

    /// Close the report without running the remaining checks.
    pub fn finish(self) -> Result<RunReport, RunError> {
        Ok(self.reporter.finish()?)
    }
}

/// Pass when the status is one of `accepted`.
fn status_outcome(name: &'static str, response: &ApiResponse, accepted: &[u16]) -> TestOutcome {
    let actual = response.status.as_u16();
    let expected = accepted
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    TestOutcome::check(name, accepted.contains(&actual))
        .with_expectation(Expectation::new(expected, actual))
        .with_response_body(&response.body)
}

/// Parse a `200 OK` product listing, or describe why it could not be.
fn listing(name: &'static str, response: &ApiResponse) -> Result<Vec<ProductListing>, TestOutcome> {
    if response.status.as_u16() != 200 {
        return Err(status_outcome(name, response, &[200]));
    }
    response.json::<Vec<ProductListing>>().map_err(|_| {
        TestOutcome::fail(name)
            .with_expectation(Expectation::new("valid JSON list", "Invalid JSON"))
            .with_response_body(&response.body)
    })
}
