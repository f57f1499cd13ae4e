use crate::domain::{AuthToken, Credentials, ProductId, ProductRecord, QuantityUpdate};
use reqwest::{Client, RequestBuilder, StatusCode};

/// How the `product_id` query parameter of `GET /products/by-id` is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByIdQuery {
    /// `product_id=<id>`
    Clean,
    /// `product_id=?<id>`, as sent by older smoke scripts.
    QuestionMarkPrefixed,
}

impl ByIdQuery {
    pub fn value(&self, product_id: &ProductId) -> String {
        match self {
            ByIdQuery::Clean => product_id.to_string(),
            ByIdQuery::QuestionMarkPrefixed => format!("?{}", product_id),
        }
    }
}

/// Which end of the quantity range `GET /products/quantity` should return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityExtreme {
    Most,
    Least,
}

impl QuantityExtreme {
    fn as_str(&self) -> &'static str {
        match self {
            QuantityExtreme::Most => "most",
            QuantityExtreme::Least => "least",
        }
    }
}

/// Status and raw body of a response. The body is kept verbatim for
/// failure reports.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Clone, Debug)]
pub struct InventoryClient {
    base_url: String,
    http_client: Client,
}

impl InventoryClient {
    pub fn new(
        base_url: String,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http_client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, body_length = body.len(), "Received response");
        Ok(ApiResponse { status, body })
    }

    #[tracing::instrument(name = "Registering user", skip(self, credentials), fields(username = %credentials.username))]
    pub async fn register(&self, credentials: &Credentials) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .post(self.url("/register"))
            .json(&credentials.to_body());
        self.send(request).await
    }

    #[tracing::instrument(name = "Logging in", skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .post(self.url("/login"))
            .json(&credentials.to_body());
        self.send(request).await
    }

    #[tracing::instrument(name = "Adding product", skip(self, token, product), fields(sku = %product.sku))]
    pub async fn add_product(
        &self,
        token: &AuthToken,
        product: &ProductRecord,
    ) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .post(self.url("/products"))
            .bearer_auth(token.expose())
            .json(product);
        self.send(request).await
    }

    #[tracing::instrument(name = "Fetching product by id", skip(self, token))]
    pub async fn get_product_by_id(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        query: ByIdQuery,
    ) -> Result<ApiResponse, reqwest::Error> {
        self.get_product_by_raw_id(token, &query.value(product_id))
            .await
    }

    /// `GET /products/by-id` with an arbitrary, possibly malformed, id.
    #[tracing::instrument(name = "Fetching product by raw id", skip(self, token))]
    pub async fn get_product_by_raw_id(
        &self,
        token: &AuthToken,
        raw_id: &str,
    ) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .get(self.url("/products/by-id"))
            .bearer_auth(token.expose())
            .query(&[("product_id", raw_id)]);
        self.send(request).await
    }

    #[tracing::instrument(name = "Updating product quantity", skip(self, token))]
    pub async fn update_quantity(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .put(self.url(&format!("/products/{}/quantity", product_id)))
            .bearer_auth(token.expose())
            .json(&QuantityUpdate { quantity });
        self.send(request).await
    }

    #[tracing::instrument(name = "Listing products", skip(self, token))]
    pub async fn list_products(&self, token: &AuthToken) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .get(self.url("/products"))
            .bearer_auth(token.expose());
        self.send(request).await
    }

    #[tracing::instrument(name = "Listing a page of products", skip(self, token))]
    pub async fn list_products_page(
        &self,
        token: &AuthToken,
        page_number: u32,
        limit: u32,
    ) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .get(self.url("/products"))
            .bearer_auth(token.expose())
            .query(&[("pagenum", page_number), ("limit", limit)]);
        self.send(request).await
    }

    #[tracing::instrument(name = "Listing products without a token", skip(self))]
    pub async fn list_products_unauthenticated(&self) -> Result<ApiResponse, reqwest::Error> {
        let request = self.http_client.get(self.url("/products"));
        self.send(request).await
    }

    /// `GET /products/quantity`; `None` sends neither flag.
    #[tracing::instrument(name = "Fetching quantity extreme", skip(self, token))]
    pub async fn get_quantity_extreme(
        &self,
        token: &AuthToken,
        extreme: Option<QuantityExtreme>,
    ) -> Result<ApiResponse, reqwest::Error> {
        let mut request = self
            .http_client
            .get(self.url("/products/quantity"))
            .bearer_auth(token.expose());
        if let Some(extreme) = extreme {
            request = request.query(&[(extreme.as_str(), "true")]);
        }
        self.send(request).await
    }

    #[tracing::instrument(name = "Deleting product", skip(self, token))]
    pub async fn delete_product(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
    ) -> Result<ApiResponse, reqwest::Error> {
        let request = self
            .http_client
            .delete(self.url(&format!("/products/{}", product_id)))
            .bearer_auth(token.expose());
        self.send(request).await
    }
}
