use serde::{Deserialize, Serialize};
use validator::ValidateUrl;

/// Product payload posted to `/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub sku: String,
    pub image_url: String,
    pub description: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FixtureError {
    #[error("The product fixture `{0}` is malformed: {1}")]
    Malformed(String, String),
    #[error("The invalid product fixture `{0}` would be accepted by a well-behaved service.")]
    UnexpectedlyValid(String),
}

impl ProductRecord {
    /// Reasons a well-behaved service would reject this payload.
    pub fn violations(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if self.name.trim().is_empty() {
            violations.push("empty name");
        }
        if self.sku.trim().is_empty() {
            violations.push("empty sku");
        }
        if self.quantity < 0 {
            violations.push("negative quantity");
        }
        if self.price < 0.0 {
            violations.push("negative price");
        }
        if !self.image_url.validate_url() {
            violations.push("malformed image_url");
        }
        violations
    }

    pub fn ensure_well_formed(&self) -> Result<(), FixtureError> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::Malformed(
                self.name.clone(),
                violations.join(", "),
            ))
        }
    }

    pub fn ensure_malformed(&self) -> Result<(), FixtureError> {
        if self.violations().is_empty() {
            Err(FixtureError::UnexpectedlyValid(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

/// Identifier returned by the service when a product is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductId(String);

impl ProductId {
    pub fn parse(s: String) -> Option<ProductId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of a `201 Created` answer to `POST /products`.
#[derive(Debug, Deserialize)]
pub struct CreatedProduct {
    pub product_id: Option<String>,
}

impl CreatedProduct {
    pub fn into_id(self) -> Option<ProductId> {
        self.product_id.and_then(ProductId::parse)
    }
}

#[derive(Debug, Serialize)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

/// Body of a `200 OK` answer to `PUT /products/{id}/quantity`.
#[derive(Debug, Deserialize)]
pub struct UpdatedProduct {
    pub quantity: Option<serde_json::Value>,
}

/// One entry of the `GET /products` listing. Only the fields we assert on.
#[derive(Debug, Deserialize)]
pub struct ProductListing {
    pub name: Option<String>,
    pub quantity: Option<serde_json::Value>,
}

impl ProductListing {
    pub fn quantity_equals(&self, expected: i64) -> bool {
        self.quantity.as_ref().and_then(|q| q.as_i64()) == Some(expected)
    }
}
