mod auth_token;
mod credentials;
mod product;

pub use auth_token::{AuthToken, AuthTokenError, LoginResponse};
pub use credentials::Credentials;
pub use product::{
    CreatedProduct, FixtureError, ProductId, ProductListing, ProductRecord, QuantityUpdate,
    UpdatedProduct,
};
