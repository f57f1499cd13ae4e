use crate::domain::{Credentials, ProductRecord};
use crate::inventory_client::{ByIdQuery, InventoryClient};
use secrecy::Secret;
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub target: TargetSettings,
    pub credentials: CredentialSettings,
    pub fixtures: FixtureSettings,
    pub suite: SuiteSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct TargetSettings {
    pub base_url: String,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub timeout_milliseconds: Option<u64>,
}

impl TargetSettings {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_milliseconds
            .map(std::time::Duration::from_millis)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CredentialSettings {
    pub username: String,
    pub password: Secret<String>,
    pub wrong_password: Secret<String>,
    #[serde(default)]
    pub unique_username: bool,
}

impl CredentialSettings {
    /// Credentials used for registration and the successful login.
    pub fn credentials(&self) -> Credentials {
        let username = if self.unique_username {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("{}-{}", self.username, &suffix[..8])
        } else {
            self.username.clone()
        };
        Credentials {
            username,
            password: self.password.clone(),
        }
    }

    pub fn with_wrong_password(&self, credentials: &Credentials) -> Credentials {
        Credentials {
            username: credentials.username.clone(),
            password: self.wrong_password.clone(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct FixtureSettings {
    pub product: ProductRecord,
    pub invalid_product: ProductRecord,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub updated_quantity: i64,
}

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct SuiteSettings {
    #[serde(default)]
    pub by_id_query_quirk: bool,
    #[serde(default)]
    pub extended_checks: bool,
}

impl SuiteSettings {
    pub fn by_id_query(&self) -> ByIdQuery {
        if self.by_id_query_quirk {
            ByIdQuery::QuestionMarkPrefixed
        } else {
            ByIdQuery::Clean
        }
    }
}

impl Settings {
    pub fn client(&self) -> Result<InventoryClient, reqwest::Error> {
        InventoryClient::new(self.target.base_url.clone(), self.target.timeout())
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| config::ConfigError::Message(e))?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_TARGET__BASE_URL=http://inventory:8080` would set `Settings.target.base_url`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for the smoke run.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. \
                Use either `local` or `production`.",
                other
            )),
        }
    }
}
