use std::sync::Arc;

use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::clock::Clock;
use crate::registry::{CreationPolicy, MemoryStore, MongoStore, VotingRegistry};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "default_max_page_size")]
    max_page_size: u64,
    // secrets
    jwt_secret: String,
}

fn default_max_page_size() -> u64 {
    100
}

impl Config {
    /// The largest page a listing may be asked for.
    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    /// Secret key used to verify caller tokens.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

#[cfg(test)]
impl Config {
    pub fn example() -> Self {
        Self::example_with_secret("example jwt secret")
    }

    pub fn example_with_secret(jwt_secret: &str) -> Self {
        Self {
            max_page_size: default_max_page_size(),
            jwt_secret: jwt_secret.to_string(),
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the registry fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Where voting items are kept.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In process memory; lost on restart.
    #[default]
    Memory,
    /// A MongoDB database reached through `db_uri`.
    Mongodb,
}

/// Configuration for the voting registry and its storage.
#[derive(Deserialize)]
struct RegistryConfig {
    #[serde(default)]
    store: StoreKind,
    #[serde(default)]
    creation_policy: CreationPolicy,
    #[serde(default)]
    strict_items: bool,
    // secrets
    db_uri: Option<String>,
}

/// A fairing that loads the registry config, opens the configured store and
/// places a [`VotingRegistry`] into managed state. When the store is MongoDB,
/// the `Client` and `Database` are managed too.
pub struct RegistryFairing {
    clock: Arc<dyn Clock>,
}

impl RegistryFairing {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }
}

#[rocket::async_trait]
impl Fairing for RegistryFairing {
    fn info(&self) -> Info {
        Info {
            name: "Voting registry",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<RegistryConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load registry config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let registry = match config.store {
            StoreKind::Memory => {
                info!("Using in-memory voting item store");
                VotingRegistry::new(MemoryStore::new(), self.clock.clone())
            }
            StoreKind::Mongodb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set to use the mongodb store");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                // Construct the connection.
                let client = match MongoClient::with_uri_str(db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(&get_database_name());
                info!("...database connection online!");

                let registry = VotingRegistry::new(MongoStore::new(&db), self.clock.clone());
                rocket = rocket.manage(client).manage(db);
                registry
            }
        };
        let registry = registry
            .with_creation_policy(config.creation_policy)
            .with_strict_items(config.strict_items);
        info!(
            "Voting registry ready ({:?} creation, strict items {})",
            config.creation_policy, config.strict_items
        );

        // Manage the state.
        rocket = rocket.manage(registry);
        Ok(rocket)
    }
}

/// Get the name of the database to use (production version).
#[cfg(not(test))]
fn get_database_name() -> String {
    "voting_registry".to_string()
}

/// Get the name of the database to use (test version).
/// Use a random name to avoid collisions between tests.
#[cfg(test)]
fn get_database_name() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
