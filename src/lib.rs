#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigFairing, RegistryFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod registry;

/// Assemble the server, configured from `Rocket.toml` and `ROCKET_*`
/// environment variables.
pub fn build() -> Rocket<Build> {
    build_with(rocket::build(), SystemClock)
}

fn build_with(rocket: Rocket<Build>, clock: impl Clock + 'static) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(RegistryFairing::new(clock))
        .attach(LoggerFairing)
}

/// A server for tests, backed by `store` and driven by `clock`.
///
/// A MongoDB store connects to `db_uri` from the usual configuration sources,
/// falling back to a local server.
#[cfg(test)]
pub(crate) fn test_rocket(store: config::StoreKind, clock: clock::ManualClock) -> Rocket<Build> {
    log4rs_test_utils::test_logging::init_logging_once_for(
        ["voting_registry_backend"],
        None,
        None,
    );

    let store = match store {
        config::StoreKind::Memory => "memory",
        config::StoreKind::Mongodb => "mongodb",
    };
    let figment = rocket::Config::figment()
        .merge(("jwt_secret", "test jwt secret"))
        .merge(("store", store))
        .merge(("creation_policy", "upsert"))
        .merge(("strict_items", false))
        .join(("db_uri", "mongodb://localhost:27017"));
    build_with(rocket::custom(figment), clock)
}
