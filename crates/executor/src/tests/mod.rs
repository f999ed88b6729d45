//! Test modules for the executor crate.

pub mod execute_many;
pub mod serialization;

use crate::{BootstrapUser, Genesis, GenesisConfig};

pub(crate) const ADMIN: &str = "admin";
pub(crate) const ADMIN_PASSWORD: &str = "administrator";

/// Config with cheap hashing and one bootstrap admin.
pub(crate) fn test_config() -> GenesisConfig {
    GenesisConfig {
        password_iterations: 1_000,
        users: vec![BootstrapUser {
            name: ADMIN.into(),
            password: ADMIN_PASSWORD.into(),
            admin: true,
        }],
        ..GenesisConfig::default()
    }
}

/// Route `tracing` output to the test harness; level from `GENESIS_LOG`
pub(crate) fn init_tracing() {
    let level = std::env::var("GENESIS_LOG")
        .ok()
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::WARN);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .try_init();
}

/// In-memory instance plus an admin token.
pub(crate) fn setup() -> (Genesis, String) {
    init_tracing();
    let app = Genesis::ephemeral_with_config(test_config()).unwrap();
    let (token, _) = app.login(ADMIN, ADMIN_PASSWORD).unwrap();
    (app, token)
}

/// Create a regular account and log it in.
pub(crate) fn user(app: &Genesis, admin_token: &str, name: &str) -> String {
    let password = format!("{}-password", name);
    app.create_user(admin_token, name, &password, false).unwrap();
    app.login(name, &password).unwrap().0
}
