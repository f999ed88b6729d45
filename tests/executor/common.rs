//! Common test utilities for executor tests

use genesis::{BootstrapUser, Genesis, GenesisConfig};

pub const ADMIN: &str = "root";
pub const ADMIN_PASSWORD: &str = "root-password";

/// Fixed secret so tokens stay valid across reopen
pub const SECRET_HEX: &str = "00112233445566778899aabbccddeeff";

/// Config with cheap hashing, one bootstrap admin and a fixed token secret
pub fn config() -> GenesisConfig {
    GenesisConfig {
        password_iterations: 1_000,
        token_secret: Some(SECRET_HEX.to_string()),
        users: vec![BootstrapUser {
            name: ADMIN.into(),
            password: ADMIN_PASSWORD.into(),
            admin: true,
        }],
        ..GenesisConfig::default()
    }
}

/// In-memory instance with [`config`]
pub fn ephemeral() -> Genesis {
    Genesis::ephemeral_with_config(config()).unwrap()
}

/// Log in as the bootstrap admin
pub fn admin_token(app: &Genesis) -> String {
    app.login(ADMIN, ADMIN_PASSWORD).unwrap().0
}
