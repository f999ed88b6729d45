//! State across process restarts, simulated by reopening a directory.

use crate::common::*;
use genesis::{Error, Genesis, GenesisConfig};
use tempfile::TempDir;

#[test]
fn accounts_and_data_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let alice_token = {
        let app = Genesis::with_config(dir.path(), config()).unwrap();
        let admin = admin_token(&app);
        app.create_user(&admin, "alice", "wonderland", false).unwrap();
        let (alice, _) = app.login("alice", "wonderland").unwrap();
        app.set_data(&alice, "settings", r#"{"theme":"dark"}"#)
            .unwrap();
        app.shutdown().unwrap();
        alice
    };

    let app = Genesis::with_config(dir.path(), config()).unwrap();
    // same secret, so the old token still verifies
    assert_eq!(app.session(&alice_token).unwrap().name, "alice");
    assert_eq!(
        app.get_data(&alice_token, "settings").unwrap(),
        r#"{"theme":"dark"}"#
    );
}

#[test]
fn logout_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let token = {
        let app = Genesis::with_config(dir.path(), config()).unwrap();
        let token = admin_token(&app);
        app.logout(&token).unwrap();
        token
    };

    let app = Genesis::with_config(dir.path(), config()).unwrap();
    assert_eq!(app.session(&token).unwrap_err(), Error::Unauthorized);
}

#[test]
fn random_secret_invalidates_tokens_on_restart() {
    let dir = TempDir::new().unwrap();
    let cfg = GenesisConfig {
        token_secret: None,
        ..config()
    };
    let token = {
        let app = Genesis::with_config(dir.path(), cfg.clone()).unwrap();
        admin_token(&app)
    };

    let app = Genesis::with_config(dir.path(), cfg).unwrap();
    assert_eq!(app.session(&token).unwrap_err(), Error::Unauthorized);
    // the account itself is still there
    admin_token(&app);
}

#[test]
fn bootstrap_does_not_reset_changed_password() {
    let dir = TempDir::new().unwrap();
    {
        let app = Genesis::with_config(dir.path(), config()).unwrap();
        let admin = admin_token(&app);
        app.update_password(&admin, ADMIN_PASSWORD, "rotated-password")
            .unwrap();
    }

    let app = Genesis::with_config(dir.path(), config()).unwrap();
    assert_eq!(
        app.login(ADMIN, ADMIN_PASSWORD).unwrap_err(),
        Error::InvalidCredentials
    );
    app.login(ADMIN, "rotated-password").unwrap();
}

#[test]
fn open_reads_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("genesis.toml"),
        r#"
password_iterations = 1000
keys_per_user = 1

[[users]]
name = "owner"
password = "owner-password"
admin = true
"#,
    )
    .unwrap();

    let app = Genesis::open(dir.path()).unwrap();
    let (token, user) = app.login("owner", "owner-password").unwrap();
    assert!(user.admin);
    app.set_data(&token, "only", "true").unwrap();
    assert_eq!(
        app.set_data(&token, "second", "false").unwrap_err(),
        Error::QuotaExceeded { count: 1, limit: 1 }
    );
}

#[test]
fn bad_config_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("genesis.toml"), "durability = \"sometimes\"\n").unwrap();
    assert!(matches!(
        Genesis::open(dir.path()),
        Err(Error::InvalidInput { .. })
    ));
}
