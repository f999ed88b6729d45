//! Serialization tests for Command, Output and Error.

use crate::{AccountInfo, Command, Error, Output};

fn command_round_trip(cmd: Command) {
    let json = serde_json::to_string(&cmd).expect("Failed to serialize command");
    let restored: Command = serde_json::from_str(&json).expect("Failed to deserialize command");
    assert_eq!(cmd, restored, "Command round-trip failed for: {}", json);
}

#[test]
fn test_commands_survive_json() {
    command_round_trip(Command::Ping);
    command_round_trip(Command::Login {
        name: "alice".into(),
        password: "wonderland".into(),
    });
    command_round_trip(Command::UpdateUser {
        token: "t".into(),
        name: "bob".into(),
        admin: Some(true),
        password: None,
    });
    command_round_trip(Command::SetData {
        token: "t".into(),
        key: "settings".into(),
        value: r#"{"theme":"dark"}"#.into(),
    });
}

#[test]
fn test_command_wire_shape() {
    let cmd: Command = serde_json::from_str(
        r#"{"CreateUser":{"token":"t","name":"bob","password":"builder1"}}"#,
    )
    .unwrap();
    assert_eq!(
        cmd,
        Command::CreateUser {
            token: "t".into(),
            name: "bob".into(),
            password: "builder1".into(),
            admin: false,
        }
    );

    let cmd: Command = serde_json::from_str(r#"{"UpdateUser":{"token":"t","name":"bob"}}"#).unwrap();
    assert!(matches!(
        cmd,
        Command::UpdateUser {
            admin: None,
            password: None,
            ..
        }
    ));

    let ping: Command = serde_json::from_str(r#""Ping""#).unwrap();
    assert_eq!(ping, Command::Ping);
}

#[test]
fn test_unknown_fields_rejected() {
    let result: Result<Command, _> =
        serde_json::from_str(r#"{"Logout":{"token":"t","everywhere":true}}"#);
    assert!(result.is_err());
}

#[test]
fn test_output_and_error_serialize() {
    let output = Output::Login {
        token: "t".into(),
        user: AccountInfo {
            name: "alice".into(),
            admin: false,
        },
    };
    let json = serde_json::to_string(&output).unwrap();
    assert_eq!(serde_json::from_str::<Output>(&json).unwrap(), output);

    let err = Error::QuotaExceeded { count: 3, limit: 3 };
    let json = serde_json::to_string(&err).unwrap();
    assert_eq!(json, r#"{"QuotaExceeded":{"count":3,"limit":3}}"#);
    assert_eq!(serde_json::from_str::<Error>(&json).unwrap(), err);
}
