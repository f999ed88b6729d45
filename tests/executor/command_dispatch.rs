//! Commands arriving as JSON text, the way a transport would hand them over.

use crate::common::*;
use genesis::{Command, Error, Output};

fn run(app: &genesis::Genesis, json: &str) -> Result<Output, Error> {
    let cmd: Command = serde_json::from_str(json).expect("command should parse");
    app.executor().execute(cmd)
}

fn token_of(output: Output) -> String {
    match output {
        Output::Login { token, .. } => token,
        other => panic!("Expected Output::Login, got {:?}", other),
    }
}

#[test]
fn ping_reports_version() {
    let app = ephemeral();
    match run(&app, r#""Ping""#).unwrap() {
        Output::Pong { version } => assert!(!version.is_empty()),
        other => panic!("Expected Output::Pong, got {:?}", other),
    }
}

#[test]
fn json_session_end_to_end() {
    let app = ephemeral();
    let admin = token_of(
        run(
            &app,
            &format!(
                r#"{{"Login":{{"name":"{}","password":"{}"}}}}"#,
                ADMIN, ADMIN_PASSWORD
            ),
        )
        .unwrap(),
    );

    let create = serde_json::json!({
        "CreateUser": {"token": admin, "name": "alice", "password": "wonderland"}
    });
    assert_eq!(run(&app, &create.to_string()), Ok(Output::Unit));

    let alice = token_of(
        run(&app, r#"{"Login":{"name":"alice","password":"wonderland"}}"#).unwrap(),
    );

    let set = serde_json::json!({
        "SetData": {"token": alice, "key": "todo", "value": "[\n  \"milk\",\n  \"eggs\"\n]"}
    });
    assert_eq!(run(&app, &set.to_string()), Ok(Output::Unit));

    let get = serde_json::json!({"GetData": {"token": alice, "key": "todo"}});
    assert_eq!(
        run(&app, &get.to_string()),
        Ok(Output::Json(r#"["milk","eggs"]"#.into()))
    );

    let list = serde_json::json!({"ListUsers": {"token": alice}});
    assert!(matches!(
        run(&app, &list.to_string()),
        Err(Error::Forbidden { .. })
    ));
}

#[test]
fn errors_serialize_for_the_wire() {
    let app = ephemeral();
    let err = run(&app, r#"{"GetAllData":{"token":"bogus"}}"#).unwrap_err();
    assert_eq!(err, Error::Unauthorized);
    assert_eq!(serde_json::to_string(&err).unwrap(), r#""Unauthorized""#);
    assert_eq!(err.kind(), "unauthorized");
}
