//! Batch execution through the Executor.

use super::{setup, ADMIN};
use crate::{Command, Error, Output};

#[test]
fn test_results_in_order_and_failures_do_not_stop_batch() {
    let (app, token) = setup();
    let results = app.executor().execute_many(vec![
        Command::Ping,
        Command::GetData {
            token: token.clone(),
            key: "missing".into(),
        },
        Command::SetData {
            token: token.clone(),
            key: "k".into(),
            value: "1".into(),
        },
        Command::GetData {
            token: token.clone(),
            key: "k".into(),
        },
        Command::Session { token },
    ]);

    assert_eq!(results.len(), 5);
    assert!(matches!(results[0], Ok(Output::Pong { .. })));
    assert!(matches!(results[1], Err(Error::NotFound { .. })));
    assert_eq!(results[2], Ok(Output::Unit));
    assert_eq!(results[3], Ok(Output::Json("1".into())));
    match &results[4] {
        Ok(Output::Account(info)) => assert_eq!(info.name, ADMIN),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_executor_is_shareable_across_threads() {
    let (app, token) = setup();
    let executor = app.executor().clone();
    let admin_token = token.clone();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let executor = executor.clone();
            let token = token.clone();
            std::thread::spawn(move || {
                executor.execute(Command::SetData {
                    token,
                    key: format!("k{}", i),
                    value: i.to_string(),
                })
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), Ok(Output::Unit));
    }
    assert_eq!(
        app.get_all_data(&admin_token).unwrap(),
        r#"{"k0":0,"k1":1,"k2":2,"k3":3}"#
    );
}
