mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use askdb::db::AccessMode;
use askdb::engine::Engine;
use askdb::engine::react::{ReactConfig, ReactEngine};
use askdb::error::AgentError;
use askdb::memory::MemoryEntry;
use askdb::thinker::mock::MockThinker;
use askdb::thinker::{Step, StepResult, TokenUsage};
use askdb::tools::sql::register_sql_tools;
use askdb::tools::{Outcome, ToolRegistry};
use common::{SLOW_QUERY, act, call, finish, seeded_db, wrap};
use tempfile::TempDir;

async fn build_engine(
    steps: Vec<StepResult>,
    config: ReactConfig,
) -> (ReactEngine, Arc<MockThinker>, TempDir) {
    let (db, dir) = seeded_db(AccessMode::ReadOnly);
    let tools = Arc::new(ToolRegistry::new());
    register_sql_tools(&tools, db).await;
    let thinker = Arc::new(MockThinker::new(steps));
    let engine = ReactEngine::new(thinker.clone(), tools, config);
    (engine, thinker, dir)
}

/// Results recorded for the first iteration, as seen by the thinker on its second call.
fn first_iteration_outcomes(thinker: &MockThinker) -> Vec<Outcome> {
    let seen = thinker.seen_histories();
    match &seen[1][1] {
        MemoryEntry::Iteration { results, .. } => {
            results.iter().map(|r| r.outcome.clone()).collect()
        }
        other => panic!("expected Iteration, got {other:?}"),
    }
}

#[tokio::test]
async fn finish_immediately() {
    let (engine, _, _dir) = build_engine(wrap(vec![finish("nada que hacer")]), ReactConfig::default()).await;
    assert_eq!(engine.run("do nothing").await.unwrap(), "nada que hacer");
}

#[tokio::test]
async fn list_tables_then_finish() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act("what is there", vec![call("sql_db_list_tables", &[])]),
            finish("Customers y Employees"),
        ]),
        ReactConfig::default(),
    )
    .await;

    let answer = engine.run("which tables?").await.unwrap();
    assert_eq!(answer, "Customers y Employees");
    assert_eq!(
        first_iteration_outcomes(&thinker),
        vec![Outcome::Success("Customers, Employees".to_string())]
    );
}

#[tokio::test]
async fn query_result_reaches_thinker() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act(
                "count employees",
                vec![call("sql_db_query", &[("query", "SELECT COUNT(*) AS total FROM Employees")])],
            ),
            finish("Hay 9 empleados."),
        ]),
        ReactConfig::default(),
    )
    .await;

    assert_eq!(engine.run("How many employees are there?").await.unwrap(), "Hay 9 empleados.");
    assert_eq!(
        first_iteration_outcomes(&thinker),
        vec![Outcome::Success("total\n9\n".to_string())]
    );
}

#[tokio::test]
async fn parallel_tool_calls_keep_order() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act(
                "look at both",
                vec![
                    call("sql_db_schema", &[("table_names", "Customers")]),
                    call("sql_db_query", &[("query", "SELECT COUNT(*) AS n FROM Customers")]),
                ],
            ),
            finish("3"),
        ]),
        ReactConfig::default(),
    )
    .await;

    engine.run("parallel").await.unwrap();
    let outcomes = first_iteration_outcomes(&thinker);
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(&outcomes[0], Outcome::Success(s) if s.contains("CREATE TABLE Customers")));
    assert_eq!(outcomes[1], Outcome::Success("n\n3\n".to_string()));
}

#[tokio::test]
async fn sql_error_becomes_observation() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act("typo", vec![call("sql_db_query", &[("query", "SELECT * FROM Employes")])]),
            finish("recovered"),
        ]),
        ReactConfig::default(),
    )
    .await;

    assert_eq!(engine.run("typo test").await.unwrap(), "recovered");
    assert!(matches!(
        &first_iteration_outcomes(&thinker)[0],
        Outcome::Error(e) if e.contains("no such table")
    ));
}

#[tokio::test]
async fn write_statement_blocked_in_read_only_mode() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act("be evil", vec![call("sql_db_query", &[("query", "DELETE FROM Employees")])]),
            act("check", vec![call("sql_db_query", &[("query", "SELECT COUNT(*) AS n FROM Employees")])]),
            finish("still 9"),
        ]),
        ReactConfig::default(),
    )
    .await;

    engine.run("delete everything").await.unwrap();
    assert!(matches!(
        &first_iteration_outcomes(&thinker)[0],
        Outcome::Error(e) if e.contains("read-only")
    ));
    let seen = thinker.seen_histories();
    match &seen[2][2] {
        MemoryEntry::Iteration { results, .. } => {
            assert_eq!(results[0].outcome, Outcome::Success("n\n9\n".to_string()));
        }
        other => panic!("expected Iteration, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_tool_produces_error_observation() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![act("bad tool", vec![call("shell", &[])]), finish("handled")]),
        ReactConfig::default(),
    )
    .await;

    assert_eq!(engine.run("bad tool test").await.unwrap(), "handled");
    assert!(matches!(
        &first_iteration_outcomes(&thinker)[0],
        Outcome::Error(e) if e.contains("unknown tool")
    ));
}

#[tokio::test]
async fn malformed_output_is_corrected() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            Step::Malformed {
                raw: "Final Answer: 9".to_string(),
                reason: "response is not valid JSON".to_string(),
            },
            finish("9"),
        ]),
        ReactConfig::default(),
    )
    .await;

    assert_eq!(engine.run("count").await.unwrap(), "9");
    let seen = thinker.seen_histories();
    assert!(matches!(
        &seen[1][1],
        MemoryEntry::Correction { raw, .. } if raw == "Final Answer: 9"
    ));
}

#[tokio::test]
async fn malformed_output_fails_when_not_handled() {
    let config = ReactConfig {
        handle_parsing_errors: false,
        ..ReactConfig::default()
    };
    let (engine, _, _dir) = build_engine(
        wrap(vec![Step::Malformed {
            raw: "???".to_string(),
            reason: "response is not valid JSON".to_string(),
        }]),
        config,
    )
    .await;

    let err = engine.run("count").await.unwrap_err();
    assert!(matches!(err, AgentError::Parse { ref raw, .. } if raw == "???"));
}

#[tokio::test]
async fn max_iterations_enforced() {
    let steps = (0..5)
        .map(|i| act(&format!("iteration {i}"), vec![call("sql_db_list_tables", &[])]))
        .collect();
    let config = ReactConfig {
        max_iterations: 3,
        tool_timeout: Duration::from_secs(5),
        handle_parsing_errors: true,
    };
    let (engine, thinker, _dir) = build_engine(wrap(steps), config).await;

    let err = engine.run("loop forever").await.unwrap_err();
    assert!(matches!(err, AgentError::MaxIterations(3)));
    assert_eq!(thinker.seen_histories().len(), 3);
}

#[tokio::test]
async fn slow_query_times_out_and_releases_database() {
    let config = ReactConfig {
        tool_timeout: Duration::from_millis(200),
        ..ReactConfig::default()
    };
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act("count a lot", vec![call("sql_db_query", &[("query", SLOW_QUERY)])]),
            act(
                "try something cheaper",
                vec![call("sql_db_query", &[("query", "SELECT COUNT(*) AS n FROM Employees")])],
            ),
            finish("9"),
        ]),
        config,
    )
    .await;

    let started = Instant::now();
    assert_eq!(engine.run("slow").await.unwrap(), "9");
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(
        first_iteration_outcomes(&thinker),
        vec![Outcome::Error("timed out".to_string())]
    );
    let seen = thinker.seen_histories();
    match &seen[2][2] {
        MemoryEntry::Iteration { results, .. } => {
            assert_eq!(results[0].outcome, Outcome::Success("n\n9\n".to_string()));
        }
        other => panic!("expected Iteration, got {other:?}"),
    }
}

#[tokio::test]
async fn thinker_failure_is_model_error() {
    let (engine, _, _dir) = build_engine(Vec::new(), ReactConfig::default()).await;

    let err = engine.run("anything").await.unwrap_err();
    assert!(matches!(err, AgentError::Model(_)));
}

#[tokio::test]
async fn runs_do_not_share_history() {
    let (engine, thinker, _dir) = build_engine(
        wrap(vec![
            act("first", vec![call("sql_db_list_tables", &[])]),
            finish("first answer"),
            finish("second answer"),
        ]),
        ReactConfig::default(),
    )
    .await;

    engine.run("first task").await.unwrap();
    engine.run("second task").await.unwrap();

    let seen = thinker.seen_histories();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2].len(), 1);
    assert!(matches!(&seen[2][0], MemoryEntry::Task { content } if content == "second task"));
}

#[tokio::test]
async fn usage_accumulates_across_runs() {
    let steps = vec![
        StepResult {
            step: finish("a"),
            usage: Some(TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            }),
        },
        StepResult {
            step: finish("b"),
            usage: Some(TokenUsage {
                input_tokens: 200,
                output_tokens: 75,
            }),
        },
    ];
    let (engine, _, _dir) = build_engine(steps, ReactConfig::default()).await;

    engine.run("first task").await.unwrap();
    engine.run("second task").await.unwrap();

    let usage = engine.total_usage();
    assert_eq!(usage.input_tokens, 300);
    assert_eq!(usage.output_tokens, 125);
    assert_eq!(usage.total(), 425);
}
