mod common;
use crate::common::{
    FakeScript, OptionsBuilder, ScriptedLauncher, cancel_after, fake_runner, init_tracing, within,
};

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use tfrunner::exec::{RunError, RunEvent};

type TestResult = Result<(), Box<dyn Error>>;

const LIMIT: Duration = Duration::from_secs(5);

fn reset(label: &str) -> FakeScript {
    FakeScript::exits(1)
        .stdout(label)
        .stderr("Error: read tcp: connection reset by peer")
}

#[tokio::test]
async fn max_retries_bounds_attempts_and_returns_last_result() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::new(vec![reset("attempt 1"), reset("attempt 2"), reset("attempt 3")]);
    let options = OptionsBuilder::new()
        .retry("connection reset", "d1")
        .max_retries(2)
        .build();
    let (runner, observer) = fake_runner(options, &launcher);

    let cancel = CancellationToken::new();
    let err = within(LIMIT, runner.run(&cancel, ["apply"])).await.unwrap_err();

    assert_eq!(launcher.launch_count(), 3);
    assert!(matches!(err, RunError::Tool { .. }));
    assert_eq!(err.output().stdout, "attempt 3");
    assert_eq!(err.exit_code(), 1);

    let retries = observer.count(|e| matches!(e, RunEvent::RetryScheduled { .. }));
    assert_eq!(retries, 2);
    assert!(observer.events().contains(&RunEvent::RetryScheduled {
        attempt: 1,
        max_attempts: 3,
        reason: "d1".to_string(),
        delay: Duration::from_millis(10),
    }));
    Ok(())
}

#[tokio::test]
async fn unmatched_failure_is_not_retried() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::always(FakeScript::exits(1).stderr("Error: invalid reference"));
    let options = OptionsBuilder::new()
        .retry("connection reset", "d1")
        .max_retries(5)
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);

    let err = runner
        .run(&CancellationToken::new(), ["apply"])
        .await
        .unwrap_err();

    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(err.output().stderr, "Error: invalid reference");
    Ok(())
}

#[tokio::test]
async fn success_after_transient_failure() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::new(vec![
        FakeScript::exits(1).stderr("etcdserver: leader changed"),
        FakeScript::exits(0).stdout("Apply complete!"),
    ]);
    let options = OptionsBuilder::new()
        .retry("etcdserver: leader changed", "leader changed")
        .max_retries(3)
        .build();
    let (runner, observer) = fake_runner(options, &launcher);

    let out = runner.run(&CancellationToken::new(), ["apply"]).await?;

    assert_eq!(launcher.launch_count(), 2);
    assert_eq!(out.exit_code, 0);
    assert_eq!(out.stdout, "Apply complete!");
    assert!(observer.events().contains(&RunEvent::AttemptSucceeded { attempt: 2 }));
    Ok(())
}

#[tokio::test]
async fn success_short_circuits_even_with_matching_output() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::always(FakeScript::exits(0).stdout("connection reset by peer (recovered)"));
    let options = OptionsBuilder::new()
        .retry("connection reset", "d1")
        .max_retries(3)
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);

    runner.run(&CancellationToken::new(), ["apply"]).await?;
    assert_eq!(launcher.launch_count(), 1);
    Ok(())
}

#[tokio::test]
async fn retry_pattern_can_match_the_error_message() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::new(vec![FakeScript::exits(3), FakeScript::exits(0)]);
    let options = OptionsBuilder::new()
        .retry("exited with code 3", "exit 3 is transient")
        .max_retries(1)
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);

    runner.run(&CancellationToken::new(), ["plan"]).await?;
    assert_eq!(launcher.launch_count(), 2);
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_retried_only_when_a_pattern_matches() -> TestResult {
    init_tracing();

    // Matching pattern: retried, then succeeds.
    let launcher = ScriptedLauncher::new(vec![
        FakeScript::spawn_failure("text file busy"),
        FakeScript::exits(0),
    ]);
    let options = OptionsBuilder::new()
        .retry("text file busy", "binary being replaced")
        .max_retries(1)
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);
    runner.run(&CancellationToken::new(), ["init"]).await?;
    assert_eq!(launcher.launch_count(), 2);

    // No matching pattern: fails immediately with the runner's exit code.
    let launcher = ScriptedLauncher::always(FakeScript::spawn_failure("No such file or directory"));
    let options = OptionsBuilder::new()
        .retry("text file busy", "binary being replaced")
        .max_retries(3)
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);
    let err = runner
        .run(&CancellationToken::new(), ["init"])
        .await
        .unwrap_err();

    assert_eq!(launcher.launch_count(), 1);
    assert!(matches!(err, RunError::Spawn { .. }));
    assert_eq!(err.exit_code(), -1);
    assert!(err.to_string().contains("No such file or directory"));
    Ok(())
}

#[tokio::test]
async fn cancellation_during_backoff_returns_last_result() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::always(reset("only attempt"));
    let options = OptionsBuilder::new()
        .retry("connection reset", "d1")
        .max_retries(5)
        .time_between_retries(Duration::from_secs(30))
        .build();
    let (runner, observer) = fake_runner(options, &launcher);

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_millis(100));

    let started = Instant::now();
    let err = within(LIMIT, runner.run(&cancel, ["apply"])).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(launcher.launch_count(), 1);
    assert!(matches!(err, RunError::Tool { .. }));
    assert_eq!(err.output().stdout, "only attempt");
    assert!(observer.events().contains(&RunEvent::BackoffInterrupted { attempt: 1 }));
    Ok(())
}

#[tokio::test]
async fn command_line_carries_dir_env_and_binary() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::always(FakeScript::exits(0));
    let options = OptionsBuilder::new()
        .working_dir("/work/infra")
        .binary("/opt/bin/tofu")
        .env("TF_IN_AUTOMATION", "1")
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);

    runner.state_rm(&CancellationToken::new(), "helm_release.slurm").await?;

    let launched = launcher.launched();
    assert_eq!(launched.len(), 1);
    let cmd = &launched[0];
    assert_eq!(cmd.program, PathBuf::from("/opt/bin/tofu"));
    assert_eq!(cmd.dir, PathBuf::from("/work/infra"));
    assert_eq!(cmd.args, vec!["state", "rm", "helm_release.slurm"]);
    assert_eq!(cmd.env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
    Ok(())
}

#[tokio::test]
async fn apply_passes_formatted_variables() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::always(FakeScript::exits(0));
    let options = OptionsBuilder::new()
        .var("region", "eu-north1")
        .var("node_count", 3)
        .build();
    let (runner, _observer) = fake_runner(options, &launcher);

    runner.apply(&CancellationToken::new()).await?;

    assert_eq!(
        launcher.launched_args(),
        vec![vec![
            "apply",
            "-input=false",
            "-auto-approve",
            "-var",
            "node_count=3",
            "-var",
            "region=\"eu-north1\"",
        ]]
    );
    Ok(())
}

#[tokio::test]
async fn state_list_splits_addresses() -> TestResult {
    init_tracing();

    let launcher = ScriptedLauncher::always(
        FakeScript::exits(0).stdout("module.k8s.helm_release.a\n\nnebius_mk8s_cluster.main\n"),
    );
    let (runner, _observer) = fake_runner(OptionsBuilder::new().build(), &launcher);

    let addresses = runner.state_list(&CancellationToken::new()).await?;
    assert_eq!(
        addresses,
        vec!["module.k8s.helm_release.a", "nebius_mk8s_cluster.main"]
    );
    Ok(())
}
