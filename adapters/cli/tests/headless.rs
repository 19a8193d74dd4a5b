use std::process::Command;

fn mob_runner() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_mob-runner"));
    let _ = command.env("RUST_LOG", "warn");
    command
}

#[test]
fn builtin_course_first_level_can_be_finished() {
    let output = mob_runner()
        .args(["--steering", "centre", "--skip-tally", "--max-seconds", "300"])
        .output()
        .expect("failed to launch mob-runner");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "mob-runner failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Welcome to Mob Runner."));
    assert!(stdout.contains("level 1: score"), "unexpected output: {stdout}");
}

#[test]
fn seeded_runs_print_identical_summaries() {
    let run = || {
        mob_runner()
            .args(["--seed", "42", "--skip-tally", "--max-seconds", "300"])
            .output()
            .expect("failed to launch mob-runner")
    };
    let first = run();
    let second = run();

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn missing_tuning_file_is_reported() {
    let output = mob_runner()
        .args(["--tuning", "does/not/exist.toml"])
        .output()
        .expect("failed to launch mob-runner");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does/not/exist.toml"), "unexpected error: {stderr}");
}

#[test]
fn zero_fixed_rate_is_rejected() {
    let output = mob_runner()
        .args(["--fixed-hz", "0"])
        .output()
        .expect("failed to launch mob-runner");
    assert!(!output.status.success());
}
