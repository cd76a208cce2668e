//! CLI integration tests that stay off the network.

use std::fs;
use std::process::Command;

use anyhow::{Context, Result};

#[test]
fn given_malformed_config_when_listing_tools_then_all_three_are_printed() -> Result<()> {
    // GIVEN a HOME whose config file does not parse
    let tmp = tempfile::tempdir()?;
    let config_dir = tmp.path().join(".opengov");
    fs::create_dir_all(&config_dir)?;
    fs::write(config_dir.join("config.toml"), "[portal\n")?;

    // WHEN the user runs `opengov serve --list-tools`
    let output = Command::new(env!("CARGO_BIN_EXE_opengov"))
        .env("HOME", tmp.path())
        .args(["serve", "--list-tools"])
        .output()
        .context("failed to execute serve --list-tools")?;

    // THEN the bad config is only warned about and every tool is listed
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "serve --list-tools failed\nstdout:\n{stdout}\nstderr:\n{stderr}"
    );
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(names, vec!["get_data", "search", "fetch"]);
    Ok(())
}

#[test]
fn given_unparseable_limit_when_querying_then_exit_is_nonzero() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let output = Command::new(env!("CARGO_BIN_EXE_opengov"))
        .env("HOME", tmp.path())
        .args(["query", "ijzp-q8t2", "--limit", "plenty"])
        .output()
        .context("failed to execute query")?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--limit"), "stderr:\n{stderr}");
    Ok(())
}
