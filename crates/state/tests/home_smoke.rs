use opengov_state::{home_dir, http_timeout, ENV_HTTP_TIMEOUT_MS};
use opengov_test_utils::{env_guard, set_env_var, HomeFixture};
use std::time::Duration;

#[test]
fn home_dir_follows_home_override() {
    let _guard = env_guard();
    let fixture = HomeFixture::new().unwrap();
    let _home = fixture.home_guard();
    assert_eq!(home_dir().unwrap(), fixture.home_path());
}

#[test]
fn http_timeout_reads_milliseconds() {
    let _guard = env_guard();
    let _timeout = set_env_var(ENV_HTTP_TIMEOUT_MS, Some("1500"));
    assert_eq!(http_timeout(), Duration::from_millis(1500));
}
