//! Tests for `openslides start`.

use crate::support::*;

#[test]
fn test_start_writes_descriptor_and_secrets() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));

    let output = t.start(&source.url, &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "deployment ready");

    let descriptor = t.descriptor();
    for repo in REPOSITORIES {
        let pinned = format!("{}.git#{}", repo, revision("v1", repo));
        assert!(descriptor.contains(&pinned), "missing {}", pinned);
    }
    assert!(descriptor.contains("OpenSlides.git#main:proxy"));
    assert!(descriptor.contains("127.0.0.1:8000:8000"));
    assert!(descriptor.contains("127.0.0.1:9008:9008"));
    assert!(!descriptor.contains("{{"));

    assert_eq!(t.secret("auth_token_key").len(), 32);
    assert_eq!(t.secret("auth_cookie_key").len(), 32);
    assert_ne!(t.secret("auth_token_key"), t.secret("auth_cookie_key"));
}

#[test]
fn test_start_queries_meta_repository_at_ref() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));

    assert_success(&t.start(&source.url, &["--ref", "stable/4.0.x"]));

    let request = source.next_request().expect("no request received");
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/repos/OpenSlides/OpenSlides/contents");
    assert_eq!(request.param("ref"), ["stable/4.0.x"]);
    assert!(t.descriptor().contains("OpenSlides.git#stable/4.0.x:proxy"));
}

#[test]
fn test_start_sends_reserved_characters_in_ref_verbatim() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));

    assert_success(&t.start(&source.url, &["--ref", "feature#1&ref=main"]));

    let request = source.next_request().expect("no request received");
    assert_eq!(request.param("ref"), ["feature#1&ref=main"]);
}

#[test]
fn test_start_custom_ports() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));

    let output = t.start(&source.url, &["--http-port", "8080", "--manage-port", "9010"]);
    assert_success(&output);

    let descriptor = t.descriptor();
    assert!(descriptor.contains("127.0.0.1:8080:8000"));
    assert!(descriptor.contains("127.0.0.1:9010:9008"));
}

#[test]
fn test_start_ports_from_environment() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));

    let output = t
        .cmd()
        .arg("start")
        .arg("--data-dir")
        .arg(t.dir.path())
        .env("OPENSLIDES_SOURCE_URL", &source.url)
        .env("OPENSLIDES_HTTP_PORT", "8123")
        .output()
        .unwrap();
    assert_success(&output);
    assert!(t.descriptor().contains("127.0.0.1:8123:8000"));
}

#[test]
fn test_start_reads_config_file() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));
    let config = t.write_config("[bootstrap]\nref = \"v4.1.0\"\nhttp_port = 8200\n");

    let output = t.start(&source.url, &["--config", config.to_str().unwrap()]);
    assert_success(&output);

    let descriptor = t.descriptor();
    assert!(descriptor.contains("127.0.0.1:8200:8000"));
    assert!(descriptor.contains("OpenSlides.git#v4.1.0:proxy"));
}

#[test]
fn test_flag_overrides_config_file() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));
    let config = t.write_config("[bootstrap]\nhttp_port = 8200\n");

    let output = t.start(
        &source.url,
        &["--config", config.to_str().unwrap(), "--http-port", "8300"],
    );
    assert_success(&output);
    assert!(t.descriptor().contains("127.0.0.1:8300:8000"));
}

#[test]
fn test_rerun_keeps_existing_files() {
    let t = Test::new();
    let first = Responder::serve(200, full_listing("v1"));
    assert_success(&t.start(&first.url, &[]));

    let descriptor = t.descriptor();
    let token = t.secret("auth_token_key");

    let second = Responder::serve(200, full_listing("v2"));
    let output = t.start(&second.url, &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "kept");

    assert_eq!(t.descriptor(), descriptor);
    assert_eq!(t.secret("auth_token_key"), token);
    assert!(second.next_request().is_none(), "source should not be consulted");
}

#[test]
fn test_rerun_with_ref_warns_descriptor_kept() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));
    assert_success(&t.start(&source.url, &[]));

    let output = t.start(&source.url, &["--ref", "v4.2.0"]);
    assert_success(&output);
    assert_stdout_contains(&output, "--ref v4.2.0 not applied");
    assert!(!t.descriptor().contains("OpenSlides.git#v4.2.0:proxy"));
}

#[test]
fn test_rerun_rejects_truncated_secret() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));
    assert_success(&t.start(&source.url, &[]));
    std::fs::write(t.secret_path("auth_token_key"), b"abc").unwrap();

    let output = t.start(&source.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "existing secret auth_token_key has 3 bytes");
    assert_stderr_contains(&output, "--force");
    assert_eq!(t.secret("auth_token_key"), b"abc");

    assert_success(&t.start(&source.url, &["--force"]));
    assert_eq!(t.secret("auth_token_key").len(), 32);
}

#[test]
fn test_rerun_recreates_missing_secret_only() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));
    assert_success(&t.start(&source.url, &[]));

    let token = t.secret("auth_token_key");
    std::fs::remove_file(t.secret_path("auth_cookie_key")).unwrap();

    assert_success(&t.start(&source.url, &[]));
    assert_eq!(t.secret("auth_token_key"), token);
    assert_eq!(t.secret("auth_cookie_key").len(), 32);
}

#[test]
fn test_force_regenerates_everything() {
    let t = Test::new();
    let first = Responder::serve(200, full_listing("v1"));
    assert_success(&t.start(&first.url, &[]));
    let token = t.secret("auth_token_key");

    let second = Responder::serve(200, full_listing("v2"));
    assert_success(&t.start(&second.url, &["--force"]));

    assert!(t
        .descriptor()
        .contains(&revision("v2", "openslides-auth-service")));
    assert_ne!(t.secret("auth_token_key"), token);
}

#[cfg(unix)]
#[test]
fn test_secret_permissions() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));
    assert_success(&t.start(&source.url, &[]));

    assert_mode(&t.dir.path().join("secrets"), 0o700);
    assert_mode(&t.secret_path("auth_token_key"), 0o600);
    assert_mode(&t.secret_path("auth_cookie_key"), 0o600);
}

#[test]
fn test_unknown_ref_fails_without_files() {
    let t = Test::new();
    let source = Responder::serve(404, r#"{"message":"No commit found for the ref nope"}"#);

    let output = t.start(&source.url, &["--ref", "nope"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "resolving component versions");
    assert_stderr_contains(&output, "HTTP 404");
    assert_stderr_contains(&output, "--ref");
    assert_nothing_written(t.dir.path());
}

#[test]
fn test_malformed_listing_fails_without_files() {
    let t = Test::new();
    let source = Responder::serve(200, "<html>rate limited</html>");

    let output = t.start(&source.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "malformed component listing");
    assert_nothing_written(t.dir.path());
}

#[test]
fn test_non_hex_revision_fails_without_files() {
    let t = Test::new();
    let listing = serde_json::json!([
        {"name": "openslides-auth-service", "sha": "abc\n    privileged: true", "type": "file"}
    ]);
    let source = Responder::serve(200, listing.to_string());

    let output = t.start(&source.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid revision");
    assert_nothing_written(t.dir.path());
}

#[test]
fn test_missing_component_fails_without_files() {
    let t = Test::new();
    let source = Responder::serve(200, listing_without("v1", &["openslides-auth-service"]));

    let output = t.start(&source.url, &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "rendering deployment descriptor");
    assert_stderr_contains(&output, "'auth'");
    assert_nothing_written(t.dir.path());
}

#[test]
fn test_timeout_fails_without_files() {
    let t = Test::new();
    let source = Responder::hang();

    let output = t.start(&source.url, &["--timeout", "1"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "did not answer");
    assert_stderr_contains(&output, "--timeout");
    assert_nothing_written(t.dir.path());
}
