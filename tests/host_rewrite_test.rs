//! End-to-end tests: real plugin processes through runner, merger, and
//! host file I/O.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use rewrite_host::config::{Config, PluginSpec};
use rewrite_host::edit::RejectReason;
use rewrite_host::error::TransportError;
use rewrite_host::host::Host;

fn sh_plugin(name: &str, script: &str) -> PluginSpec {
    PluginSpec {
        name: name.to_string(),
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        env: HashMap::new(),
        timeout_ms: None,
        enabled: true,
        required: false,
        working_dir: None,
    }
}

fn write_source(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("source.txt");
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_edits_from_multiple_plugins_are_merged() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "abcdefghij");

    let config = Config {
        plugins: vec![
            sh_plugin(
                "head",
                r#"cat >/dev/null; printf '{"edits":[{"start":0,"end":2,"replacement":"AA","message":"head"}]}'"#,
            ),
            sh_plugin(
                "tail",
                r#"cat >/dev/null; printf '{"edits":[{"start":8,"end":10,"replacement":"ZZ","message":"tail"}]}'"#,
            ),
        ],
        ..Config::default()
    };

    let report = Host::new(config).rewrite_file(&file).await.unwrap();

    assert!(report.changed);
    assert_eq!(report.merge.applied.len(), 2);
    assert_eq!(fs::read_to_string(&file).unwrap(), "AAcdefghZZ");
}

#[tokio::test]
async fn test_overlap_across_plugins_first_declared_wins() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "abcdefghij");

    let config = Config {
        plugins: vec![
            sh_plugin(
                "alpha",
                r#"cat >/dev/null; printf '{"edits":[{"start":0,"end":5,"replacement":"X"}]}'"#,
            ),
            sh_plugin(
                "beta",
                r#"cat >/dev/null; printf '{"edits":[{"start":3,"end":8,"replacement":"Y"}]}'"#,
            ),
        ],
        ..Config::default()
    };

    let report = Host::new(config).rewrite_file(&file).await.unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "Xfghij");
    assert_eq!(report.merge.applied.len(), 1);
    assert_eq!(report.merge.applied[0].origin, "alpha");
    assert_eq!(report.merge.rejected.len(), 1);
    assert_eq!(report.merge.rejected[0].edit.origin, "beta");
    assert_eq!(
        report.merge.rejected[0].reason,
        RejectReason::Overlap {
            start: 3,
            prior_end: 5
        }
    );
}

#[tokio::test]
async fn test_hanging_plugin_does_not_block_siblings() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "abcdefghij");

    let mut hanging = sh_plugin("hangs", "cat >/dev/null; sleep 30");
    hanging.timeout_ms = Some(300);

    let config = Config {
        plugins: vec![
            hanging,
            sh_plugin(
                "works",
                r#"cat >/dev/null; printf '{"edits":[{"start":0,"end":1,"replacement":"!"}]}'"#,
            ),
        ],
        ..Config::default()
    };

    let report = Host::new(config).rewrite_file(&file).await.unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        Err(TransportError::Timeout { timeout_ms: 300 })
    ));
    assert!(report.outcomes[1].result.is_ok());
    assert_eq!(fs::read_to_string(&file).unwrap(), "!bcdefghij");
}

#[tokio::test]
async fn test_malformed_plugin_output_is_isolated() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "abcdefghij");

    let config = Config {
        plugins: vec![
            sh_plugin("garbage", "cat >/dev/null; echo 'certainly not json'"),
            sh_plugin(
                "works",
                r#"cat >/dev/null; printf '{"edits":[{"start":0,"end":1,"replacement":"!"}]}'"#,
            ),
        ],
        ..Config::default()
    };

    let report = Host::new(config).rewrite_file(&file).await.unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        Err(TransportError::Malformed { .. })
    ));
    assert_eq!(fs::read_to_string(&file).unwrap(), "!bcdefghij");
}

#[tokio::test]
async fn test_codepoint_offsets_in_multibyte_source() {
    let dir = TempDir::new().unwrap();
    // 11 codepoints, 13 bytes
    let file = write_source(&dir, "héllo wörld");

    let config = Config {
        plugins: vec![sh_plugin(
            "greeting",
            r#"cat >/dev/null; printf '{"edits":[{"start":6,"end":11,"replacement":"earth"}]}'"#,
        )],
        ..Config::default()
    };

    Host::new(config).rewrite_file(&file).await.unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), "héllo earth");
}

#[tokio::test]
async fn test_out_of_range_edit_reported_not_applied() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "0123456789");

    let config = Config {
        plugins: vec![sh_plugin(
            "overreach",
            r#"cat >/dev/null; printf '{"edits":[{"start":8,"end":12,"replacement":"Z"}]}'"#,
        )],
        ..Config::default()
    };

    let report = Host::new(config).rewrite_file(&file).await.unwrap();

    assert!(!report.changed);
    assert_eq!(fs::read_to_string(&file).unwrap(), "0123456789");
    assert_eq!(
        report.merge.rejected[0].reason,
        RejectReason::OffsetOutOfRange {
            start: 8,
            end: 12,
            len: 10
        }
    );
}

#[tokio::test]
async fn test_manifest_discovered_plugin_runs() {
    let plugin_dir = TempDir::new().unwrap();

    let script_path = plugin_dir.path().join("shout.sh");
    fs::write(
        &script_path,
        "#!/bin/sh\ncat >/dev/null\nprintf '{\"edits\":[{\"start\":0,\"end\":0,\"replacement\":\"loud: \"}]}'\n",
    )
    .unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
    }

    fs::write(
        plugin_dir.path().join("shout.toml"),
        "name = \"shout\"\ncommand = \"./shout.sh\"\n",
    )
    .unwrap();

    let config_path = plugin_dir.path().join("host.toml");
    fs::write(
        &config_path,
        format!("plugin_dir = \"{}\"\n", plugin_dir.path().display()),
    )
    .unwrap();

    let config = rewrite_host::config::load_from_path(&config_path).unwrap();
    assert_eq!(config.plugins.len(), 1);

    let source_dir = TempDir::new().unwrap();
    let file = write_source(&source_dir, "quiet");

    Host::new(config).rewrite_file(&file).await.unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), "loud: quiet");
}
