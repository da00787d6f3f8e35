//! Integration tests for Watchstore

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn watchstore(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("watchstore");
        cmd.current_dir(dir).env_remove("WATCHSTORE_CONFIG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("file cache with transforms"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("watchstore"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("one-hop"));
    }

    #[test]
    fn config_path_points_at_project() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("watchstore.toml"));
    }

    #[test]
    fn config_init_writes_file_once() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(temp.path().join("watchstore.toml").is_file());

        watchstore(temp.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stderr(predicate::str::contains("--force"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .args(["--config", "nope.toml", "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"))
            .stderr(predicate::str::contains("watchstore config init"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("watchstore.toml"), "skip = 3").unwrap();
        watchstore(temp.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn get_prints_content() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("hello.txt"), "hello world").unwrap();
        watchstore(temp.path())
            .args(["get", "hello.txt"])
            .assert()
            .success()
            .stdout("hello world");
    }

    #[test]
    fn get_info_shows_metadata() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("page.html"), "<p>hi</p>").unwrap();
        watchstore(temp.path())
            .args(["get", "--info", "page.html"])
            .assert()
            .success()
            .stdout(predicate::str::contains("text/html"))
            .stdout(predicate::str::contains("9 bytes"));
    }

    #[test]
    fn get_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        watchstore(temp.path())
            .args(["get", "missing.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File not found or skipped"));
    }

    #[test]
    fn get_skipped_file_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("watchstore.toml"), "skip = [\"*.log\"]").unwrap();
        std::fs::write(temp.path().join("debug.log"), "noise").unwrap();
        watchstore(temp.path())
            .args(["get", "debug.log"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("skip patterns"));
    }

    #[test]
    fn get_directory_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        watchstore(temp.path())
            .args(["get", "sub"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("File is directory"));
    }

    #[cfg(unix)]
    #[test]
    fn get_runs_configured_transform() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("watchstore.toml"),
            r#"
[[transpile]]
name = "upper"
test = ["*.txt"]
command = ["tr", "a-z", "A-Z"]
content_type = "text/x-shout"
"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("quiet.txt"), "quiet please").unwrap();

        watchstore(temp.path())
            .args(["get", "quiet.txt"])
            .assert()
            .success()
            .stdout("QUIET PLEASE");

        watchstore(temp.path())
            .args(["get", "-i", "quiet.txt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("text/x-shout"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_transform_command_reports_stderr() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("watchstore.toml"),
            r#"
[[transpile]]
test = ["*.txt"]
command = ["sh", "-c", "echo broken >&2; exit 3"]
"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("a.txt"), "x").unwrap();

        watchstore(temp.path())
            .args(["get", "a.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("broken"));
    }
}

mod store_tests {
    use regex::Regex;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use watchstore::transform::{from_callback, from_fn, RawOutput};
    use watchstore::{
        FileEntry, FsWatcher, PatternSet, TransformSpec, WatchStore, WatchStoreOptions,
    };

    fn project() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let base = temp.path().canonicalize().unwrap();
        (temp, base)
    }

    #[tokio::test]
    async fn base_skip_and_transform_scenario() {
        let (_temp, base) = project();
        std::fs::write(base.join("app.ts"), "export const x = 1;").unwrap();
        std::fs::write(base.join("debug.log"), "noise").unwrap();

        let identity = from_fn(|src, _| {
            Ok(RawOutput::triple(
                src,
                Vec::<String>::new(),
                Some("application/javascript"),
            ))
        });
        let store = WatchStore::new(
            WatchStoreOptions::new()
                .with_base(&base)
                .with_skip(PatternSet::from_globs(["*.log"]).unwrap())
                .with_transform(TransformSpec::new(Regex::new(r"\.ts$").unwrap(), identity)),
        );

        let entry = store.get_file(base.join("app.ts")).await.unwrap().unwrap();
        assert_eq!(entry.content_type, "application/javascript");
        assert_eq!(entry.transpiled_data.as_deref(), Some("export const x = 1;"));
        assert!(store.get_file(base.join("debug.log")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn callback_plugin_reports_dependencies() {
        let (_temp, base) = project();
        std::fs::write(base.join("part.css"), "p {}").unwrap();
        std::fs::write(base.join("main.less"), "@import 'part.css';").unwrap();

        let plugin = from_callback(|_input, _ctx, done| {
            tokio::spawn(async move {
                done.ok(RawOutput::triple("compiled", ["part.css"], Some("text/css")));
            });
        });
        let store = WatchStore::new(
            WatchStoreOptions::new()
                .with_base(&base)
                .with_transform(TransformSpec::new("*.less", plugin)),
        );

        let entry = store.get_file("/main.less").await.unwrap().unwrap();
        assert_eq!(entry.content_type, "text/css");
        assert_eq!(entry.dependencies, vec![base.join("part.css")]);
        assert_eq!(store.dependents_of(&base.join("part.css")), vec![base.join("main.less")]);
    }

    #[tokio::test]
    async fn filesystem_changes_reach_listeners() {
        let (_temp, base) = project();
        let style = base.join("style.css");
        std::fs::write(&style, "a {}").unwrap();

        let store = WatchStore::new(
            WatchStoreOptions::new()
                .with_base(&base)
                .with_watcher(Arc::new(FsWatcher::new(Duration::from_millis(30)))),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        store.on_change(Arc::new(move |entries: &[FileEntry]| {
            let _ = tx.send(entries.to_vec());
        }));

        store.get_file("/style.css").await.unwrap().unwrap();
        store.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        std::fs::write(&style, "b {}").unwrap();
        let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no batch within timeout")
            .unwrap();

        assert_eq!(batch[0].path, style);
        assert_eq!(store.get_cached_data(&style).unwrap().as_text(), Some("b {}"));
        store.stop();
        assert!(store.is_empty());
    }
}
