#![allow(dead_code)]

use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;

/// Stand-in for `anchore-cli`: echoes JSON per subcommand, with the policy
/// check failing the way a policy violation does.
pub const STUB_ANCHORE_CLI: &str = r#"#!/bin/sh
shift
if [ -n "$STUB_FAIL_ADD" ] && [ "$1 $2" = "image add" ]; then
    echo "cannot pull image $3" >&2
    exit 1
fi
if [ -n "$STUB_FAIL_VULN" ] && [ "$1 $2" = "image vuln" ]; then
    echo "vulnerability feed unavailable" >&2
    exit 1
fi
case "$1 $2" in
    "image add") echo "[{\"imageDigest\": \"sha256:feed\", \"analysis_status\": \"not_analyzed\"}]" ;;
    "image content") echo "{\"image\": \"$3\", \"content_type\": \"$4\", \"user\": \"$ANCHORE_CLI_USER\"}" ;;
    "image vuln") echo "{\"image\": \"$3\", \"vuln_type\": \"$4\"}" ;;
    "image get") echo "[{\"imageDigest\": \"sha256:feed\", \"user\": \"$ANCHORE_CLI_USER\"}]" ;;
    "evaluate check") echo "[{\"status\": \"fail\", \"detail\": \"$4\"}]"; exit 1 ;;
    *) echo "unexpected arguments: $*" >&2; exit 2 ;;
esac
"#;

pub struct Sandbox {
    pub root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        root.child("work").create_dir_all().unwrap();
        root.child("config").create_dir_all().unwrap();
        root.child("bin").create_dir_all().unwrap();
        Sandbox { root }
    }

    pub fn work(&self) -> PathBuf {
        self.root.child("work").path().to_path_buf()
    }

    pub fn install_stub_cli(&self) {
        self.install_stub("anchore-cli", STUB_ANCHORE_CLI);
    }

    /// Put an executable script named `name` first on the child's `PATH`.
    pub fn install_stub(&self, name: &str, script: &str) {
        let stub = self.root.child(format!("bin/{name}"));
        stub.write_str(script).unwrap();
        fs::set_permissions(stub.path(), fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn write_config(&self, contents: &str) {
        self.root.child("config/anchore-ci/config.toml").write_str(contents).unwrap();
    }

    pub fn command(&self) -> Command {
        let mut path = OsString::from(self.root.child("bin").path());
        if let Some(existing) = std::env::var_os("PATH") {
            path.push(":");
            path.push(existing);
        }

        let mut cmd = Command::cargo_bin("anchore-ci").expect("binary exists");
        cmd.current_dir(self.work())
            .env("HOME", self.root.path())
            .env("XDG_CONFIG_HOME", self.root.child("config").path())
            .env("PATH", path)
            .env_remove("RUST_LOG");
        for (name, _) in anchore_ci::config::ENGINE_ENV_DEFAULTS {
            cmd.env_remove(name);
        }
        cmd
    }

    pub fn work_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.work())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn read_work_file(&self, name: &str) -> String {
        fs::read_to_string(self.work().join(name)).unwrap()
    }
}

/// Serve exactly one HTTP request with a 200 JSON response and hand back the
/// request head that was received.
pub fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
    let (url, handle) = serve_sequence(vec![(200, body)]);
    let handle = thread::spawn(move || handle.join().unwrap().remove(0));
    (url, handle)
}

/// Answer one connection per `(status, body)` pair, in order, and hand back
/// the request heads in the order they arrived.
pub fn serve_sequence(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut heads = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            write!(
                stream,
                "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
            heads.push(head);
        }
        heads
    });
    (url, handle)
}
