//! Shared test infrastructure for integration tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server};

/// Token handed to the binary; tests assert it reaches the stub verbatim.
pub const TEST_TOKEN: &str = "test-token-123";

/// A request captured by [`StubBuildApi`].
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// Local HTTP endpoint standing in for the build API.
pub struct StubBuildApi {
    server: Arc<Server>,
}

impl StubBuildApi {
    pub fn start() -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind stub server");
        Self {
            server: Arc::new(server),
        }
    }

    /// Base URL to pass as `--api-base`.
    pub fn api_base(&self) -> String {
        let addr = self.server.server_addr().to_ip().expect("stub listens on TCP");
        format!("http://{addr}/v2")
    }

    /// Answer one request on a background thread with `status`.
    pub fn serve_one(&self, status: u16) -> JoinHandle<CapturedRequest> {
        let server = Arc::clone(&self.server);
        thread::spawn(move || {
            let mut request = server.recv().expect("receive request");
            let headers = request
                .headers()
                .iter()
                .map(|header| {
                    (
                        header.field.as_str().as_str().to_ascii_lowercase(),
                        header.value.as_str().to_string(),
                    )
                })
                .collect();
            let mut body = Vec::new();
            request
                .as_reader()
                .read_to_end(&mut body)
                .expect("read request body");
            let captured = CapturedRequest {
                method: request.method().as_str().to_string(),
                path: request.url().to_string(),
                headers,
                body,
            };
            let content_type = Header::from_bytes("Content-Type", "application/json")
                .expect("static header");
            let response = Response::from_string("{}")
                .with_status_code(status)
                .with_header(content_type);
            request.respond(response).expect("write response");
            captured
        })
    }

    /// Panic if the stub received any request.
    pub fn assert_no_connection(&self) {
        let pending = self
            .server
            .recv_timeout(Duration::from_millis(100))
            .expect("poll stub server");
        if let Some(request) = pending {
            panic!("unexpected {} {}", request.method(), request.url());
        }
    }
}

/// Scratch git repository with a deterministic identity.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create an empty repository, or `None` when git is unavailable.
    pub fn init() -> Option<Self> {
        if Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_err()
        {
            eprintln!("Skipping: git not available");
            return None;
        }
        let repo = Self {
            dir: TempDir::new().expect("create temp repo"),
        };
        repo.git(&["init", "-q"]);
        Some(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `files` and commit them; returns the new commit id.
    pub fn commit(&self, files: &[(&str, &str)]) -> String {
        for (rel, contents) in files {
            let path = self.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent directory");
            }
            fs::write(path, contents).expect("write file");
        }
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "--no-gpg-sign", "-m", "change"]);
        self.git(&["rev-parse", "HEAD"])
    }

    fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .env("GIT_AUTHOR_NAME", "ab-trigger tests")
            .env("GIT_AUTHOR_EMAIL", "tests@example.com")
            .env("GIT_COMMITTER_NAME", "ab-trigger tests")
            .env("GIT_COMMITTER_EMAIL", "tests@example.com")
            .output()
            .expect("run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

/// Invocation of the `ab-trigger` binary with an isolated environment.
pub struct Cli {
    command: Command,
    _home: TempDir,
}

impl Cli {
    pub fn isolated() -> Self {
        let home = TempDir::new().expect("create temp home");
        let mut command = Command::new(bin_path());
        command
            .env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path().join("config"))
            .env("RUST_LOG", "info");
        Self {
            command,
            _home: home,
        }
    }

    pub fn with_token(mut self) -> Self {
        self.command.env("BUILDKITE_TOKEN", TEST_TOKEN);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.command.env(key, value);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.command.args(args);
        self
    }

    pub fn output(mut self) -> Output {
        self.command.output().expect("run ab-trigger")
    }
}

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ab-trigger"))
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}
