//! Shared helpers: a mock metadata service and a scratch directory of specs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PREFIX: &str = "2016-07-29";

pub const STACKS_JSON: &str = r#"[
  {"name": "web", "services": [
    {"name": "nginx", "state": "active",
     "containers": [{"name": "web-nginx-1", "primary_ip": "10.42.0.7", "health_state": "healthy"}]},
    {"name": "api", "state": "active",
     "containers": [{"name": "web-api-1", "primary_ip": "10.42.0.9", "health_state": "unhealthy"}]}
  ]},
  {"name": "db", "services": [{"name": "postgres", "state": "inactive"}]}
]"#;

/// Mock metadata service that answers the connect probe, one long-poll
/// from `init` to version `1`, and the topology endpoints.
///
/// Further long-polls are left unmatched, so the watcher sees an error and
/// backs off for a full refresh interval instead of spinning.
pub struct MetadataServer {
  pub server: MockServer,
}

impl MetadataServer {
  pub async fn start() -> Self {
    let server = MockServer::start().await;
    let version = format!("/{PREFIX}/version");

    Mock::given(method("GET"))
      .and(path(version.as_str()))
      .and(query_param_is_missing("wait"))
      .respond_with(json("\"1\""))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path(version.as_str()))
      .and(query_param("value", "init"))
      .respond_with(json("\"1\""))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path(format!("/{PREFIX}/stacks")))
      .respond_with(json(STACKS_JSON))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path(format!("/{PREFIX}/self/stack")))
      .respond_with(json(
        r#"{"name": "mine", "services": [{"name": "worker"}, {"name": "cron"}]}"#,
      ))
      .mount(&server)
      .await;

    Self { server }
  }

  pub fn url(&self) -> String {
    self.server.uri()
  }
}

fn json(body: &str) -> ResponseTemplate {
  ResponseTemplate::new(200)
    .insert_header("content-type", "application/json")
    .set_body_string(body)
}

/// Scratch directory holding templates, specs and rendered output.
pub struct SpecDir {
  pub temp: TempDir,
}

impl SpecDir {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write `<name>.tmpl` and `<name>.yml`; the destination is `<name>.out`.
  pub fn add(&self, name: &str, template: &str, action: Option<&str>) -> PathBuf {
    let source = self.path().join(format!("{name}.tmpl"));
    let destination = self.path().join(format!("{name}.out"));
    std::fs::write(&source, template).unwrap();

    let mut spec = format!(
      "source: {}\ndestination: {}\n",
      yaml_str(&source),
      yaml_str(&destination)
    );
    if let Some(action) = action {
      spec.push_str(&format!("action: {}\n", yaml_quote(action)));
    }
    std::fs::write(self.path().join(format!("{name}.yml")), spec).unwrap();

    destination
  }

  pub fn pattern(&self) -> String {
    self.path().join("*.yml").display().to_string()
  }
}

fn yaml_str(path: &Path) -> String {
  yaml_quote(&path.display().to_string())
}

fn yaml_quote(s: &str) -> String {
  format!("'{}'", s.replace('\'', "''"))
}

/// Shell command appending a line to `path`.
pub fn append_line(path: &Path, line: &str) -> String {
  if cfg!(windows) {
    format!("echo {}>> \"{}\"", line, path.display())
  } else {
    format!("echo {} >> '{}'", line, path.display())
  }
}

/// Poll until `path` holds content, or panic after a few seconds.
pub async fn wait_for_file(path: &Path) -> String {
  for _ in 0..200 {
    match std::fs::read_to_string(path) {
      Ok(content) if !content.is_empty() => return content,
      _ => tokio::time::sleep(Duration::from_millis(25)).await,
    }
  }
  panic!("{} was never written", path.display());
}
