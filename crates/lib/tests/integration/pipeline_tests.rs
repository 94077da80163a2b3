//! End-to-end runs: metadata HTTP service → coordinator → files on disk.

use std::sync::Arc;
use std::time::Duration;

use stacktmpl_lib::pipeline::{Coordinator, Interrupt, Interrupts, Outcome, PipelineError, PipelineState};
use stacktmpl_lib::provider::{MetadataClient, ProviderError, WatchOptions, Watcher};
use stacktmpl_lib::render::{RenderUnitSet, load_all};

use super::common::{MetadataServer, PREFIX, SpecDir, append_line, wait_for_file};

const UPSTREAMS: &str = "\
{% for stack in stacks %}{% for svc in stack.services %}{% for c in svc.containers %}\
{% if c.health_state | ishealthy %}{{ stack.name }}/{{ svc.name | tolower }} {{ c.primary_ip }}
{% endif %}{% endfor %}{% endfor %}{% endfor %}";

fn options(self_only: bool) -> WatchOptions {
  WatchOptions {
    refresh: Duration::from_secs(30),
    self_only,
    connect_attempts: 1,
    connect_delay: Duration::from_millis(10),
  }
}

#[tokio::test]
async fn renders_topology_and_runs_action_once() {
  let server = MetadataServer::start().await;
  let dir = SpecDir::new();
  let actions = dir.path().join("actions.log");
  let upstreams = dir.add("upstreams", UPSTREAMS, Some(&append_line(&actions, "reload")));

  let units = RenderUnitSet::from_specs(load_all(&dir.pattern()).unwrap());
  let client = MetadataClient::new(&server.url(), PREFIX).unwrap();
  let coordinator = Coordinator::new(Watcher::new(client, options(false)), units);
  let states = coordinator.subscribe_state();
  let (interrupt, interrupts) = Interrupts::channel();
  let run = tokio::spawn(coordinator.run(interrupts));

  let rendered = wait_for_file(&upstreams).await;
  assert_eq!(rendered, "web/nginx 10.42.0.7\n");
  wait_for_file(&actions).await;

  // Both the eager snapshot and the `init` → `1` refresh carry the same
  // topology; give the second one time to land before stopping.
  tokio::time::sleep(Duration::from_millis(300)).await;
  interrupt.send(Interrupt::Term).unwrap();
  let report = tokio::time::timeout(Duration::from_secs(10), run)
    .await
    .unwrap()
    .unwrap()
    .unwrap();

  assert_eq!(report.outcome, Outcome::Interrupted);
  assert_eq!(*states.borrow(), PipelineState::Stopped);
  let reloads = std::fs::read_to_string(&actions).unwrap();
  assert_eq!(reloads.lines().count(), 1, "identical snapshots must not re-run the action");
  assert!(report.sink.units()[0].digest().is_some());
}

#[tokio::test]
async fn self_only_renders_own_stack() {
  let server = MetadataServer::start().await;
  let dir = SpecDir::new();
  let out = dir.add(
    "services",
    "{% for svc in stacks[0].services %}{{ svc.name }}\n{% endfor %}",
    None,
  );

  let units = RenderUnitSet::from_specs(load_all(&dir.pattern()).unwrap());
  let client = MetadataClient::new(&server.url(), PREFIX).unwrap();
  let coordinator = Coordinator::new(Watcher::new(client, options(true)), units);
  let (interrupt, interrupts) = Interrupts::channel();
  let run = tokio::spawn(coordinator.run(interrupts));

  // Sorted by name regardless of provider order.
  assert_eq!(wait_for_file(&out).await, "cron\nworker\n");

  interrupt.send(Interrupt::Int).unwrap();
  let report = run.await.unwrap().unwrap();
  assert_eq!(report.outcome, Outcome::Interrupted);
}

#[tokio::test]
async fn preexisting_identical_output_is_left_alone() {
  let server = MetadataServer::start().await;
  let dir = SpecDir::new();
  let actions = dir.path().join("actions.log");
  let out = dir.add("names", "{{ stacks | length }}", Some(&append_line(&actions, "reload")));
  std::fs::write(&out, "2").unwrap();

  let units = RenderUnitSet::from_specs(load_all(&dir.pattern()).unwrap());
  let client = MetadataClient::new(&server.url(), PREFIX).unwrap();
  let coordinator = Coordinator::new(Watcher::new(client, options(false)), units);
  let (interrupt, interrupts) = Interrupts::channel();
  let run = tokio::spawn(coordinator.run(interrupts));

  tokio::time::sleep(Duration::from_millis(500)).await;
  interrupt.send(Interrupt::Int).unwrap();
  run.await.unwrap().unwrap();

  assert_eq!(std::fs::read_to_string(&out).unwrap(), "2");
  assert!(!actions.exists());
}

#[tokio::test]
async fn unreachable_provider_fails_to_start() {
  let dir = SpecDir::new();
  dir.add("any", "x", None);

  let units = RenderUnitSet::from_specs(load_all(&dir.pattern()).unwrap());
  let client = MetadataClient::new("http://127.0.0.1:1", PREFIX).unwrap();
  let coordinator = Coordinator::new(Watcher::new(Arc::new(client), options(false)), units);

  let err = coordinator.run(Interrupts::never()).await.unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Connect(ProviderError::Unreachable { attempts: 1, .. })
  ));
}
