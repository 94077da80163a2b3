//! Template environment and the function vocabulary exposed to template authors.
//!
//! The vocabulary is fixed: `split`, `replace`, `tolower`, `getenv`, `contains`,
//! `ishealthy` and `isrunning`. Each one is registered both as a function
//! (`tolower(service.name)`) and as a filter (`service.name | tolower`).

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Build the environment every render runs in.
///
/// Undefined behaviour is strict so a template referencing a field that does
/// not exist fails instead of silently rendering an empty string. A trailing
/// newline in the template source is kept in the output.
pub fn environment() -> Environment<'static> {
  let mut env = Environment::new();
  env.set_undefined_behavior(UndefinedBehavior::Strict);
  env.set_keep_trailing_newline(true);

  env.add_function("split", split);
  env.add_function("replace", replace);
  env.add_function("tolower", tolower);
  env.add_function("getenv", getenv);
  env.add_function("contains", contains);
  env.add_function("ishealthy", ishealthy);
  env.add_function("isrunning", isrunning);

  env.add_filter("split", split);
  env.add_filter("replace", replace);
  env.add_filter("tolower", tolower);
  env.add_filter("getenv", getenv);
  env.add_filter("contains", contains);
  env.add_filter("ishealthy", ishealthy);
  env.add_filter("isrunning", isrunning);

  env
}

/// Render `source` (named `name` in error messages) against `ctx`.
pub fn render_str<S: Serialize>(name: &str, source: &str, ctx: S) -> Result<String, minijinja::Error> {
  environment().render_named_str(name, source, ctx)
}

/// Split `s` on every occurrence of `sep`.
///
/// An empty separator splits into individual characters.
pub fn split(s: &str, sep: &str) -> Vec<String> {
  if sep.is_empty() {
    return s.chars().map(String::from).collect();
  }
  s.split(sep).map(String::from).collect()
}

/// Replace every occurrence of `old` with `new`.
pub fn replace(s: &str, old: &str, new: &str) -> String {
  s.replace(old, new)
}

pub fn tolower(s: &str) -> String {
  s.to_lowercase()
}

/// Value of the environment variable `name`, or an empty string when unset.
pub fn getenv(name: &str) -> String {
  std::env::var(name).unwrap_or_default()
}

pub fn contains(s: &str, substr: &str) -> bool {
  s.contains(substr)
}

/// Whether a health state denotes a healthy service or container.
///
/// Matches `healthy` and transitional states such as `updating-healthy`, but
/// not `unhealthy` or `updating-unhealthy`. This is stricter than a plain
/// substring test for `healthy`, which would accept both.
pub fn ishealthy(status: &str) -> bool {
  status.contains("healthy") && !status.contains("unhealthy")
}

/// Whether a lifecycle state denotes a running service or container.
pub fn isrunning(status: &str) -> bool {
  status.contains("running")
}
