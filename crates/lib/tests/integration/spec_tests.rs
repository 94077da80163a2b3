//! Spec discovery against a real directory tree.

use stacktmpl_lib::render::{RenderUnitSet, SpecError, load_all};

use super::common::SpecDir;

#[test]
fn loads_specs_in_path_order() {
  let dir = SpecDir::new();
  dir.add("b", "b", None);
  dir.add("a", "a", Some("true"));
  dir.add("c", "c", None);

  let specs = load_all(&dir.pattern()).unwrap();
  let names: Vec<_> = specs
    .iter()
    .map(|s| s.source.file_name().unwrap().to_string_lossy().into_owned())
    .collect();

  assert_eq!(names, vec!["a.tmpl", "b.tmpl", "c.tmpl"]);
  assert_eq!(specs[0].action.as_deref(), Some("true"));
}

#[test]
fn invalid_specs_are_skipped() {
  let dir = SpecDir::new();
  dir.add("good", "ok", None);
  std::fs::write(dir.path().join("broken.yml"), "source: [unterminated").unwrap();
  std::fs::write(dir.path().join("partial.yml"), "source: /tmp/x\n").unwrap();

  let specs = load_all(&dir.pattern()).unwrap();

  assert_eq!(specs.len(), 1);
  assert!(specs[0].source.ends_with("good.tmpl"));
}

#[test]
fn no_matching_files_is_an_error() {
  let dir = SpecDir::new();
  assert!(matches!(load_all(&dir.pattern()), Err(SpecError::NoFiles { .. })));
}

#[test]
fn only_invalid_specs_is_an_error() {
  let dir = SpecDir::new();
  std::fs::write(dir.path().join("empty.yml"), "source: ''\ndestination: ''\n").unwrap();

  assert!(matches!(load_all(&dir.pattern()), Err(SpecError::NoValidSpecs { .. })));
}

#[test]
fn units_seed_digest_from_existing_destination() {
  let dir = SpecDir::new();
  let out = dir.add("seeded", "x", None);
  std::fs::write(&out, "already here").unwrap();
  dir.add("fresh", "y", None);

  let set = RenderUnitSet::from_specs(load_all(&dir.pattern()).unwrap());

  let fresh = &set.units()[0];
  let seeded = &set.units()[1];
  assert!(fresh.digest().is_none());
  assert!(seeded.digest().is_some());
}
