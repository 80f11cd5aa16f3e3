//! Scoped identifier generation for local selectors.
//!
//! CSS identifiers cannot start with a digit, or a hyphen followed by a digit, and cannot be
//! empty. The first segment of every generated name is a single letter so both rules hold without
//! escaping.

use crate::hash::sha1_hex;
use crate::types::BuildMode;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derives deterministic, globally scoped class names from `(source file, local selector)` pairs
#[derive(Clone, Debug, Default)]
pub struct Namer {
  mode: BuildMode,
}

impl Namer {
  pub fn new(mode: BuildMode) -> Self {
    Self { mode }
  }

  /// Name `selector` as declared in `source_file`.
  ///
  /// In development mode the local selector is kept as a readable prefix, e.g. `title--g-1jbp-cpz3n6`.
  pub fn name(&self, source_file: &str, selector: &str) -> String {
    let hash = sha1_hex(format!("{source_file}{selector}").as_bytes());

    let parts = [
      to_base36(hex_window(&hash, 0, 2) % 25 + 10),
      truncate(to_base36(hex_window(&hash, 2, 10)), 4),
      truncate(to_base36(hex_window(&hash, 10, 20)), 6),
    ];
    let unique = parts.join("-");

    if self.mode.is_development() {
      format!("{selector}--{unique}")
    } else {
      unique
    }
  }
}

fn hex_window(hash: &str, start: usize, end: usize) -> u64 {
  hash
    .get(start..end)
    .and_then(|window| u64::from_str_radix(window, 16).ok())
    .unwrap_or_default()
}

fn to_base36(mut value: u64) -> String {
  if value == 0 {
    return String::from("0");
  }

  let mut digits = Vec::new();
  while value > 0 {
    digits.push(BASE36_DIGITS[(value % 36) as usize] as char);
    value /= 36;
  }

  digits.iter().rev().collect()
}

fn truncate(value: String, length: usize) -> String {
  value.chars().take(length).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_stable() {
    let namer = Namer::new(BuildMode::Production);

    assert_eq!(namer.name("a.mcss", "title"), "g-1jbp-cpz3n6");
    assert_eq!(namer.name("src/button.mcss", "root"), "u-ink4-8dqy75");
  }

  #[test]
  fn names_are_deterministic_across_instances() {
    let first = Namer::new(BuildMode::Production);
    let second = Namer::new(BuildMode::Production);

    for (file, selector) in [("a.mcss", "logo"), ("b/c.mcss", "x"), ("", "")] {
      assert_eq!(first.name(file, selector), second.name(file, selector));
    }
  }

  #[test]
  fn development_names_keep_the_selector() {
    let namer = Namer::new(BuildMode::Development);

    assert_eq!(namer.name("a.mcss", "title"), "title--g-1jbp-cpz3n6");
  }

  #[test]
  fn other_modes_are_not_verbose() {
    let namer = Namer::new(BuildMode::Other(String::from("test")));

    assert_eq!(namer.name("a.mcss", "logo"), "m-g4hg-mpf2s1");
  }

  #[test]
  fn names_never_start_with_a_digit() {
    let namer = Namer::new(BuildMode::Production);

    for index in 0..500 {
      let name = namer.name("grid.mcss", &format!("column-{index}"));
      let first = name.chars().next().unwrap();

      assert!(first.is_ascii_lowercase(), "{name} starts with {first}");
      assert!(('a'..='y').contains(&first));
    }
  }

  #[test]
  fn different_pairs_produce_different_names() {
    let namer = Namer::new(BuildMode::Production);

    assert_ne!(namer.name("a.mcss", "title"), namer.name("b.mcss", "title"));
    assert_ne!(namer.name("a.mcss", "title"), namer.name("a.mcss", "logo"));
  }

  #[test]
  fn base36_encoding() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(u32::MAX as u64), "1z141z3");
  }
}
