use std::collections::HashMap;

use lazy_static::lazy_static;

/// Jest-flavoured runner staged into javascript workspaces so challenge
/// suites can execute without a Jest install.
const JAVASCRIPT_HARNESS: &str = include_str!("preset/harness.js");

const JAVASCRIPT_HARNESS_FILENAME: &str = "harness.js";

/// Filename conventions and the fixed test command for one language.
///
/// The set of presets is closed at compile time: there is no runtime plugin
/// mechanism, and languages without a preset are rejected before any
/// workspace is created.
pub struct LanguagePreset {
  /// Canonical language name, also the challenge directory name
  pub language: &'static str,
  /// Starter file stored in each unit directory
  pub solution_filename: &'static str,
  /// Hidden test file stored in each unit directory
  pub test_filename: &'static str,
  /// Every filename the test harness may import the submission under.
  /// The staging step writes the submitted code once per entry, so the
  /// hidden suite resolves the submission regardless of the starter name.
  pub entry_filenames: &'static [&'static str],
  /// Bundled (filename, content) pairs staged next to the submission
  pub support_files: &'static [(&'static str, &'static str)],
}

impl LanguagePreset {
  /// Argument vector of the test command, run with cwd = workspace.
  pub fn test_command(&self, test_filename: &str) -> Vec<String> {
    match self.language {
      "python" => vec![
        "python3".to_string(),
        "-m".to_string(),
        "pytest".to_string(),
        "-q".to_string(),
        test_filename.to_string(),
      ],
      "javascript" => vec![
        "node".to_string(),
        JAVASCRIPT_HARNESS_FILENAME.to_string(),
        test_filename.to_string(),
      ],
      _ => unreachable!("preset registered without a test command"),
    }
  }
}

lazy_static! {
  static ref PRESETS: HashMap<&'static str, LanguagePreset> = {
    let mut map = HashMap::new();
    map.insert(
      "python",
      LanguagePreset {
        language: "python",
        solution_filename: "solution.py",
        test_filename: "test.py",
        entry_filenames: &["app.py"],
        support_files: &[],
      },
    );
    map.insert(
      "javascript",
      LanguagePreset {
        language: "javascript",
        solution_filename: "solution.js",
        test_filename: "test.js",
        entry_filenames: &["app.js"],
        support_files: &[(JAVASCRIPT_HARNESS_FILENAME, JAVASCRIPT_HARNESS)],
      },
    );
    map
  };

  static ref LANGUAGE_ALIAS_MAP: HashMap<&'static str, &'static str> = {
    let mut map = HashMap::new();
    map.insert("py", "python");
    map.insert("py3", "python");
    map.insert("python", "python");
    map.insert("python3", "python");
    map.insert("js", "javascript");
    map.insert("node", "javascript");
    map.insert("javascript", "javascript");
    map
  };
}

/// Resolve a user-supplied language name to its preset.
///
/// Unregistered languages fail closed with `None`: there is no guessed
/// filename convention for languages the sandbox cannot actually run.
pub fn preset_for(language: &str) -> Option<&'static LanguagePreset> {
  let canonical = LANGUAGE_ALIAS_MAP.get(language)?;
  PRESETS.get(canonical)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_aliases_to_canonical_presets() {
    for alias in ["py", "python3", "python"] {
      assert_eq!(preset_for(alias).unwrap().language, "python");
    }
    for alias in ["js", "node", "javascript"] {
      assert_eq!(preset_for(alias).unwrap().language, "javascript");
    }
  }

  #[test]
  fn unknown_language_fails_closed() {
    assert!(preset_for("go-lang").is_none());
    assert!(preset_for("").is_none());
  }

  #[test]
  fn python_test_command_is_quiet_pytest() {
    let preset = preset_for("python").unwrap();
    let command = preset.test_command("test.py");
    assert_eq!(command, vec!["python3", "-m", "pytest", "-q", "test.py"]);
  }

  #[test]
  fn javascript_stages_the_bundled_harness() {
    let preset = preset_for("javascript").unwrap();
    assert_eq!(preset.support_files.len(), 1);
    let (name, content) = preset.support_files[0];
    assert_eq!(name, "harness.js");
    assert!(content.contains("global.describe"));
    let command = preset.test_command("test.js");
    assert_eq!(command, vec!["node", "harness.js", "test.js"]);
  }
}
