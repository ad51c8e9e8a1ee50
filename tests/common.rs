use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Once;

use flexi_logger::Logger;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn setup() {
  INIT.call_once(|| {
    Logger::try_with_str("dojo=debug,info")
      .unwrap()
      .start()
      .unwrap();
  });
}

/// True when `python3 -m pytest` is usable on this machine.
pub fn python_available() -> bool {
  Command::new("python3")
    .args(["-m", "pytest", "--version"])
    .output()
    .map(|output| output.status.success())
    .unwrap_or(false)
}

/// True when a `node` interpreter is usable on this machine.
pub fn node_available() -> bool {
  Command::new("node")
    .arg("--version")
    .output()
    .map(|output| output.status.success())
    .unwrap_or(false)
}

/// Build a small challenge tree with one python unit and one javascript
/// unit, mirroring the on-disk layout the loader expects.
pub fn challenges_root() -> TempDir {
  let root = tempfile::tempdir().unwrap();

  let python_unit = root.path().join("python/unit-001");
  fs::create_dir_all(&python_unit).unwrap();
  write(
    &python_unit.join("README.md"),
    "# Count Vowels\n\nCount the vowels in a string.\n",
  );
  write(
    &python_unit.join("solution.py"),
    "def count_vowels(text):\n    pass\n",
  );
  write(
    &python_unit.join("test.py"),
    concat!(
      "from app import count_vowels\n",
      "\n",
      "\n",
      "def test_counts_vowels_in_hello_world():\n",
      "    assert count_vowels(\"hello world\") == 3\n",
      "\n",
      "\n",
      "def test_empty_string_has_no_vowels():\n",
      "    assert count_vowels(\"\") == 0\n",
    ),
  );

  let javascript_unit = root.path().join("javascript/unit-001");
  fs::create_dir_all(&javascript_unit).unwrap();
  write(
    &javascript_unit.join("README.md"),
    "# Count Vowels\n\nCount the vowels in a string.\n",
  );
  write(
    &javascript_unit.join("solution.js"),
    "const countVowels = (text) => {\n  // your code here\n};\n\nmodule.exports = { countVowels };\n",
  );
  write(
    &javascript_unit.join("test.js"),
    concat!(
      "const { countVowels } = require('./app');\n",
      "\n",
      "describe('countVowels', () => {\n",
      "  test('counts vowels in hello world', () => {\n",
      "    expect(countVowels('hello world')).toBe(3);\n",
      "  });\n",
      "\n",
      "  test('empty string has no vowels', () => {\n",
      "    expect(countVowels('')).toBe(0);\n",
      "  });\n",
      "});\n",
    ),
  );

  root
}

fn write(path: &Path, content: &str) {
  fs::write(path, content).unwrap();
}
