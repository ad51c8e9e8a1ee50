use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{debug, info};
use path_absolutize::Absolutize;
use serde::Serialize;

use crate::error::DojoError;
use crate::preset::preset_for;

/// Immutable metadata for a single challenge unit.
///
/// Resolved once per `(language, unit)` key, then cached for the process
/// lifetime. There is no write path, so entries are never invalidated.
#[derive(Debug, Clone)]
pub struct ChallengeMetadata {
  pub language: String,
  pub unit: String,
  pub title: String,
  pub readme: String,
  pub solution_path: PathBuf,
  pub test_path: PathBuf,
}

/// Wire shape of one challenge, starter code inlined.
#[derive(Debug, Serialize)]
pub struct ChallengeDetail {
  pub language: String,
  pub unit: String,
  pub title: String,
  pub instructions: String,
  pub starter_code: String,
  pub test_filename: String,
}

#[derive(Debug, Serialize)]
pub struct UnitSummary {
  pub unit: String,
  pub title: String,
}

#[derive(Debug, Serialize)]
pub struct LanguageChallenges {
  pub language: String,
  pub units: Vec<UnitSummary>,
}

/// Discovers challenges on disk and caches their metadata.
pub struct ChallengeLoader {
  root: PathBuf,
  cache: RwLock<HashMap<(String, String), Arc<ChallengeMetadata>>>,
}

impl ChallengeMetadata {
  /// Read the starter code and assemble the serializable detail view.
  pub fn detail(&self) -> Result<ChallengeDetail, DojoError> {
    let starter_code = fs::read_to_string(&self.solution_path)
      .map_err(|err| DojoError::workspace(format!("Read starter code fails: {}", err)))?;
    Ok(ChallengeDetail {
      language: self.language.clone(),
      unit: self.unit.clone(),
      title: self.title.clone(),
      instructions: self.readme.clone(),
      starter_code,
      test_filename: file_name(&self.test_path),
    })
  }

  /// Directory holding every asset of this unit.
  pub fn unit_dir(&self) -> &Path {
    self
      .solution_path
      .parent()
      .expect("solution path always has a parent directory")
  }
}

impl ChallengeLoader {
  pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, DojoError> {
    let root = root
      .as_ref()
      .absolutize()
      .map_err(|err| DojoError::workspace(format!("Resolve challenges root fails: {}", err)))?
      .to_path_buf();
    if !root.is_dir() {
      return Err(DojoError::not_found(format!(
        "Challenges directory {} does not exist",
        root.display()
      )));
    }
    info!("Loading challenges from {}", root.display());
    Ok(ChallengeLoader {
      root,
      cache: RwLock::new(HashMap::new()),
    })
  }

  /// Return the metadata for a specific challenge, reading the disk at most
  /// once per key. Racing populations recompute idempotently.
  pub fn get(&self, language: &str, unit: &str) -> Result<Arc<ChallengeMetadata>, DojoError> {
    let key = (language.to_string(), unit.to_string());
    if let Some(metadata) = self.cache.read().unwrap().get(&key) {
      return Ok(metadata.clone());
    }

    debug!("Challenge cache miss for {}/{}", language, unit);
    let metadata = Arc::new(self.load(language, unit)?);
    let mut cache = self.cache.write().unwrap();
    Ok(cache.entry(key).or_insert(metadata).clone())
  }

  /// Summaries of every available challenge, grouped by language.
  pub fn list(&self) -> Result<Vec<LanguageChallenges>, DojoError> {
    let mut languages = vec![];
    for language_dir in sorted_subdirs(&self.root)? {
      let mut units = vec![];
      for unit_dir in sorted_subdirs(&language_dir)? {
        units.push(UnitSummary {
          unit: file_name(&unit_dir),
          title: read_title(&unit_dir),
        });
      }
      languages.push(LanguageChallenges {
        language: file_name(&language_dir),
        units,
      });
    }
    Ok(languages)
  }

  fn load(&self, language: &str, unit: &str) -> Result<ChallengeMetadata, DojoError> {
    let preset = preset_for(language)
      .ok_or_else(|| DojoError::UnsupportedLanguage(language.to_string()))?;

    let language_dir = self.root.join(preset.language);
    if !language_dir.is_dir() {
      return Err(DojoError::not_found(format!(
        "Language '{}' not found",
        language
      )));
    }

    let unit_dir = language_dir.join(unit);
    if !unit_dir.is_dir() {
      return Err(DojoError::not_found(format!(
        "Unit '{}' not found for language '{}'",
        unit, language
      )));
    }

    let solution_path = unit_dir.join(preset.solution_filename);
    if !solution_path.exists() {
      return Err(DojoError::not_found(format!(
        "Expected solution file missing: {}",
        solution_path.display()
      )));
    }

    let test_path = unit_dir.join(preset.test_filename);
    if !test_path.exists() {
      return Err(DojoError::not_found(format!(
        "Expected test file missing: {}",
        test_path.display()
      )));
    }

    let readme = fs::read_to_string(unit_dir.join("README.md")).unwrap_or_default();
    let title = extract_title(&readme, unit);

    Ok(ChallengeMetadata {
      language: preset.language.to_string(),
      unit: unit.to_string(),
      title,
      readme,
      solution_path,
      test_path,
    })
  }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, DojoError> {
  let mut dirs = vec![];
  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_dir() && !file_name(&path).starts_with('.') {
      dirs.push(path);
    }
  }
  dirs.sort();
  Ok(dirs)
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().to_string())
    .unwrap_or_default()
}

fn read_title(unit_dir: &Path) -> String {
  let readme = fs::read_to_string(unit_dir.join("README.md")).unwrap_or_default();
  extract_title(&readme, &file_name(unit_dir))
}

/// First non-empty README line with markdown heading markers stripped,
/// falling back to the unit directory name.
fn extract_title(readme: &str, fallback: &str) -> String {
  readme
    .lines()
    .map(|line| line.trim_matches(|c| c == '#' || c == ' ').trim())
    .find(|line| !line.is_empty())
    .map(|line| line.to_string())
    .unwrap_or_else(|| fallback.to_string())
}
