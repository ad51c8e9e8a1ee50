use std::fs;
use std::path::Path;

use log::debug;
use tempfile::TempDir;

use crate::challenge::ChallengeMetadata;
use crate::error::DojoError;
use crate::preset::LanguagePreset;

/// An exclusively-owned scratch directory holding one execution's staged
/// files.
///
/// The directory is removed when the handle goes out of scope, on success,
/// failure or timeout alike; call sites never clean up manually.
pub struct Workspace {
  dir: TempDir,
}

impl Workspace {
  /// Materialize the challenge assets and the submitted code in a fresh
  /// uniquely-named directory.
  ///
  /// Every file and subdirectory of the unit is copied, then the submission
  /// is written under the starter filename and under every entry filename
  /// the language's test harness may import it as. Bundled support files
  /// (the javascript harness) are staged last.
  pub fn stage(
    metadata: &ChallengeMetadata,
    preset: &LanguagePreset,
    code: &str,
  ) -> Result<Workspace, DojoError> {
    let dir = tempfile::Builder::new()
      .prefix(&format!("dojo-{}-", preset.language))
      .tempdir()
      .map_err(|err| DojoError::workspace(format!("Create workspace fails: {}", err)))?;

    copy_dir_all(metadata.unit_dir(), dir.path())?;

    fs::write(dir.path().join(preset.solution_filename), code)
      .map_err(|err| DojoError::workspace(format!("Write submission fails: {}", err)))?;
    for entry in preset.entry_filenames {
      fs::write(dir.path().join(entry), code)
        .map_err(|err| DojoError::workspace(format!("Write submission fails: {}", err)))?;
    }
    for (name, content) in preset.support_files {
      fs::write(dir.path().join(name), content)
        .map_err(|err| DojoError::workspace(format!("Write support file fails: {}", err)))?;
    }

    debug!("Staged workspace {}", dir.path().display());
    Ok(Workspace { dir })
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  /// Remove the workspace now, reporting removal failures instead of
  /// swallowing them in drop.
  pub fn close(self) -> Result<(), DojoError> {
    let path = self.dir.path().display().to_string();
    self
      .dir
      .close()
      .map_err(|err| DojoError::workspace(format!("Remove workspace {} fails: {}", path, err)))
  }
}

fn copy_dir_all(source: &Path, destination: &Path) -> Result<(), DojoError> {
  for entry in fs::read_dir(source)? {
    let entry = entry?;
    let target = destination.join(entry.file_name());
    if entry.file_type()?.is_dir() {
      fs::create_dir(&target)?;
      copy_dir_all(&entry.path(), &target)?;
    } else {
      fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}
