//! Discovery of the standardized Gamry folder tree:
//!
//! ```text
//! base/
//! ├── step_0,1A/
//! │   └── CHARGE_DISCHARGE/
//! │       ├── Charge_1.DTA
//! │       └── Discharge_1.DTA
//! └── step_300mA/
//!     ├── step.toml          # optional: current = 0.3
//!     └── CHARGE_DISCHARGE/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ManagerError;

/// Companion file in a step folder that states its current
pub const STEP_COMPANION: &str = "step.toml";

/// One current step of a folder tree
#[derive(Debug, Clone, PartialEq)]
pub struct StepFolder {
    /// Applied current in A
    pub current: f64,
    /// The step folder
    pub folder: PathBuf,
    /// Its reserved charge/discharge subfolder
    pub data_folder: PathBuf,
}

#[derive(Debug, Deserialize)]
struct StepCompanion {
    current: f64,
}

fn subfolders(path: &Path) -> Result<Vec<PathBuf>, ManagerError> {
    let io = |source| ManagerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut folders = Vec::new();
    for entry in fs::read_dir(path).map_err(io)? {
        let entry = entry.map_err(io)?;
        if entry.file_type().map_err(io)?.is_dir() {
            folders.push(entry.path());
        }
    }
    folders.sort();
    Ok(folders)
}

/// Current encoded in a step folder name.
///
/// The first number in the name is taken, with a comma or dot decimal, followed by
/// an optional `mA` or `A` unit: `step_0,3A` → 0.3, `300mA` → 0.3, `I=1.5` → 1.5.
pub fn parse_step_current(name: &str) -> Option<f64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let rest = &name[start..];
    let mut end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if let Some(sep) = rest[end..].chars().next().filter(|c| *c == '.' || *c == ',') {
        let frac = &rest[end + sep.len_utf8()..];
        let digits = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
        if digits > 0 {
            end += sep.len_utf8() + digits;
        }
    }
    let value: f64 = rest[..end].replace(',', ".").parse().ok()?;
    let unit = rest[end..].trim_start_matches([' ', '_', '-']);
    if unit.starts_with("mA") || unit.starts_with("ma") {
        Some(value / 1000.0)
    } else {
        Some(value)
    }
}

fn step_current(folder: &Path) -> Result<f64, ManagerError> {
    let companion = folder.join(STEP_COMPANION);
    if companion.is_file() {
        let text = fs::read_to_string(&companion).map_err(|source| ManagerError::Io {
            path: companion.clone(),
            source,
        })?;
        let parsed: StepCompanion = toml::from_str(&text).map_err(|e| ManagerError::InvalidFolderTree {
            path: companion.clone(),
            reason: format!("invalid step companion: {}", e),
        })?;
        return Ok(parsed.current);
    }
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_step_current(&name).ok_or_else(|| ManagerError::InvalidFolderTree {
        path: folder.to_path_buf(),
        reason: format!("cannot read a current from folder name '{}' and no {} found", name, STEP_COMPANION),
    })
}

/// Discover the step folders of a tree rooted at `base`, in lexicographic order
pub fn discover_gamry_tree(base: &Path, reserved: &str) -> Result<Vec<StepFolder>, ManagerError> {
    if !base.is_dir() {
        return Err(ManagerError::InvalidFolder(base.to_path_buf()));
    }
    let steps = subfolders(base)?;
    if steps.is_empty() {
        return Err(ManagerError::InvalidFolderTree {
            path: base.to_path_buf(),
            reason: "no current-step subfolders".to_string(),
        });
    }

    steps
        .into_iter()
        .map(|folder| {
            let data_folder = subfolders(&folder)?
                .into_iter()
                .find(|sub| {
                    sub.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.eq_ignore_ascii_case(reserved))
                })
                .ok_or_else(|| ManagerError::InvalidFolderTree {
                    path: folder.clone(),
                    reason: format!("missing reserved '{}' subfolder", reserved),
                })?;
            Ok(StepFolder {
                current: step_current(&folder)?,
                folder,
                data_folder,
            })
        })
        .collect()
}
