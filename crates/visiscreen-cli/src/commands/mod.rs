pub mod evaluate;
pub mod exam;
pub mod init;
pub mod records;
pub mod standards;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use visiscreen_core::parser;
use visiscreen_core::record::Intake;

/// Load one intake file, or every intake under a directory.
pub fn load_intakes(path: &Path) -> Result<Vec<(PathBuf, Intake)>> {
    if path.is_dir() {
        parser::load_intake_directory(path)
    } else {
        Ok(vec![(path.to_path_buf(), parser::parse_intake(path)?)])
    }
}
