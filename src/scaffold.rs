//! Installing the override template into a consuming project's docs tree.
//!
//! `install` writes the pristine `service-constants.js` at the designated
//! relative path for the project to edit; `revert` removes it again, but
//! only while it is still pristine.

use std::fs;
use std::io;
use std::path::Path;

use crate::assets::DEFAULT_CONSTANTS_JS;
use crate::constants::ServiceConstants;

#[derive(Debug, Default)]
pub struct Summary {
    pub modified: usize,
    pub skipped: usize,
}

pub fn install(docs_root: &Path) -> io::Result<Summary> {
    let mut summary = Summary::default();
    let path = ServiceConstants::override_path(docs_root);

    if path.exists() {
        eprintln!(
            "Override already present at {} (left untouched).",
            path.display()
        );
        summary.skipped += 1;
        return Ok(summary);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, DEFAULT_CONSTANTS_JS)?;
    summary.modified += 1;

    Ok(summary)
}

pub fn revert(docs_root: &Path) -> io::Result<Summary> {
    let mut summary = Summary::default();
    let path = ServiceConstants::override_path(docs_root);

    match fs::read_to_string(&path) {
        Ok(content) if content == DEFAULT_CONSTANTS_JS => {
            fs::remove_file(&path)?;
            summary.modified += 1;
        }
        Ok(_) => {
            eprintln!(
                "Override at {} has local edits (left untouched).",
                path.display()
            );
            summary.skipped += 1;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            summary.skipped += 1;
        }
        Err(err) => return Err(err),
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_writes_pristine_template() {
        let dir = tempfile::tempdir().expect("tempdir");

        let summary = install(dir.path()).expect("install");
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.skipped, 0);

        let written =
            fs::read_to_string(ServiceConstants::override_path(dir.path())).expect("read");
        assert_eq!(written, DEFAULT_CONSTANTS_JS);
    }

    #[test]
    fn install_refuses_to_clobber_an_edited_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = ServiceConstants::override_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "var serviceTitle = \"Tone Analyzer\";\n").unwrap();

        let summary = install(dir.path()).expect("install");
        assert_eq!(summary.modified, 0);
        assert_eq!(summary.skipped, 1);

        let kept = fs::read_to_string(&path).expect("read");
        assert_eq!(kept, "var serviceTitle = \"Tone Analyzer\";\n");
    }

    #[test]
    fn revert_removes_only_the_pristine_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        install(dir.path()).expect("install");

        let summary = revert(dir.path()).expect("revert");
        assert_eq!(summary.modified, 1);
        assert!(!ServiceConstants::override_path(dir.path()).exists());
    }

    #[test]
    fn revert_leaves_an_edited_override_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = ServiceConstants::override_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "var swaggerUrl = \"/v3/api-docs\";\n").unwrap();

        let summary = revert(dir.path()).expect("revert");
        assert_eq!(summary.modified, 0);
        assert_eq!(summary.skipped, 1);
        assert!(path.exists());
    }

    #[test]
    fn revert_without_an_override_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = revert(dir.path()).expect("revert");
        assert_eq!(summary.modified, 0);
        assert_eq!(summary.skipped, 1);
    }
}
