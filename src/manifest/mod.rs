//! Class list and dataset descriptor for the detector trainer.
//!
//! `classes.txt` holds one class name per line; the descriptor is a YAML file
//! in the layout Ultralytics-style trainers read:
//!
//! ```yaml
//! train: data_thermal/images/train
//! val: data_thermal/images/val
//! test: data_thermal/images/test
//! nc: 1
//! names:
//! - object
//! ```

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::PrepError;
use crate::split::Split;

/// The one class every box belongs to.
pub const CLASS_NAME: &str = "object";
pub const CLASSES_FILE_NAME: &str = "classes.txt";

/// Contents of the dataset descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetManifest {
    pub train: String,
    pub val: String,
    pub test: String,
    pub nc: usize,
    pub names: Vec<String>,
}

impl DatasetManifest {
    /// Descriptor pointing at `<output_root>/images/<split>`.
    pub fn for_output(output_root: &Path) -> Self {
        let image_dir = |split: Split| {
            output_root
                .join("images")
                .join(split.dir_name())
                .to_string_lossy()
                .replace('\\', "/")
        };
        let names = vec![CLASS_NAME.to_string()];

        Self {
            train: image_dir(Split::Train),
            val: image_dir(Split::Val),
            test: image_dir(Split::Test),
            nc: names.len(),
            names,
        }
    }
}

/// Writes `classes.txt` into `output_root` and the descriptor to
/// `manifest_path`, overwriting both.
pub fn write_manifest(
    output_root: &Path,
    manifest_path: &Path,
) -> Result<DatasetManifest, PrepError> {
    let manifest = DatasetManifest::for_output(output_root);

    fs::create_dir_all(output_root).map_err(PrepError::Io)?;

    let mut classes = String::new();
    for name in &manifest.names {
        classes.push_str(name);
        classes.push('\n');
    }
    fs::write(output_root.join(CLASSES_FILE_NAME), classes).map_err(PrepError::Io)?;

    let yaml = serde_yaml::to_string(&manifest).map_err(|source| PrepError::ManifestWrite {
        path: manifest_path.to_path_buf(),
        source,
    })?;
    fs::write(manifest_path, yaml).map_err(PrepError::Io)?;

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Descriptor {
        train: String,
        val: String,
        test: String,
        nc: usize,
        names: Vec<String>,
    }

    #[test]
    fn writes_classes_and_descriptor() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path().join("data_thermal");
        let yaml_path = root.join("data_thermal.yaml");

        let manifest = write_manifest(&root, &yaml_path).expect("write manifest");
        assert_eq!(manifest.nc, 1);

        assert_eq!(
            fs::read_to_string(root.join("classes.txt")).expect("read classes"),
            "object\n"
        );

        let parsed: Descriptor =
            serde_yaml::from_str(&fs::read_to_string(&yaml_path).expect("read yaml"))
                .expect("parse yaml");
        assert!(parsed.train.ends_with("data_thermal/images/train"));
        assert!(parsed.val.ends_with("data_thermal/images/val"));
        assert!(parsed.test.ends_with("data_thermal/images/test"));
        assert_eq!(parsed.nc, 1);
        assert_eq!(parsed.names, vec!["object"]);
    }

    #[test]
    fn rewriting_is_idempotent() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let yaml_path = temp.path().join("data.yaml");

        write_manifest(temp.path(), &yaml_path).expect("first write");
        let first = fs::read(&yaml_path).expect("read");
        write_manifest(temp.path(), &yaml_path).expect("second write");
        let second = fs::read(&yaml_path).expect("read");

        assert_eq!(first, second);
    }
}
