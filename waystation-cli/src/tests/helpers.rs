//! Test helpers for seeding temporary databases.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

use crate::import::{ImportArgs, run_import_with};

/// Three restrooms north of City Hall; the first two are reviewed.
pub(super) const SEED: &str = r#"{
    "restrooms": [
        {"id": 1, "location": {"latitude": 40.7128, "longitude": -74.006},
         "details": {"name": "City Hall Park"}},
        {"id": 2, "location": {"latitude": 40.715, "longitude": -74.006},
         "attributes": {"wheelchair": "full"}},
        {"id": 3, "location": {"latitude": 40.73, "longitude": -74.006},
         "attributes": {"requires_fee": true}}
    ],
    "reviews": [
        {"id": 10, "restroom_id": 1, "author_id": 7,
         "cleanliness": 5, "lighting": 5, "safety": 5, "privacy": 5,
         "accessibility": 5, "overall": 5},
        {"id": 11, "restroom_id": 2, "author_id": 8,
         "cleanliness": 2, "lighting": 2, "safety": 2, "privacy": 2,
         "accessibility": 2, "overall": 2}
    ]
}"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}

/// A temporary directory holding a seed file and a database path.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
    pub(super) seed: Utf8PathBuf,
    pub(super) database: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let seed = root.join("seed.json");
        let database = root.join("data").join("restrooms.db");
        write_utf8(&seed, SEED.as_bytes());
        Self {
            _dir: dir,
            root,
            seed,
            database,
        }
    }

    /// Import [`SEED`] into the workspace database.
    pub(super) fn seeded() -> Self {
        let workspace = Self::new();
        let args = ImportArgs {
            seed: Some(workspace.seed.clone()),
            database: Some(workspace.database.clone()),
        };
        run_import_with(args, &mut Vec::<u8>::new()).expect("seed import");
        workspace
    }
}

pub(super) fn output_json(buffer: &[u8]) -> serde_json::Value {
    serde_json::from_slice(buffer).expect("output should be JSON")
}

pub(super) fn ids_of(output: &serde_json::Value) -> Vec<u64> {
    output
        .as_array()
        .expect("array output")
        .iter()
        .map(|hit| hit["restroom"]["id"].as_u64().expect("numeric id"))
        .collect()
}
