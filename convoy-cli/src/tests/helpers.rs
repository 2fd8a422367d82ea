//! Test helpers for temporary workspaces and problem files.

use camino::{Utf8Path, Utf8PathBuf};
use convoy_core::ProblemInstance;
use tempfile::TempDir;

/// Create a temporary directory and return it with its UTF-8 path.
pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// One vehicle visiting two customers on a 3-4-5 triangle.
pub(super) fn triangle_problem() -> ProblemInstance {
    ProblemInstance {
        distance_matrix: vec![vec![0, 3, 4], vec![3, 0, 5], vec![4, 5, 0]],
        demands: vec![0, 2, 3],
        vehicle_capacities: vec![10],
        vehicle_max_distances: vec![100],
        pickups_deliveries: Vec::new(),
        num_vehicles: 1,
        depot: 0,
        starts: vec![0],
        ends: vec![0],
    }
}

pub(super) fn write_problem(path: &Utf8Path, problem: &ProblemInstance) {
    let payload = serde_json::to_string_pretty(problem).expect("serialise problem");
    write_utf8(path, payload.as_bytes());
}
