#![allow(dead_code)]
use nurbs_g2::model::{Curve, Geometry, ModelObject, PlaneSurface, Surface};
use nurbs_g2::nurbs::NurbsCurve;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Check if tests should update expected results
pub fn should_update_expected() -> bool {
    if env::var("UPDATE_EXPECTED").is_ok() {
        return true;
    }

    let args: Vec<String> = env::args().collect();
    args.iter().any(|arg| arg == "--update" || arg == "-u")
}

/// Get the path to the expected results directory
pub fn expected_results_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("expected_results")
}

/// Get a fresh, empty output directory for one test (in target)
pub fn test_output_dir(test_name: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("test_output")
        .join(test_name);

    let _ = fs::remove_dir_all(&path);
    fs::create_dir_all(&path).expect("Failed to create test output directory");
    path
}

/// Compare or update test result with in-memory content
pub fn assert_content_matches(actual_content: &str, expected_filename: &str) {
    let expected_path = expected_results_dir().join(expected_filename);

    if should_update_expected() {
        fs::write(&expected_path, actual_content)
            .unwrap_or_else(|_| panic!("Failed to update expected file: {expected_filename}"));
        println!("Updated expected file: {expected_filename}");
    } else {
        assert!(
            expected_path.exists(),
            "Expected file does not exist: {}. Run with UPDATE_EXPECTED=1 or --update to create it.",
            expected_path.display()
        );

        let expected_content = fs::read_to_string(&expected_path)
            .unwrap_or_else(|_| panic!("Failed to read expected file: {}", expected_path.display()));

        assert_eq!(
            actual_content,
            expected_content,
            "Content mismatch for {expected_filename}. Run with UPDATE_EXPECTED=1 or --update to update expected results."
        );
    }
}

/// Assert two points agree to `1e-12` per coordinate.
pub fn assert_points_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} != {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
    }
}

/// A clamped, non-rational cubic with 5 control vertices.
pub fn open_cubic() -> NurbsCurve {
    NurbsCurve::from_points(
        4,
        vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0],
        &[
            [0.0, 0.0, 0.0],
            [1.0, 2.0, 0.0],
            [2.0, -1.0, 0.5],
            [3.0, 1.0, 0.0],
            [4.0, 0.0, 1.0],
        ],
        None,
    )
    .expect("valid cubic")
}

/// A unit square in the plane `z = height`.
pub fn square_plane(height: f64) -> Surface {
    Surface::Plane(PlaneSurface {
        origin: [0.0, 0.0, height],
        x_axis: [1.0, 0.0, 0.0],
        y_axis: [0.0, 1.0, 0.0],
        u: [0.0, 1.0],
        v: [0.0, 1.0],
    })
}

pub fn curve_object(name: &str, curve: Curve) -> ModelObject {
    ModelObject::named(name, Geometry::Curve(curve))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_exist() {
        assert!(expected_results_dir().exists());
        assert!(test_output_dir("test_utils").exists());
    }
}
