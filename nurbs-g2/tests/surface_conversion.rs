mod test_utils;

use nurbs_g2::convert::{convert_nurbs_surface, convert_surface, convert_surfaces};
use nurbs_g2::g2::{G2Writer, SurfaceWeights};
use nurbs_g2::model::{Brep, Geometry, ModelObject, Surface};
use nurbs_g2::nurbs::NurbsSurface;
use nurbs_g2::session::{ConversionOptions, ObjectOutcome, Session};
use nurbs_g2::{ConversionError, ObjectIndex};
use test_utils::{assert_content_matches, assert_points_close, square_plane};

fn bilinear() -> NurbsSurface {
    NurbsSurface::new(
        3,
        false,
        [2, 2],
        [2, 2],
        [vec![0.0, 1.0], vec![0.0, 2.0]],
        vec![
            0.0, 0.0, 0.0, // (0, 0)
            0.0, 2.0, 0.0, // (0, 1)
            1.0, 0.0, 0.0, // (1, 0)
            1.0, 2.0, 1.0, // (1, 1)
        ],
    )
    .unwrap()
}

/// Rational biquadratic-by-cubic surface with distinct values everywhere.
fn rational_net() -> NurbsSurface {
    let (n0, n1) = (3, 4);
    let mut cvs = Vec::new();
    for i in 0..n0 {
        for j in 0..n1 {
            let (x, y) = (i as f64, j as f64);
            cvs.extend([x, y, x * y + 0.25 * y, 1.0 + 0.5 * (i + j) as f64]);
        }
    }
    NurbsSurface::new(
        3,
        true,
        [3, 4],
        [n0, n1],
        [vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]],
        cvs,
    )
    .unwrap()
}

#[test]
fn bilinear_surface_has_four_swapped_records() -> anyhow::Result<()> {
    let spline = convert_nurbs_surface(&bilinear(), SurfaceWeights::Raw);
    assert_eq!(spline.record_count(), 4);
    assert_eq!(
        spline.coefs,
        vec![
            0.0, 0.0, 0.0, // (0, 0)
            1.0, 0.0, 0.0, // (1, 0)
            0.0, 2.0, 0.0, // (0, 1)
            1.0, 2.0, 1.0, // (1, 1)
        ]
    );

    let mut writer = G2Writer::new(Vec::new());
    writer.write_surface(&spline)?;
    assert_content_matches(
        &String::from_utf8(writer.into_inner())?,
        "bilinear_surface.g2",
    );
    Ok(())
}

#[test]
fn control_net_reordering_is_a_bijection() {
    let source = rational_net();
    let spline = convert_nurbs_surface(&source, SurfaceWeights::Raw);
    let [n0, n1] = source.cv_count();

    assert_eq!(spline.coefs.len(), n0 * n1 * 4);
    for i in 0..n0 {
        for j in 0..n1 {
            let record = &spline.coefs[(j * n0 + i) * 4..(j * n0 + i + 1) * 4];
            assert_eq!(&record[..3], source.cv(i, j));
            assert_eq!(record[3], source.weight(i, j));
        }
    }
}

#[test]
fn conversion_preserves_surface_shape() {
    let source = rational_net();
    for weights in [SurfaceWeights::Raw, SurfaceWeights::Premultiplied] {
        let spline = convert_nurbs_surface(&source, weights);
        for (u, v) in [(0.0, 0.0), (0.3, 0.7), (0.5, 0.5), (1.0, 0.2), (1.0, 1.0)] {
            assert_points_close(&spline.point_at(u, v).unwrap(), &source.point_at(u, v));
        }
    }
}

#[test]
fn surface_knots_are_duplicated_at_both_ends() {
    let spline = convert_nurbs_surface(&rational_net(), SurfaceWeights::Raw);
    assert_eq!(spline.bases[0].knots, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    assert_eq!(
        spline.bases[1].knots,
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
    );
    assert!(spline.bases.iter().all(|basis| basis.is_conventional()));
}

#[test]
fn oversized_knot_buffer_is_emitted_as_is() {
    // Buffer with unused trailing capacity.
    let source = NurbsSurface::new(
        3,
        false,
        [2, 2],
        [2, 2],
        [vec![0.0, 1.0, 1.0], vec![0.0, 1.0]],
        vec![0.0; 12],
    )
    .unwrap();
    assert_eq!(source.domain(0), (0.0, 1.0));
    let spline = convert_nurbs_surface(&source, SurfaceWeights::Raw);
    assert_eq!(spline.bases[0].knots, vec![0.0, 0.0, 1.0, 1.0, 1.0]);
    assert!(!spline.bases[0].is_conventional());
    assert_eq!(spline.point_at(0.5, 0.5), None);
}

#[test]
fn padded_knot_buffers_are_accepted_and_emitted() -> anyhow::Result<()> {
    let bilinear = NurbsSurface::new(
        3,
        false,
        [2, 2],
        [2, 2],
        [vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]],
        vec![
            0.0, 0.0, 0.0, // (0, 0)
            0.0, 1.0, 0.0, // (0, 1)
            1.0, 0.0, 0.0, // (1, 0)
            1.0, 1.0, 1.0, // (1, 1)
        ],
    )?;
    let mut cvs = Vec::new();
    for i in 0..4 {
        for j in 0..4 {
            cvs.extend([i as f64, j as f64, (i * j) as f64]);
        }
    }
    let cubic = NurbsSurface::new(
        3,
        false,
        [4, 4],
        [4, 4],
        [
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        ],
        cvs,
    )?;

    assert_eq!(bilinear.domain(0), (0.0, 1.0));
    assert_eq!(cubic.domain(1), (0.0, 1.0));
    assert_points_close(&bilinear.point_at(1.0, 1.0), &[1.0, 1.0, 1.0]);
    assert_points_close(&cubic.point_at(1.0, 0.0), &[3.0, 0.0, 0.0]);
    assert_points_close(&cubic.point_at(1.0, 1.0), &[3.0, 3.0, 9.0]);

    let mut writer = G2Writer::new(Vec::new());
    writer.write_surface(&convert_nurbs_surface(&bilinear, SurfaceWeights::Raw))?;
    writer.write_surface(&convert_nurbs_surface(&cubic, SurfaceWeights::Raw))?;
    let text = String::from_utf8(writer.into_inner())?;
    let lines: Vec<_> = text.lines().collect();

    // Header, dimension line, then count/order and knots per direction.
    assert_eq!(lines[2..6], ["2 2", "0 0 0 1 1 1", "2 2", "0 0 0 1 1 1"]);
    let cubic_start = 6 + 4;
    assert_eq!(lines[cubic_start], "200 1 0 0");
    assert_eq!(
        lines[cubic_start + 2..cubic_start + 6],
        [
            "4 4",
            "0 0 0 0 0 1 1 1 1 1",
            "4 4",
            "0 0 0 0 0 1 1 1 1 1"
        ]
    );
    Ok(())
}

#[test]
fn unsupported_surface_is_not_fatal() {
    let error = convert_surface(
        &Surface::Unsupported {
            kind: "revolution".to_string(),
        },
        SurfaceWeights::Raw,
    )
    .unwrap_err();
    assert!(matches!(error, ConversionError::UnconvertibleSurface(_)));
    assert!(!error.is_fatal());
}

#[test]
fn failing_face_is_skipped_and_reported() {
    let brep = Brep::from_surfaces(vec![
        square_plane(0.0),
        square_plane(1.0),
        Surface::Unsupported {
            kind: "sum surface".to_string(),
        },
    ]);
    let object = ModelObject::named("bracket", Geometry::Brep(brep));

    let results: Vec<_> = convert_surfaces(&object.geometry, SurfaceWeights::Raw).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok() && results[1].1.is_ok());
    assert_eq!(results[2].0, 2);

    let mut session = Session::open(ConversionOptions::default());
    let outcome = session.convert_object(ObjectIndex(7), &object).unwrap();
    let (surfaces, skipped) = match outcome {
        ObjectOutcome::Surfaces { surfaces, skipped } => (surfaces, skipped),
        other => panic!("expected surfaces, got {other:?}"),
    };
    assert_eq!(surfaces.len(), 2);
    assert_eq!(surfaces[1].coef(0, 0), Some(&[0.0, 0.0, 1.0][..]));
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].face, 2);
    assert_eq!(skipped[0].object.index, ObjectIndex(7));

    let report = session.close();
    assert_eq!(report.surfaces, 2);
    assert_eq!(report.skipped_faces, skipped);
}
