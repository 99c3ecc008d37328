mod test_utils;

use nurbs_g2::export::{export_model, NamedFiles, SingleStream};
use nurbs_g2::model::{Curve, Geometry, Model, ModelObject, OtherKind};
use nurbs_g2::session::{ConversionOptions, Session};
use nurbs_g2::{ConversionError, Error, ObjectIndex};
use std::fs;
use test_utils::{assert_content_matches, curve_object, open_cubic, square_plane, test_output_dir};

fn line(to: [f64; 3]) -> Curve {
    Curve::Line { from: [0.0; 3], to }
}

fn mixed_model() -> Model {
    let mut model = Model::new();
    model.push(curve_object("axis", line([1.0, 2.0, 3.0])));
    model.push(ModelObject::new(Geometry::Other(OtherKind::Mesh)));
    model.push(ModelObject::new(Geometry::Surface(square_plane(0.0))));
    model.push(ModelObject::new(Geometry::Other(OtherKind::TextDot)));
    model
}

#[test]
fn mixed_model_to_single_stream() -> anyhow::Result<()> {
    let mut session = Session::open(ConversionOptions::default());
    let mut output = SingleStream::new(Vec::new());
    export_model(&mut session, &mixed_model(), &mut output)?;
    let report = session.close();

    assert_eq!(report.curves, 1);
    assert_eq!(report.surfaces, 1);
    assert_eq!(report.passed_over, 2);
    assert!(report.skipped_faces.is_empty());
    assert_content_matches(&String::from_utf8(output.into_inner())?, "mixed_model.g2");
    Ok(())
}

#[test]
fn unconvertible_curve_stops_the_batch() {
    let mut model = Model::new();
    model.push(curve_object("axis", line([1.0, 2.0, 3.0])));
    let failing = model.push(curve_object(
        "helix",
        Curve::Unsupported {
            kind: "helix".to_string(),
        },
    ));
    model.push(curve_object("after", line([0.0, 0.0, 1.0])));

    let mut session = Session::open(ConversionOptions::default());
    let mut output = SingleStream::new(Vec::new());
    let error = export_model(&mut session, &model, &mut output).unwrap_err();

    assert_eq!(failing, ObjectIndex(1));
    match &error {
        Error::Conversion { object, source } => {
            assert_eq!(object.index, failing);
            assert_eq!(object.name.as_deref(), Some("helix"));
            assert!(matches!(source, ConversionError::UnconvertibleCurve(_)));
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(
        error.to_string(),
        "Object #1 (\"helix\"): Curve cannot be expressed as NURBS: helix has no NURBS form"
    );

    // Only the object before the failing one was written.
    let written = String::from_utf8(output.into_inner()).unwrap();
    assert_eq!(written.matches("100 1 0 0").count(), 1);
    assert_eq!(session.close().curves, 1);
}

#[test]
fn convert_model_keeps_object_order() -> anyhow::Result<()> {
    let mut model = mixed_model();
    model.push(curve_object("spline", Curve::Nurbs(open_cubic())));

    let mut session = Session::open(ConversionOptions::default());
    let converted = session.convert_model(&model)?;

    let indices: Vec<_> = converted.iter().map(|c| c.object.index).collect();
    assert_eq!(indices, [ObjectIndex(0), ObjectIndex(2), ObjectIndex(4)]);
    assert!(converted.iter().all(|c| c.descriptors.len() == 1));
    Ok(())
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_conversion_matches_sequential() -> anyhow::Result<()> {
    let model: Model = (0..64)
        .map(|i| match i % 3 {
            0 => curve_object(&format!("line {i}"), line([i as f64, 1.0, 0.0])),
            1 => ModelObject::new(Geometry::Surface(square_plane(i as f64))),
            _ => ModelObject::new(Geometry::Other(OtherKind::Point)),
        })
        .collect();

    let mut sequential = Session::open(ConversionOptions::default());
    let expected = sequential.convert_model(&model)?;
    let mut parallel = Session::open(ConversionOptions::default());
    let actual = parallel.convert_model_par(&model)?;

    assert_eq!(actual, expected);
    assert_eq!(parallel.close(), sequential.close());
    Ok(())
}

#[test]
fn named_objects_go_to_their_own_files() -> anyhow::Result<()> {
    let dir = test_output_dir("named_objects_go_to_their_own_files");
    let mut model = Model::new();
    model.push(curve_object("rail", line([1.0, 0.0, 0.0])));
    model.push(ModelObject::new(Geometry::Surface(square_plane(0.0))));
    model.push(curve_object("rail", line([0.0, 1.0, 0.0])));
    model.push(curve_object("a/b", line([0.0, 0.0, 1.0])));

    let fallback = fs::File::create(dir.join("unnamed.g2"))?;
    let mut router = NamedFiles::new(&dir, fallback);
    let mut session = Session::open(ConversionOptions::default());
    export_model(&mut session, &model, &mut router)?;
    drop(router);

    let rail = fs::read_to_string(dir.join("rail.g2"))?;
    assert_eq!(rail.matches("100 1 0 0").count(), 2);
    assert!(rail.ends_with("0 0 0\n0 1 0\n"));

    let unnamed = fs::read_to_string(dir.join("unnamed.g2"))?;
    assert!(unnamed.starts_with("200 1 0 0\n"));

    assert!(dir.join("a_b.g2").exists());
    Ok(())
}
