//! G2 text serialization.
//!
//! Every object starts with a header line `<class> <major> <minor> 0`
//! followed by the class specific body. Values on a line are separated by a
//! single space. Floats use the shortest representation that reads back to
//! the same value.
use super::spline::{G2Object, SplineBasis, SplineCurve, SplineSurface};
use crate::{Error, Result};
use itertools::Itertools;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Class identifiers of the G2 object header.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum ClassType {
    SplineCurve = 100,
    SplineSurface = 200,
}

/// The header line preceding every G2 object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHeader {
    pub class: ClassType,
    pub major: u32,
    pub minor: u32,
}

impl ObjectHeader {
    /// Header of the current format version, 1.0.
    pub fn new(class: ClassType) -> Self {
        Self {
            class,
            major: 1,
            minor: 0,
        }
    }
}

impl fmt::Display for ObjectHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} 0",
            u32::from(self.class),
            self.major,
            self.minor
        )
    }
}

impl FromStr for ObjectHeader {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let invalid = || Error::InvalidHeader(line.to_string());
        let fields = line
            .split_whitespace()
            .map(|field| field.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        match fields[..] {
            [class, major, minor, _] => Ok(Self {
                class: ClassType::try_from(class).map_err(|_| invalid())?,
                major,
                minor,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Writes G2 objects to any [`Write`] implementor.
///
/// # Examples
///
/// ```
/// use nurbs_g2::g2::{G2Writer, SplineBasis, SplineCurve};
///
/// let line = SplineCurve {
///     dimension: 3,
///     rational: false,
///     basis: SplineBasis {
///         count: 2,
///         order: 2,
///         knots: vec![0.0, 0.0, 1.0, 1.0],
///     },
///     coefs: vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.5],
/// };
///
/// let mut writer = G2Writer::new(Vec::new());
/// writer.write_curve(&line)?;
/// assert_eq!(
///     String::from_utf8(writer.into_inner()).unwrap(),
///     "100 1 0 0\n3 0\n2 2\n0 0 1 1\n0 0 0\n1 2 3.5\n"
/// );
/// # Ok::<(), nurbs_g2::Error>(())
/// ```
pub struct G2Writer<W: Write> {
    writer: W,
}

impl<W: Write> G2Writer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_object(&mut self, object: &G2Object) -> Result<()> {
        match object {
            G2Object::Curve(curve) => self.write_curve(curve),
            G2Object::Surface(surface) => self.write_surface(surface),
        }
    }

    pub fn write_curve(&mut self, curve: &SplineCurve) -> Result<()> {
        let size = curve.coef_size();
        self.check_coefs(curve.coefs.len(), curve.basis.count, size)?;

        writeln!(self.writer, "{}", ObjectHeader::new(ClassType::SplineCurve))?;
        writeln!(self.writer, "{} {}", curve.dimension, curve.rational as u8)?;
        self.write_basis(&curve.basis)?;
        for coef in curve.coefs.chunks_exact(size) {
            self.write_values(coef)?;
        }
        Ok(())
    }

    pub fn write_surface(&mut self, surface: &SplineSurface) -> Result<()> {
        let size = surface.coef_size();
        self.check_coefs(surface.coefs.len(), surface.record_count(), size)?;

        writeln!(self.writer, "{}", ObjectHeader::new(ClassType::SplineSurface))?;
        writeln!(self.writer, "{} {}", surface.dimension, surface.rational as u8)?;
        for basis in &surface.bases {
            self.write_basis(basis)?;
        }
        for record in surface.coefs.chunks_exact(size) {
            self.write_values(record)?;
        }
        Ok(())
    }

    fn check_coefs(&self, len: usize, count: usize, size: usize) -> Result<()> {
        if size == 0 || len != count * size {
            return Err(Error::InvalidGeometry(format!(
                "Expected {count} coefficients of {size} values, got {len} values."
            )));
        }
        Ok(())
    }

    fn write_basis(&mut self, basis: &SplineBasis) -> Result<()> {
        writeln!(self.writer, "{} {}", basis.count, basis.order)?;
        self.write_values(&basis.knots)
    }

    fn write_values(&mut self, values: &[f64]) -> Result<()> {
        writeln!(self.writer, "{}", values.iter().join(" "))?;
        Ok(())
    }
}
