//! Affine transforms for placing components and build items
//!
//! 3MF stores placements as a 4x3 matrix written row-major as 12 numbers:
//!
//! ```text
//! m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32
//! ```
//!
//! The first nine values form the 3x3 linear part and the last three the
//! translation. The implicit fourth column is `[0, 0, 0, 1]`. Points are
//! treated as row vectors, so a point maps as
//!
//! ```text
//! x' = m00*x + m10*y + m20*z + m30
//! y' = m01*x + m11*y + m21*z + m31
//! z' = m02*x + m12*y + m22*z + m32
//! ```

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::{Error, Result};
use crate::model::Vertex;

/// Number of values in a serialized transform
pub const TRANSFORM_MATRIX_SIZE: usize = 12;

/// An immutable 4x3 affine transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    linear: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl AffineTransform {
    /// The neutral transform
    pub fn identity() -> Self {
        Self {
            linear: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Build a transform from its 12 row-major values
    pub fn from_values(values: [f64; TRANSFORM_MATRIX_SIZE]) -> Self {
        let [m00, m01, m02, m10, m11, m12, m20, m21, m22, m30, m31, m32] = values;
        Self {
            linear: Matrix3::new(m00, m01, m02, m10, m11, m12, m20, m21, m22),
            translation: Vector3::new(m30, m31, m32),
        }
    }

    /// A pure translation
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            linear: Matrix3::identity(),
            translation: Vector3::new(x, y, z),
        }
    }

    /// Parse the 12-number transform grammar
    ///
    /// An empty string yields the identity. Anything other than exactly 12
    /// finite numbers separated by whitespace fails with
    /// [`Error::MalformedTransform`].
    ///
    /// # Example
    ///
    /// ```
    /// use lib3mf_resolve::AffineTransform;
    ///
    /// let t = AffineTransform::parse("1 0 0 0 1 0 0 0 1 10 20 30").unwrap();
    /// assert_eq!(t.to_string(), "1 0 0 0 1 0 0 0 1 10 20 30");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::identity());
        }

        let malformed = |reason: String| Error::MalformedTransform {
            raw: s.to_string(),
            reason,
            owner: None,
        };

        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.len() != TRANSFORM_MATRIX_SIZE {
            return Err(malformed(format!(
                "expected {} values, got {}",
                TRANSFORM_MATRIX_SIZE,
                tokens.len()
            )));
        }

        let mut values = [0.0; TRANSFORM_MATRIX_SIZE];
        for (idx, token) in tokens.iter().enumerate() {
            let value = token
                .parse::<f64>()
                .map_err(|_| malformed(format!("value {} '{}' is not a number", idx, token)))?;
            if !value.is_finite() {
                return Err(malformed(format!("value {} '{}' is not finite", idx, token)));
            }
            values[idx] = value;
        }

        Ok(Self::from_values(values))
    }

    /// Parse an optional transform attribute, treating absence as identity
    pub fn from_attribute(value: Option<&str>) -> Result<Self> {
        value.map_or_else(|| Ok(Self::identity()), Self::parse)
    }

    /// The 12 row-major values, in serialization order
    pub fn values(&self) -> [f64; TRANSFORM_MATRIX_SIZE] {
        let m = &self.linear;
        let t = &self.translation;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
            t.x,
            t.y,
            t.z,
        ]
    }

    /// The 3x3 linear part
    pub fn linear(&self) -> &Matrix3<f64> {
        &self.linear
    }

    /// The translation part
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Determinant of the linear part
    ///
    /// A negative value means the transform mirrors space and flips the
    /// winding of any triangle it is applied to.
    pub fn determinant(&self) -> f64 {
        self.linear.determinant()
    }

    /// Whether this transform reverses orientation
    pub fn is_mirroring(&self) -> bool {
        self.determinant() < 0.0
    }

    /// Map a point through this transform
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.linear.tr_mul(&point.coords) + self.translation)
    }

    /// Map a mesh vertex through this transform
    pub fn apply_vertex(&self, vertex: &Vertex) -> Vertex {
        let p = self.apply(&Point3::new(vertex.x, vertex.y, vertex.z));
        Vertex::new(p.x, p.y, p.z)
    }

    /// Compose two transforms: `other` is applied first, then `self`
    ///
    /// `a.compose(&b).apply(p)` equals `a.apply(&b.apply(p))`. Nested
    /// component placement depends on this order.
    pub fn compose(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform {
            linear: other.linear * self.linear,
            translation: self.linear.tr_mul(&other.translation) + self.translation,
        }
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl FromStr for AffineTransform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, value) in self.values().iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write_number(f, *value)?;
        }
        Ok(())
    }
}

/// Shortest round-trip form, switching to exponent notation for very large
/// or very small magnitudes
fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let magnitude = value.abs();
    if magnitude >= 1e21 || (magnitude != 0.0 && magnitude < 1e-7) {
        write!(f, "{:e}", value)
    } else {
        write!(f, "{}", value)
    }
}
