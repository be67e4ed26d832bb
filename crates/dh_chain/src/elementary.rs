//! Elementary homogeneous transforms
//!
//! Single-axis rotations and translations, and the Denavit-Hartenberg
//! per-joint composite `Rx(alfa) * Dx(a) * Rz(tita) * Dz(d)`.
//!
//! Angles are taken in degrees and converted to radians here, at the
//! evaluation boundary. The functions at the top level build numeric
//! [`Matrix4<f64>`] values; the [`exact`] module builds the same transforms
//! as [`ExprMatrix`] values for analytic display.

use nalgebra::{Matrix4, Rotation3, Translation3, Vector3};

/// Rotation about the X axis by `deg` degrees
pub fn rotate_x(deg: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), deg.to_radians()).to_homogeneous()
}

/// Rotation about the Y axis by `deg` degrees
pub fn rotate_y(deg: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), deg.to_radians()).to_homogeneous()
}

/// Rotation about the Z axis by `deg` degrees
pub fn rotate_z(deg: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), deg.to_radians()).to_homogeneous()
}

pub fn translate_x(len: f64) -> Matrix4<f64> {
    Translation3::new(len, 0.0, 0.0).to_homogeneous()
}

pub fn translate_y(len: f64) -> Matrix4<f64> {
    Translation3::new(0.0, len, 0.0).to_homogeneous()
}

pub fn translate_z(len: f64) -> Matrix4<f64> {
    Translation3::new(0.0, 0.0, len).to_homogeneous()
}

/// `Rx(alfa) * Dx(a)`, the first half of a DH joint
pub fn rotate_translate_x(alfa: f64, a: f64) -> Matrix4<f64> {
    rotate_x(alfa) * translate_x(a)
}

/// `Rz(tita) * Dz(d)`, the second half of a DH joint
pub fn rotate_translate_z(tita: f64, d: f64) -> Matrix4<f64> {
    rotate_z(tita) * translate_z(d)
}

/// Full DH joint transform `Rx(alfa) * Dx(a) * Rz(tita) * Dz(d)`
///
/// # Example
/// ```rust
/// use dh_chain::elementary::joint_transform;
///
/// let t = joint_transform(0.0, 5.0, 0.0, 3.0);
/// assert!((t[(0, 3)] - 5.0).abs() < 1e-12);
/// assert!((t[(2, 3)] - 3.0).abs() < 1e-12);
/// ```
pub fn joint_transform(alfa: f64, a: f64, tita: f64, d: f64) -> Matrix4<f64> {
    rotate_translate_x(alfa, a) * rotate_translate_z(tita, d)
}

/// Exact (symbolic) counterparts of the numeric builders.
pub mod exact {
    use crate::expr::Expr;
    use crate::transform::ExprMatrix;

    fn rotation(axis: usize, deg: Expr) -> ExprMatrix {
        let (sin, cos) = (Expr::sin_deg(deg.clone()), Expr::cos_deg(deg));
        // indices of the two axes spanning the rotation plane
        let (i, j) = match axis {
            0 => (1, 2),
            1 => (2, 0),
            _ => (0, 1),
        };
        let mut m = ExprMatrix::identity();
        m.set(i, i, cos.clone());
        m.set(j, j, cos);
        m.set(i, j, -sin.clone());
        m.set(j, i, sin);
        m
    }

    fn translation(axis: usize, len: Expr) -> ExprMatrix {
        let mut m = ExprMatrix::identity();
        m.set(axis, 3, len);
        m
    }

    pub fn rotate_x(deg: impl Into<Expr>) -> ExprMatrix {
        rotation(0, deg.into())
    }

    pub fn rotate_y(deg: impl Into<Expr>) -> ExprMatrix {
        rotation(1, deg.into())
    }

    pub fn rotate_z(deg: impl Into<Expr>) -> ExprMatrix {
        rotation(2, deg.into())
    }

    pub fn translate_x(len: impl Into<Expr>) -> ExprMatrix {
        translation(0, len.into())
    }

    pub fn translate_y(len: impl Into<Expr>) -> ExprMatrix {
        translation(1, len.into())
    }

    pub fn translate_z(len: impl Into<Expr>) -> ExprMatrix {
        translation(2, len.into())
    }

    pub fn rotate_translate_x(alfa: impl Into<Expr>, a: impl Into<Expr>) -> ExprMatrix {
        &rotate_x(alfa) * &translate_x(a)
    }

    pub fn rotate_translate_z(tita: impl Into<Expr>, d: impl Into<Expr>) -> ExprMatrix {
        &rotate_z(tita) * &translate_z(d)
    }

    pub fn joint_transform(
        alfa: impl Into<Expr>,
        a: impl Into<Expr>,
        tita: impl Into<Expr>,
        d: impl Into<Expr>,
    ) -> ExprMatrix {
        &rotate_translate_x(alfa, a) * &rotate_translate_z(tita, d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, Substitutions};
    use approx::assert_relative_eq;
    use test_log::test;

    #[test]
    fn test_rotations_match_textbook_matrices() {
        let (s, c) = 30f64.to_radians().sin_cos();

        #[rustfmt::skip]
        let rx = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   -s,  0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let ry = Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
            -s,  0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let rz = Matrix4::new(
            c,   -s,  0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        assert_relative_eq!(rotate_x(30.0), rx, epsilon = 1e-12);
        assert_relative_eq!(rotate_y(30.0), ry, epsilon = 1e-12);
        assert_relative_eq!(rotate_z(30.0), rz, epsilon = 1e-12);
    }

    #[test]
    fn test_translations() {
        assert_relative_eq!(translate_x(2.0)[(0, 3)], 2.0);
        assert_relative_eq!(translate_y(3.0)[(1, 3)], 3.0);
        assert_relative_eq!(translate_z(4.0)[(2, 3)], 4.0);
        assert_relative_eq!(
            translate_z(4.0).fixed_view::<3, 3>(0, 0).into_owned(),
            nalgebra::Matrix3::identity()
        );
    }

    #[test]
    fn test_bottom_row_is_fixed() {
        let t = joint_transform(37.0, 12.5, -81.0, 4.0);
        assert_eq!(t.row(3).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rotation_block_orthonormal() {
        let t = joint_transform(37.0, 12.5, -81.0, 4.0);
        let r = t.fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(r * r.transpose(), nalgebra::Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_joint_transform_composition_order() {
        let expected = rotate_x(20.0) * translate_x(3.0) * rotate_z(-45.0) * translate_z(7.0);
        assert_relative_eq!(joint_transform(20.0, 3.0, -45.0, 7.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_matches_numeric() {
        let subs = Substitutions::new();
        let pairs = [
            (exact::rotate_x(33.0), rotate_x(33.0)),
            (exact::rotate_y(-120.0), rotate_y(-120.0)),
            (exact::rotate_z(71.5), rotate_z(71.5)),
            (exact::translate_y(9.0), translate_y(9.0)),
            (
                exact::joint_transform(15.0, 2.0, 100.0, -6.0),
                joint_transform(15.0, 2.0, 100.0, -6.0),
            ),
        ];
        for (symbolic, numeric) in pairs {
            assert_relative_eq!(symbolic.evaluate(&subs).unwrap(), numeric, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_exact_quarter_turn_is_exact() {
        let rx = exact::rotate_x(90.0);
        assert_eq!(rx.get(1, 1), &Expr::zero());
        assert_eq!(rx.get(1, 2), &Expr::Const(-1.0));
        assert_eq!(rx.get(2, 1), &Expr::one());
    }

    #[test]
    fn test_exact_symbolic_joint() {
        let t = exact::joint_transform(0.0, "a1", "theta1", 0.0);
        assert_eq!(t.get(0, 3), &Expr::symbol("a1"));

        let subs = Substitutions::from([("a1".to_string(), 2.0), ("theta1".to_string(), 30.0)]);
        assert_relative_eq!(
            t.evaluate(&subs).unwrap(),
            joint_transform(0.0, 2.0, 30.0, 0.0),
            epsilon = 1e-12
        );
    }
}
