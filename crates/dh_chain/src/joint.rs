use std::collections::BTreeSet;
use std::fmt;

use log::warn;
use nalgebra::Matrix4;

use crate::elementary::{self, exact};
use crate::expr::{Expr, Substitutions};
use crate::transform::Transform;
use crate::{Error, Result};

/// One Denavit-Hartenberg parameter: a number, or a free symbol bound at
/// evaluation time
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DhParam {
    Value(f64),
    Symbol(String),
}

impl DhParam {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, DhParam::Symbol(_))
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            DhParam::Value(v) => Expr::Const(*v),
            DhParam::Symbol(name) => Expr::symbol(name.as_str()),
        }
    }

    /// Resolve to a finite number.
    ///
    /// `field` names the parameter in the returned error.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if the value is non-finite or the symbol
    /// is unbound.
    pub fn resolve(&self, field: &str, subs: &Substitutions) -> Result<f64> {
        let value = match self {
            DhParam::Value(v) => *v,
            DhParam::Symbol(name) => match subs.get(name) {
                Some(v) => *v,
                None => {
                    warn!("DH parameter {field} references unbound symbol '{name}'");
                    return Err(Error::InvalidParameter {
                        name: field.to_string(),
                        reason: format!("unbound symbol '{name}'"),
                    });
                }
            },
        };

        if value.is_finite() {
            Ok(value)
        } else {
            warn!("DH parameter {field} is not finite: {value}");
            Err(Error::InvalidParameter {
                name: field.to_string(),
                reason: format!("non-finite value {value}"),
            })
        }
    }
}

impl From<f64> for DhParam {
    fn from(value: f64) -> Self {
        DhParam::Value(value)
    }
}

impl From<&str> for DhParam {
    fn from(name: &str) -> Self {
        DhParam::Symbol(name.to_string())
    }
}

impl From<String> for DhParam {
    fn from(name: String) -> Self {
        DhParam::Symbol(name)
    }
}

impl fmt::Display for DhParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhParam::Value(v) => write!(f, "{v}"),
            DhParam::Symbol(name) => write!(f, "{name}"),
        }
    }
}

/// One joint of a serial chain, relative to the previous link:
/// `T = Rx(alfa) * Dx(a) * Rz(tita) * Dz(d)`
///
/// Angles are stored in degrees, exactly as given.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DhJoint {
    /// Rotation about the local X axis (degrees)
    alfa: DhParam,

    /// Translation along the local X axis
    a: DhParam,

    /// Rotation about the local Z axis (degrees)
    tita: DhParam,

    /// Translation along the local Z axis
    d: DhParam,
}

impl DhJoint {
    /// Create a joint from its four DH parameters
    ///
    /// # Example
    /// ```rust
    /// use dh_chain::DhJoint;
    ///
    /// let shoulder = DhJoint::new(90.0, 0.0, "theta1", 10.0);
    /// assert!(shoulder.is_symbolic());
    /// ```
    pub fn new(
        alfa: impl Into<DhParam>,
        a: impl Into<DhParam>,
        tita: impl Into<DhParam>,
        d: impl Into<DhParam>,
    ) -> Self {
        Self {
            alfa: alfa.into(),
            a: a.into(),
            tita: tita.into(),
            d: d.into(),
        }
    }

    pub fn alfa(&self) -> &DhParam {
        &self.alfa
    }

    pub fn a(&self) -> &DhParam {
        &self.a
    }

    pub fn tita(&self) -> &DhParam {
        &self.tita
    }

    pub fn d(&self) -> &DhParam {
        &self.d
    }

    pub fn is_symbolic(&self) -> bool {
        [&self.alfa, &self.a, &self.tita, &self.d]
            .iter()
            .any(|p| p.is_symbolic())
    }

    /// Names of the free symbols among the four parameters
    pub fn free_symbols(&self) -> BTreeSet<String> {
        [&self.alfa, &self.a, &self.tita, &self.d]
            .iter()
            .filter_map(|p| match p {
                DhParam::Symbol(name) => Some(name.clone()),
                DhParam::Value(_) => None,
            })
            .collect()
    }

    /// Full joint transform in exact form
    pub fn transform(&self) -> Transform {
        Transform::Exact(exact::joint_transform(
            self.alfa.to_expr(),
            self.a.to_expr(),
            self.tita.to_expr(),
            self.d.to_expr(),
        ))
    }

    /// `Rx(alfa) * Dx(a)` in exact form
    pub fn first_half(&self) -> Transform {
        Transform::Exact(exact::rotate_translate_x(self.alfa.to_expr(), self.a.to_expr()))
    }

    /// `Rz(tita) * Dz(d)` in exact form
    pub fn second_half(&self) -> Transform {
        Transform::Exact(exact::rotate_translate_z(self.tita.to_expr(), self.d.to_expr()))
    }

    /// Numerically evaluated joint transform
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if a parameter is non-finite or symbolic.
    pub fn numeric_transform(&self) -> Result<Matrix4<f64>> {
        self.numeric_transform_with(&Substitutions::new())
    }

    /// Numerically evaluated joint transform with symbols bound from `subs`
    pub fn numeric_transform_with(&self, subs: &Substitutions) -> Result<Matrix4<f64>> {
        let [alfa, a, tita, d] = self.resolve(subs)?;
        Ok(elementary::joint_transform(alfa, a, tita, d))
    }

    /// Numerically evaluated `(first_half, second_half)`
    pub fn numeric_halves(&self, subs: &Substitutions) -> Result<(Matrix4<f64>, Matrix4<f64>)> {
        let [alfa, a, tita, d] = self.resolve(subs)?;
        Ok((
            elementary::rotate_translate_x(alfa, a),
            elementary::rotate_translate_z(tita, d),
        ))
    }

    fn resolve(&self, subs: &Substitutions) -> Result<[f64; 4]> {
        Ok([
            self.alfa.resolve("alfa", subs)?,
            self.a.resolve("a", subs)?,
            self.tita.resolve("tita", subs)?,
            self.d.resolve("d", subs)?,
        ])
    }
}

impl Default for DhJoint {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl fmt::Display for DhJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DH joint (alfa: {}, a: {}, tita: {}, d: {})",
            self.alfa, self.a, self.tita, self.d
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_log::test;

    #[test]
    fn test_parameters_stored_as_given() {
        let joint = DhJoint::new(90.0, 2.5, -45.0, 7.0);
        assert_eq!(joint.alfa(), &DhParam::Value(90.0));
        assert_eq!(joint.a(), &DhParam::Value(2.5));
        assert_eq!(joint.tita(), &DhParam::Value(-45.0));
        assert_eq!(joint.d(), &DhParam::Value(7.0));
        assert!(!joint.is_symbolic());
    }

    #[test]
    fn test_zero_joint_is_identity() {
        let joint = DhJoint::default();
        assert_relative_eq!(joint.numeric_transform().unwrap(), Matrix4::identity());
    }

    #[test]
    fn test_halves_compose_to_full_transform() {
        let joint = DhJoint::new(30.0, 4.0, 120.0, -2.0);
        let (first, second) = joint.numeric_halves(&Substitutions::new()).unwrap();
        assert_relative_eq!(
            first * second,
            joint.numeric_transform().unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_exact_forms_evaluate_to_numeric() {
        let joint = DhJoint::new(30.0, 4.0, 120.0, -2.0);
        let subs = Substitutions::new();
        assert_relative_eq!(
            joint.transform().evaluate(&subs).unwrap(),
            joint.numeric_transform().unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            joint.first_half().evaluate(&subs).unwrap(),
            elementary::rotate_translate_x(30.0, 4.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            joint.second_half().evaluate(&subs).unwrap(),
            elementary::rotate_translate_z(120.0, -2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_non_finite_fails_at_evaluation() {
        // accepted at storage time
        let joint = DhJoint::new(0.0, f64::NAN, 0.0, 0.0);
        let err = joint.numeric_transform().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "a"));

        let joint = DhJoint::new(0.0, 0.0, 0.0, f64::NEG_INFINITY);
        assert!(matches!(
            joint.numeric_transform(),
            Err(Error::InvalidParameter { ref name, .. }) if name == "d"
        ));
    }

    #[test]
    fn test_symbolic_joint_needs_substitution() {
        let joint = DhJoint::new(0.0, "a1", "theta1", 0.0);
        assert!(joint.is_symbolic());
        assert_eq!(
            joint.free_symbols().into_iter().collect::<Vec<_>>(),
            vec!["a1", "theta1"]
        );
        assert!(matches!(
            joint.numeric_transform(),
            Err(Error::InvalidParameter { .. })
        ));

        let subs = Substitutions::from([("a1".to_string(), 3.0), ("theta1".to_string(), 90.0)]);
        let t = joint.numeric_transform_with(&subs).unwrap();
        assert_relative_eq!(t, elementary::joint_transform(0.0, 3.0, 90.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_display() {
        let joint = DhJoint::new(90.0, 0.0, "q2", 1.5);
        assert_eq!(joint.to_string(), "DH joint (alfa: 90, a: 0, tita: q2, d: 1.5)");
    }
}
