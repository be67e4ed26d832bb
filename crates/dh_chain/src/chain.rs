//! Serial kinematic chain of DH joints
//!
//! A [`KinematicChain`] owns an ordered list of [`DhJoint`]s and, after
//! [`KinematicChain::compute`], one [`FrameTriple`] per joint plus the
//! end-effector transform
//! `origin * T(joint_0) * T(joint_1) * ... * T(joint_n-1)`.

use log::{debug, trace, warn};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::expr::Substitutions;
use crate::joint::DhJoint;
use crate::transform::{ExprMatrix, Transform};
use crate::{Error, Result};

/// The three frames recorded for one joint
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameTriple {
    /// Frame before the joint (previous joint's `p2`, or the chain origin)
    pub p0: Matrix4<f64>,
    /// Frame after `Rx(alfa) * Dx(a)`
    pub p1: Matrix4<f64>,
    /// Frame after `Rz(tita) * Dz(d)`, the joint's own frame
    pub p2: Matrix4<f64>,
}

impl FrameTriple {
    /// Positions of `p0`, `p1` and `p2`
    pub fn origins(&self) -> [Point3<f64>; 3] {
        [position(&self.p0), position(&self.p1), position(&self.p2)]
    }

    /// Line segments `p0 -> p1` and `p1 -> p2`
    pub fn segments(&self) -> [(Point3<f64>, Point3<f64>); 2] {
        let [p0, p1, p2] = self.origins();
        [(p0, p1), (p1, p2)]
    }

    /// X, Y and Z axis segments of `length` drawn at `p2`
    pub fn axis_marker(&self, length: f64) -> [(Point3<f64>, Point3<f64>); 3] {
        let origin = position(&self.p2);
        std::array::from_fn(|axis| {
            let direction = Vector3::new(
                self.p2[(0, axis)],
                self.p2[(1, axis)],
                self.p2[(2, axis)],
            );
            (origin, origin + direction * length)
        })
    }
}

fn position(frame: &Matrix4<f64>) -> Point3<f64> {
    Point3::new(frame[(0, 3)], frame[(1, 3)], frame[(2, 3)])
}

/// An ordered serial chain of DH joints
///
/// The chain is `Empty` until the first [`append`](Self::append). Results
/// are read back with [`frames`](Self::frames) and
/// [`end_effector`](Self::end_effector); both fail with
/// [`Error::InvalidState`] when the joints or origin changed since the last
/// successful [`compute`](Self::compute). An empty chain always reads as
/// no frames and an end-effector equal to the origin.
///
/// # Example
/// ```rust
/// use dh_chain::{DhJoint, KinematicChain};
///
/// let mut chain = KinematicChain::new();
/// chain.append(DhJoint::new(0.0, 5.0, 0.0, 3.0));
/// chain.compute()?;
///
/// let tip = chain.end_effector_position()?;
/// assert!((tip.x - 5.0).abs() < 1e-9);
/// assert!((tip.z - 3.0).abs() < 1e-9);
/// # Ok::<(), dh_chain::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct KinematicChain {
    joints: Vec<DhJoint>,
    origin: Matrix4<f64>,
    frames: Vec<FrameTriple>,
    end_effector: Matrix4<f64>,
    stale: bool,
}

impl KinematicChain {
    /// Create an empty chain rooted at the identity frame
    pub fn new() -> Self {
        Self::with_origin(Matrix4::identity())
    }

    /// Create an empty chain rooted at `origin`
    pub fn with_origin(origin: Matrix4<f64>) -> Self {
        Self {
            joints: Vec::new(),
            origin,
            frames: Vec::new(),
            end_effector: origin,
            stale: false,
        }
    }

    pub fn origin(&self) -> &Matrix4<f64> {
        &self.origin
    }

    /// Move the chain root. A populated chain must be recomputed afterwards.
    pub fn set_origin(&mut self, origin: Matrix4<f64>) {
        self.origin = origin;
        if self.joints.is_empty() {
            self.end_effector = origin;
        } else {
            self.stale = true;
        }
    }

    pub fn joints(&self) -> &[DhJoint] {
        &self.joints
    }

    /// Number of joints
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Remove all joints and computed frames
    pub fn clear(&mut self) {
        self.joints.clear();
        self.frames.clear();
        self.end_effector = self.origin;
        self.stale = false;
    }

    /// Add a joint at the end of the chain. Does not recompute.
    pub fn append(&mut self, joint: DhJoint) {
        self.joints.push(joint);
        self.stale = true;
    }

    /// Compose all joint transforms numerically.
    ///
    /// Previously computed frames are discarded first, so repeated calls on
    /// an unchanged chain give identical results.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if any joint has a non-finite or symbolic
    /// parameter. No frames are kept in that case.
    pub fn compute(&mut self) -> Result<()> {
        self.compute_with(&Substitutions::new())
    }

    /// [`compute`](Self::compute) with free symbols bound from `subs`
    pub fn compute_with(&mut self, subs: &Substitutions) -> Result<()> {
        self.frames.clear();
        self.stale = true;

        let mut frames = Vec::with_capacity(self.joints.len());
        let mut current = self.origin;
        for (index, joint) in self.joints.iter().enumerate() {
            let (first, second) = joint.numeric_halves(subs)?;

            let p0 = current;
            current *= first;
            let p1 = current;
            current *= second;
            let p2 = current;
            ensure_finite(index, &current)?;

            trace!("joint {index}: {joint} -> {:?}", position(&p2));
            frames.push(FrameTriple { p0, p1, p2 });
        }

        self.frames = frames;
        self.end_effector = current;
        self.stale = false;
        debug!(
            "computed chain of {} joints, end effector at {:?}",
            self.joints.len(),
            position(&current)
        );
        Ok(())
    }

    /// Per-joint frames from the last [`compute`](Self::compute)
    pub fn frames(&self) -> Result<&[FrameTriple]> {
        self.ensure_current()?;
        Ok(&self.frames)
    }

    /// End-effector transform from the last [`compute`](Self::compute)
    pub fn end_effector(&self) -> Result<&Matrix4<f64>> {
        self.ensure_current()?;
        Ok(&self.end_effector)
    }

    /// Translation part of the end-effector transform
    pub fn end_effector_position(&self) -> Result<Point3<f64>> {
        self.end_effector().map(position)
    }

    /// End-effector transform in exact form.
    ///
    /// Built directly from the joints, independent of
    /// [`compute`](Self::compute). Free symbols stay free, and so do
    /// non-quarter constant angles, so the entries grow with every joint.
    /// [`reduced_end_effector`](Self::reduced_end_effector) keeps long
    /// chains compact.
    pub fn exact_end_effector(&self) -> Transform {
        self.joints.iter().fold(
            Transform::Exact(ExprMatrix::from_numeric(&self.origin)),
            |current, joint| current * joint.transform(),
        )
    }

    /// End-effector transform with free symbols bound from `subs`.
    ///
    /// Joints that resolve fully are multiplied numerically; only joints
    /// still holding free symbols stay in exact form, with their constant
    /// angles folded. A chain without free symbols comes back
    /// [`Transform::Numeric`].
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if a joint parameter is non-finite or a
    /// numeric run of joints overflows.
    pub fn reduced_end_effector(&self, subs: &Substitutions) -> Result<Transform> {
        let mut current = Transform::Numeric(self.origin);
        // product of the numeric joints since the last exact one
        let mut run = Matrix4::identity();
        for (index, joint) in self.joints.iter().enumerate() {
            if joint.free_symbols().iter().all(|s| subs.contains_key(s)) {
                run *= joint.numeric_transform_with(subs)?;
                ensure_finite(index, &run)?;
            } else {
                current = &current * &Transform::Numeric(run);
                current = &current * &joint.transform().reduce(subs);
                run = Matrix4::identity();
            }
        }
        current = &current * &Transform::Numeric(run);
        if let Transform::Numeric(m) = &current {
            ensure_finite(self.joints.len().saturating_sub(1), m)?;
        }
        Ok(current)
    }

    /// End-effector transform with free symbols bound from `subs`, evaluated
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] if a symbol is left unbound or any entry
    /// is non-finite.
    pub fn end_effector_expression(&self, subs: &Substitutions) -> Result<Matrix4<f64>> {
        self.reduced_end_effector(subs)?.evaluate(subs)
    }

    /// LaTeX source for `expr`, for a typesetting front end
    pub fn to_display_string(expr: &Transform) -> String {
        expr.to_latex()
    }

    fn ensure_current(&self) -> Result<()> {
        if self.stale {
            Err(Error::InvalidState {
                message: format!(
                    "chain of {} joints changed since the last compute",
                    self.joints.len()
                ),
            })
        } else {
            Ok(())
        }
    }
}

fn ensure_finite(index: usize, transform: &Matrix4<f64>) -> Result<()> {
    if transform.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        warn!("transform through joint {index} is not finite");
        Err(Error::InvalidParameter {
            name: format!("joint {index}"),
            reason: "transform overflows to a non-finite value".to_string(),
        })
    }
}

impl Default for KinematicChain {
    fn default() -> Self {
        Self::new()
    }
}
