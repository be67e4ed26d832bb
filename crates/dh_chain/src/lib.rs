//! # DH Chain
//!
//! Forward kinematics for serial manipulators described by
//! Denavit-Hartenberg parameters.
//!
//! Each joint contributes `Rx(alfa) * Dx(a) * Rz(tita) * Dz(d)`; a
//! [`KinematicChain`] composes them in joint order from an origin frame and
//! records, per joint, the frames before, between and after the two halves
//! of that transform so a viewer can draw the links.
//!
//! ## Features
//!
//! - Numeric evaluation with nalgebra by default
//! - Exact (symbolic) transforms on request, with free parameters and
//!   LaTeX output
//! - Optional `serde` support for joints and frames
//!
//! ## Example
//!
//! ```rust
//! use dh_chain::{DhJoint, KinematicChain};
//!
//! let mut chain = KinematicChain::new();
//! chain.append(DhJoint::new(0.0, 0.0, 90.0, 10.0));
//! chain.append(DhJoint::new(90.0, 25.0, 0.0, 0.0));
//! chain.compute()?;
//!
//! for frame in chain.frames()? {
//!     let [p0, p1, p2] = frame.origins();
//!     println!("{p0} -> {p1} -> {p2}");
//! }
//! # Ok::<(), dh_chain::Error>(())
//! ```

pub mod chain;
pub mod elementary;
pub mod expr;
pub mod joint;
pub mod transform;

pub use chain::{FrameTriple, KinematicChain};
pub use expr::{Expr, Substitutions};
pub use joint::{DhJoint, DhParam};
pub use nalgebra::{Matrix4, Point3};
pub use transform::{ExprMatrix, Transform};

/// Entry-wise tolerance used when comparing computed frames
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Common result type for this library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for kinematic chain operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A DH parameter could not be evaluated to a finite number
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Results were read while out of date with the chain's joints
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}
