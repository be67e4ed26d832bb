//! Forward kinematics properties checked through the public API

use approx::assert_relative_eq;
use dh_chain::elementary::{joint_transform, rotate_x};
use dh_chain::{DEFAULT_TOLERANCE, DhJoint, KinematicChain, Matrix4};
use nalgebra::{Matrix3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use test_log::test;

fn chain_of(joints: &[(f64, f64, f64, f64)]) -> KinematicChain {
    let mut chain = KinematicChain::new();
    for &(alfa, a, tita, d) in joints {
        chain.append(DhJoint::new(alfa, a, tita, d));
    }
    chain
}

fn rotation_block(m: &Matrix4<f64>) -> Matrix3<f64> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

fn translation(m: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

#[test]
fn compute_is_idempotent() {
    let mut chain = chain_of(&[(10.0, 2.0, 30.0, 4.0), (-90.0, 7.0, 45.0, 0.0)]);

    chain.compute().unwrap();
    let first_frames = chain.frames().unwrap().to_vec();
    let first_end = *chain.end_effector().unwrap();

    chain.compute().unwrap();
    assert_eq!(chain.frames().unwrap().len(), chain.len());
    assert_eq!(chain.frames().unwrap(), first_frames.as_slice());
    assert_eq!(chain.end_effector().unwrap(), &first_end);
}

#[test]
fn frames_are_continuous() {
    let mut chain = chain_of(&[
        (0.0, 0.0, 15.0, 12.0),
        (90.0, 3.0, -75.0, 0.0),
        (-30.0, 20.0, 160.0, 1.0),
        (45.0, 0.5, 0.0, 9.0),
    ]);
    chain.compute().unwrap();

    let frames = chain.frames().unwrap();
    assert_eq!(frames[0].p0, *chain.origin());
    for pair in frames.windows(2) {
        assert_relative_eq!(pair[0].p2, pair[1].p0, epsilon = DEFAULT_TOLERANCE);
    }
    assert_eq!(frames[frames.len() - 1].p2, *chain.end_effector().unwrap());
}

#[test]
fn empty_chain() {
    let mut chain = KinematicChain::new();
    chain.compute().unwrap();
    assert!(chain.frames().unwrap().is_empty());
    assert_eq!(chain.end_effector().unwrap(), &Matrix4::identity());
}

#[test]
fn pure_rotation() {
    let mut chain = chain_of(&[(90.0, 0.0, 0.0, 0.0)]);
    chain.compute().unwrap();

    let end = chain.end_effector().unwrap();
    let r = rotation_block(end);
    assert_relative_eq!(r, rotation_block(&rotate_x(90.0)), epsilon = DEFAULT_TOLERANCE);
    assert_relative_eq!(r[(1, 1)], 0.0, epsilon = DEFAULT_TOLERANCE);
    assert_relative_eq!(r[(2, 1)], 1.0, epsilon = DEFAULT_TOLERANCE);
    assert_relative_eq!(r[(1, 2)], -1.0, epsilon = DEFAULT_TOLERANCE);
    assert_eq!(translation(end), Vector3::zeros());
}

#[test]
fn pure_translation() {
    let mut chain = chain_of(&[(0.0, 5.0, 0.0, 3.0)]);
    chain.compute().unwrap();

    let end = chain.end_effector().unwrap();
    assert_relative_eq!(
        translation(end),
        Vector3::new(5.0, 0.0, 3.0),
        epsilon = DEFAULT_TOLERANCE
    );
}

#[test]
fn double_half_turn_is_identity() {
    let mut chain = chain_of(&[(180.0, 0.0, 0.0, 0.0), (180.0, 0.0, 0.0, 0.0)]);
    chain.compute().unwrap();

    let end = chain.end_effector().unwrap();
    assert_relative_eq!(
        rotation_block(end),
        Matrix3::identity(),
        epsilon = DEFAULT_TOLERANCE
    );
}

#[test]
fn matches_direct_multiplication() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..50 {
        let n = rng.gen_range(1..=8);
        let params: Vec<(f64, f64, f64, f64)> = (0..n)
            .map(|_| {
                (
                    rng.gen_range(-180.0..=180.0),
                    rng.gen_range(0.0..=100.0),
                    rng.gen_range(-180.0..=180.0),
                    rng.gen_range(0.0..=100.0),
                )
            })
            .collect();

        let mut chain = chain_of(&params);
        chain.compute().unwrap();

        let reference: Matrix4<f64> = params
            .iter()
            .fold(Matrix4::identity(), |acc, &(alfa, a, tita, d)| {
                acc * joint_transform(alfa, a, tita, d)
            });

        let end = chain.end_effector().unwrap();
        for (actual, expected) in end.iter().zip(reference.iter()) {
            assert!(
                (actual - expected).abs() < DEFAULT_TOLERANCE,
                "{n} joints: {actual} vs {expected}"
            );
        }
        assert_eq!(end.row(3).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 0.0, 1.0]);
    }
}

#[test]
fn exact_and_numeric_agree() {
    let mut chain = chain_of(&[(30.0, 10.0, 45.0, 5.0), (-60.0, 4.0, 90.0, 2.0)]);
    chain.compute().unwrap();

    let exact = chain.exact_end_effector();
    assert!(exact.is_exact());
    assert_relative_eq!(
        exact.numeric().unwrap(),
        *chain.end_effector().unwrap(),
        epsilon = DEFAULT_TOLERANCE
    );
}
