//! Manual FFI bindings for the dh_chain library
//!
//! Exposes a C-compatible interface to [`dh_chain::KinematicChain`] so a
//! C or C++ front end can feed DH parameters and draw the computed frames.
//!
//! The approach uses:
//! - `#[no_mangle]` functions with C calling convention
//! - An opaque boxed handle owning one chain
//! - Column-major `Mat4d` matrices (Eigen compatible)
//! - Status codes instead of panics across the boundary

use dh_chain::{Error, KinematicChain, Matrix4, Substitutions};
use log::warn;
use std::ffi::{CString, c_char, c_double, c_int, c_uint};
use std::ptr;

pub const DH_CHAIN_OK: c_int = 0;
pub const DH_CHAIN_NULL_HANDLE: c_int = 1;
pub const DH_CHAIN_INVALID_PARAMETER: c_int = 2;
pub const DH_CHAIN_INVALID_STATE: c_int = 3;

/// Opaque handle to a Rust KinematicChain
pub struct DhChainHandle {
    chain: KinematicChain,
}

/// C-compatible representation of a 4x4 transformation matrix
/// Data is stored in column-major order (compatible with Eigen)
#[repr(C)]
pub struct Mat4d {
    pub data: [c_double; 16],
}

impl Mat4d {
    fn identity() -> Self {
        Self::from(&Matrix4::identity())
    }
}

impl From<&Matrix4<f64>> for Mat4d {
    fn from(matrix: &Matrix4<f64>) -> Self {
        let mut result = Mat4d { data: [0.0; 16] };
        for col in 0..4 {
            for row in 0..4 {
                result.data[col * 4 + row] = matrix[(row, col)];
            }
        }
        result
    }
}

fn status(error: &Error) -> c_int {
    match error {
        Error::InvalidParameter { .. } => DH_CHAIN_INVALID_PARAMETER,
        Error::InvalidState { .. } => DH_CHAIN_INVALID_STATE,
    }
}

/// Create a new, empty chain rooted at the identity frame
///
/// # Safety
/// The returned pointer must be freed using `dh_chain_free`
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_new() -> *mut DhChainHandle {
    let handle = DhChainHandle {
        chain: KinematicChain::new(),
    };
    Box::into_raw(Box::new(handle))
}

/// Free a chain handle
///
/// # Safety
/// The chain pointer must be a valid pointer returned from `dh_chain_new`
/// and must not be used after this call
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_free(chain: *mut DhChainHandle) {
    if !chain.is_null() {
        unsafe {
            drop(Box::from_raw(chain));
        }
    }
}

/// Append a joint given its DH parameters (angles in degrees)
///
/// Values are not validated here; non-finite values are reported by
/// `dh_chain_compute`.
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_append(
    chain: *mut DhChainHandle,
    alfa: c_double,
    a: c_double,
    tita: c_double,
    d: c_double,
) -> bool {
    if chain.is_null() {
        return false;
    }

    let handle = unsafe { &mut *chain };
    handle
        .chain
        .append(dh_chain::DhJoint::new(alfa, a, tita, d));
    true
}

/// Remove all joints and computed frames
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_clear(chain: *mut DhChainHandle) {
    if chain.is_null() {
        return;
    }

    let handle = unsafe { &mut *chain };
    handle.chain.clear();
}

/// Compute all frames; returns one of the `DH_CHAIN_*` status codes
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_compute(chain: *mut DhChainHandle) -> c_int {
    if chain.is_null() {
        return DH_CHAIN_NULL_HANDLE;
    }

    let handle = unsafe { &mut *chain };
    match handle.chain.compute() {
        Ok(()) => DH_CHAIN_OK,
        Err(e) => {
            warn!("dh_chain_compute failed: {e}");
            status(&e)
        }
    }
}

/// Number of joints in the chain
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_length(chain: *const DhChainHandle) -> c_uint {
    if chain.is_null() {
        return 0;
    }

    let handle = unsafe { &*chain };
    handle.chain.len() as c_uint
}

/// Number of computed frame triples, 0 if the chain needs recomputing
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_frame_count(chain: *const DhChainHandle) -> c_uint {
    if chain.is_null() {
        return 0;
    }

    let handle = unsafe { &*chain };
    handle
        .chain
        .frames()
        .map(|frames| frames.len() as c_uint)
        .unwrap_or(0)
}

/// Get the end-effector transform
///
/// Returns the identity matrix for a null handle or a chain that needs
/// recomputing.
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_end_effector(chain: *const DhChainHandle) -> Mat4d {
    if chain.is_null() {
        return Mat4d::identity();
    }

    let handle = unsafe { &*chain };
    match handle.chain.end_effector() {
        Ok(m) => Mat4d::from(m),
        Err(_) => Mat4d::identity(),
    }
}

/// Get one frame of joint `index`: `which` is 0 for P0, 1 for P1, 2 for P2
///
/// Returns the identity matrix when the handle is null, the index or
/// `which` is out of range, or the chain needs recomputing.
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_frame(
    chain: *const DhChainHandle,
    index: c_uint,
    which: c_uint,
) -> Mat4d {
    if chain.is_null() {
        return Mat4d::identity();
    }

    let handle = unsafe { &*chain };
    let Ok(frames) = handle.chain.frames() else {
        return Mat4d::identity();
    };
    match (frames.get(index as usize), which) {
        (Some(frame), 0) => Mat4d::from(&frame.p0),
        (Some(frame), 1) => Mat4d::from(&frame.p1),
        (Some(frame), 2) => Mat4d::from(&frame.p2),
        _ => Mat4d::identity(),
    }
}

/// LaTeX source of the end-effector transform
///
/// Runs of numeric joints are folded into constant matrices. Returns null
/// for a null handle or a chain whose transform is not finite.
///
/// # Safety
/// The returned string must be freed with `dh_chain_free_string`
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_latex(chain: *const DhChainHandle) -> *mut c_char {
    if chain.is_null() {
        return ptr::null_mut();
    }

    let handle = unsafe { &*chain };
    let transform = match handle.chain.reduced_end_effector(&Substitutions::new()) {
        Ok(t) => t,
        Err(e) => {
            warn!("dh_chain_latex failed: {e}");
            return ptr::null_mut();
        }
    };
    match CString::new(KinematicChain::to_display_string(&transform)) {
        Ok(s) => s.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string returned by `dh_chain_latex`
///
/// # Safety
/// The string pointer must be a valid pointer returned from `dh_chain_latex`
#[unsafe(no_mangle)]
pub extern "C" fn dh_chain_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}
