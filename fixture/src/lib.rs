//! Native module that exports the operations of `native_binding::NativeBinding`.
//!
//! Built as `cdylib` and loaded by the tests through the system dynamic loader.

use std::ffi::c_char;
use std::ffi::c_void;
use std::ffi::CStr;

/// Options as laid out in memory by the caller.
#[repr(C)]
pub struct ToolOptions {
    /// Identifier.
    pub id: i32,
    /// NUL-terminated name.
    pub name: *const c_char,
}

/// `a + b`
#[no_mangle]
pub extern "C" fn sum(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

/// `a - b`
#[no_mangle]
pub extern "C" fn sub(a: i32, b: i32) -> i32 {
    a.wrapping_sub(b)
}

/// Write `a` followed by `b` to `out`.
///
/// At most `len` bytes are written including the terminating NUL.
/// Returns the length of the concatenation excluding NUL.
///
/// # Safety
///
/// `a` and `b` are valid NUL-terminated strings.
/// `out` is either NULL or valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn concat_str(
    a: *const c_char,
    b: *const c_char,
    out: *mut c_char,
    len: usize,
) -> usize {
    // SAFETY: Guaranteed by the caller.
    let (a, b) = unsafe { (CStr::from_ptr(a).to_bytes(), CStr::from_ptr(b).to_bytes()) };
    let total = a.len() + b.len();
    if out.is_null() || len == 0 {
        return total;
    }
    // SAFETY: Guaranteed by the caller.
    let out = unsafe { std::slice::from_raw_parts_mut(out.cast::<u8>(), len) };
    let n = total.min(len - 1);
    for (dst, src) in out.iter_mut().zip(a.iter().chain(b.iter())).take(n) {
        *dst = *src;
    }
    out[n] = 0;
    total
}

/// Copy `options` to `out`.
///
/// The name is borrowed from `options`.
///
/// # Safety
///
/// Both pointers are valid.
#[no_mangle]
pub unsafe extern "C" fn get_options(options: *const ToolOptions, out: *mut ToolOptions) {
    // SAFETY: Guaranteed by the caller.
    unsafe {
        (*out).id = (*options).id;
        (*out).name = (*options).name;
    }
}

/// `n`-th Fibonacci number.
#[no_mangle]
pub extern "C" fn async_fib(n: u32, use_cache: bool) -> u64 {
    if use_cache {
        let mut cache = vec![0_u64, 1];
        for i in 2..=n as usize {
            let next = cache[i - 1].wrapping_add(cache[i - 2]);
            cache.push(next);
        }
        return cache[n as usize];
    }
    let (mut a, mut b) = (0_u64, 1_u64);
    for _ in 0..n {
        (a, b) = (b, a.wrapping_add(b));
    }
    a
}

/// Number of `callback` invocations per call.
pub const NUM_CALLS: u32 = 3;

/// Invoke `callback` from [`NUM_CALLS`] threads with values `0..NUM_CALLS`.
///
/// Returns after the last invocation.
///
/// # Safety
///
/// `callback` can be called concurrently with `data`.
#[no_mangle]
pub unsafe extern "C" fn call_threadsafe_function(
    callback: unsafe extern "C" fn(*mut c_void, u32),
    data: *mut c_void,
) {
    let data = data as usize;
    std::thread::scope(|s| {
        for value in 0..NUM_CALLS {
            s.spawn(move || {
                // SAFETY: Guaranteed by the caller.
                unsafe { callback(data as *mut c_void, value) }
            });
        }
    });
}
