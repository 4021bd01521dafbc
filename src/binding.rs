use std::ffi::c_char;
use std::ffi::c_void;
use std::ffi::CStr;
use std::ffi::CString;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use libloading::Library;
use log::trace;

use crate::BindingError;
use crate::LoadError;

type SumFn = unsafe extern "C" fn(i32, i32) -> i32;
type SubFn = unsafe extern "C" fn(i32, i32) -> i32;
type ConcatStrFn = unsafe extern "C" fn(*const c_char, *const c_char, *mut c_char, usize) -> usize;
type GetOptionsFn = unsafe extern "C" fn(*const RawToolOptions, *mut RawToolOptions);
type AsyncFibFn = unsafe extern "C" fn(u32, bool) -> u64;
type CallbackFn = unsafe extern "C" fn(*mut c_void, u32);
type CallThreadsafeFunctionFn = unsafe extern "C" fn(CallbackFn, *mut c_void);

#[repr(C)]
struct RawToolOptions {
    id: i32,
    name: *const c_char,
}

/// Options passed through [`NativeBinding::get_options`].
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ToolOptions {
    /// Identifier.
    pub id: i32,
    /// Name.
    pub name: String,
}

/// Loaded native module.
///
/// All operations are resolved when the module is loaded,
/// i.e. a missing symbol fails the load, not the call.
///
/// Expected C ABI:
///
/// ```c
/// int32_t sum(int32_t a, int32_t b);
/// int32_t sub(int32_t a, int32_t b);
/// // Writes at most `len` bytes including NUL, returns the full length excluding NUL.
/// size_t concat_str(const char* a, const char* b, char* out, size_t len);
/// void get_options(const ToolOptions* options, ToolOptions* out);
/// uint64_t async_fib(uint32_t n, bool use_cache);
/// // Returns after the last invocation of `callback`.
/// void call_threadsafe_function(void (*callback)(void* data, uint32_t value), void* data);
/// ```
pub struct NativeBinding {
    sum: SumFn,
    sub: SubFn,
    concat_str: ConcatStrFn,
    get_options: GetOptionsFn,
    async_fib: AsyncFibFn,
    call_threadsafe_function: CallThreadsafeFunctionFn,
    path: PathBuf,
    library: Arc<Library>,
}

impl NativeBinding {
    /// Load the module from `path`.
    ///
    /// Loading runs the module's initialization code.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        // SAFETY: Native modules are trusted to be built for this host,
        // their initialization routines have no preconditions.
        let library = unsafe { Library::new(path) }?;
        // SAFETY: The types match the C ABI above.
        let binding = unsafe {
            Self {
                sum: symbol(&library, "sum")?,
                sub: symbol(&library, "sub")?,
                concat_str: symbol(&library, "concat_str")?,
                get_options: symbol(&library, "get_options")?,
                async_fib: symbol(&library, "async_fib")?,
                call_threadsafe_function: symbol(&library, "call_threadsafe_function")?,
                path: path.to_path_buf(),
                library: Arc::new(library),
            }
        };
        trace!("Loaded native module {:?}", path);
        Ok(binding)
    }

    /// The file the module was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `a + b`
    pub fn sum(&self, a: i32, b: i32) -> i32 {
        // SAFETY: Integer arguments only.
        unsafe { (self.sum)(a, b) }
    }

    /// `a - b`
    pub fn sub(&self, a: i32, b: i32) -> i32 {
        // SAFETY: Integer arguments only.
        unsafe { (self.sub)(a, b) }
    }

    /// Concatenate two strings.
    pub fn concat_str(&self, a: &str, b: &str) -> Result<String, BindingError> {
        let a = CString::new(a)?;
        let b = CString::new(b)?;
        // SAFETY: NULL output with zero length only queries the length.
        let len = unsafe { (self.concat_str)(a.as_ptr(), b.as_ptr(), std::ptr::null_mut(), 0) };
        let mut buf = vec![0_u8; len + 1];
        // SAFETY: `buf` is valid for `buf.len()` bytes.
        let written = unsafe {
            (self.concat_str)(a.as_ptr(), b.as_ptr(), buf.as_mut_ptr().cast(), buf.len())
        };
        buf.truncate(written.min(len));
        Ok(String::from_utf8(buf)?)
    }

    /// Pass options through the native module.
    pub fn get_options(&self, options: &ToolOptions) -> Result<ToolOptions, BindingError> {
        let name = CString::new(options.name.as_str())?;
        let input = RawToolOptions {
            id: options.id,
            name: name.as_ptr(),
        };
        let mut output = RawToolOptions {
            id: 0,
            name: std::ptr::null(),
        };
        // SAFETY: Both pointers are valid for the duration of the call.
        unsafe { (self.get_options)(&input, &mut output) };
        if output.name.is_null() {
            return Err(BindingError::NullString);
        }
        // SAFETY: The name is either borrowed from `input` that is still alive
        // or points to the module's static data.
        let name = unsafe { CStr::from_ptr(output.name) }.to_bytes().to_vec();
        Ok(ToolOptions {
            id: output.id,
            name: String::from_utf8(name)?,
        })
    }

    /// Compute `n`-th Fibonacci number in a separate thread.
    ///
    /// The module stays loaded until the thread finishes.
    pub fn async_fib(&self, n: u32, use_cache: bool) -> JoinHandle<u64> {
        let library = Arc::clone(&self.library);
        let async_fib = self.async_fib;
        std::thread::spawn(move || {
            let _library = library;
            // SAFETY: Integer arguments only, `_library` keeps the function loaded.
            unsafe { async_fib(n, use_cache) }
        })
    }

    /// Let the native module invoke `callback`, possibly from multiple threads.
    pub fn call_threadsafe_function<F>(&self, callback: F)
    where
        F: Fn(u32) + Sync,
    {
        unsafe extern "C" fn trampoline<F: Fn(u32) + Sync>(data: *mut c_void, value: u32) {
            // SAFETY: `data` points to `callback` that outlives the native call.
            let callback = unsafe { &*(data as *const F) };
            callback(value);
        }
        let data = &callback as *const F as *mut c_void;
        // SAFETY: The module returns only after the last invocation of the callback.
        unsafe { (self.call_threadsafe_function)(trampoline::<F>, data) };
    }
}

impl Debug for NativeBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBinding")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// # Safety
///
/// `T` has to match the actual type of the symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, LoadError> {
    // SAFETY: Guaranteed by the caller.
    let symbol = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|e| LoadError::MissingSymbol(name, e))?;
    Ok(*symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn open_missing_file() {
        let result = NativeBinding::open("/does/not/exist/sunny.linux-x64-gnu.node");
        assert!(matches!(result, Err(LoadError::Library(..))), "{result:?}");
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn open_library_without_operations() {
        let result = NativeBinding::open("libm.so.6");
        assert!(
            matches!(result, Err(LoadError::MissingSymbol("sum", ..))),
            "{result:?}"
        );
    }

    #[test]
    fn open_corrupt_file() {
        let mut file = NamedTempFile::with_suffix(".node").unwrap();
        file.write_all(b"definitely not a shared library").unwrap();
        file.flush().unwrap();
        let result = NativeBinding::open(file.path());
        assert!(matches!(result, Err(LoadError::Library(..))), "{result:?}");
    }
}
