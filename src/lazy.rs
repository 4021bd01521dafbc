use std::sync::OnceLock;

use crate::Error;
use crate::NativeBinding;
use crate::Resolver;

/// Process-wide native module that is resolved on first access.
///
/// ```rust,no_run
/// use native_binding::LazyBinding;
/// use native_binding::NativeBinding;
///
/// static SUNNY: LazyBinding = LazyBinding::new(|| NativeBinding::resolve("sunny"));
///
/// let sunny = SUNNY.get().expect("Failed to load native binding");
/// assert_eq!(3, sunny.sum(1, 2));
/// ```
///
/// Resolution runs at most once, its outcome (the module or the error) is cached.
pub struct LazyBinding<M = NativeBinding> {
    init: fn() -> Result<M, Error>,
    module: OnceLock<Result<M, Error>>,
}

impl<M> LazyBinding<M> {
    /// Create uninitialized binding that calls `init` on first access.
    pub const fn new(init: fn() -> Result<M, Error>) -> Self {
        Self {
            init,
            module: OnceLock::new(),
        }
    }

    /// Get the module, resolving it if necessary.
    ///
    /// Concurrent callers block until the first one finishes the resolution.
    pub fn get(&self) -> Result<&M, &Error> {
        self.module.get_or_init(self.init).as_ref()
    }

    /// Returns `true` if resolution has already run.
    pub fn is_resolved(&self) -> bool {
        self.module.get().is_some()
    }
}

impl NativeBinding {
    /// Resolve `product` with default options.
    ///
    /// Local files are searched for next to the current executable.
    pub fn resolve(product: &str) -> Result<Self, Error> {
        Resolver::options(product).new_resolver().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    #[test]
    fn resolves_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        static MODULE: LazyBinding<u32> = LazyBinding::new(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        });
        assert!(!MODULE.is_resolved());
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert_eq!(Ok(&42), MODULE.get().map_err(|e| e.to_string())));
            }
        });
        assert!(MODULE.is_resolved());
        assert_eq!(1, CALLS.load(Ordering::SeqCst));
    }

    #[test]
    fn error_is_cached() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        static MODULE: LazyBinding<u32> = LazyBinding::new(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Err(Error::NotFound)
        });
        assert!(matches!(MODULE.get(), Err(Error::NotFound)));
        assert!(matches!(MODULE.get(), Err(Error::NotFound)));
        assert_eq!(1, CALLS.load(Ordering::SeqCst));
    }

    #[test]
    fn unsupported_host_binding_fails() {
        static MODULE: LazyBinding = LazyBinding::new(|| {
            Resolver::options("sunny")
                .platform("solaris", "sparc")
                .new_resolver()
                .resolve()
        });
        match MODULE.get() {
            Err(Error::UnsupportedPlatform { os, arch }) => {
                assert_eq!("solaris", os);
                assert_eq!("sparc", arch);
            }
            other => panic!("Unexpected {other:?}"),
        }
    }
}
