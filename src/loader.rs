use std::path::Path;

use crate::LoadError;
use crate::NativeBinding;

/// Loads a native module from a file.
pub trait Loader {
    /// Loaded module.
    type Module;

    /// Load the module from `path`.
    fn load(&self, path: &Path) -> Result<Self::Module, LoadError>;
}

impl<L: Loader + ?Sized> Loader for &L {
    type Module = L::Module;

    fn load(&self, path: &Path) -> Result<Self::Module, LoadError> {
        (**self).load(path)
    }
}

/// Loads shared libraries via the system dynamic loader.
#[derive(Clone, Copy, Default, Debug)]
pub struct LibraryLoader;

impl Loader for LibraryLoader {
    type Module = NativeBinding;

    fn load(&self, path: &Path) -> Result<Self::Module, LoadError> {
        NativeBinding::open(path)
    }
}
