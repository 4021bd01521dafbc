use std::path::PathBuf;

/// Terminal resolution error.
///
/// Exactly one of these is surfaced when no candidate could be loaded.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The OS/architecture/libc combination is not in the support matrix.
    #[error("Unsupported platform: OS {os}, architecture {arch}")]
    UnsupportedPlatform {
        /// OS identifier as reported by the host.
        os: String,
        /// Architecture identifier as reported by the host.
        arch: String,
    },
    /// The local file existed but failed to load.
    #[error("Failed to load {path:?}: {cause}")]
    LocalLoadFailed {
        /// Local file.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        cause: LoadError,
    },
    /// The distribution package is missing or failed to load.
    #[error("Failed to load package {package:?}: {cause}")]
    PackageLoadFailed {
        /// Package name.
        package: String,
        /// Underlying cause.
        #[source]
        cause: LoadError,
    },
    /// No candidate succeeded and no cause was recorded.
    #[error("Failed to load native binding")]
    NotFound,
}

impl Error {
    /// Underlying load error if any.
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            Self::LocalLoadFailed { cause, .. } | Self::PackageLoadFailed { cause, .. } => {
                Some(cause)
            }
            Self::UnsupportedPlatform { .. } | Self::NotFound => None,
        }
    }
}

/// Why a single load attempt failed.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum LoadError {
    #[error("Dynamic loader error: {0}")]
    Library(#[from] libloading::Error),
    #[error("Symbol {0:?} not found: {1}")]
    MissingSymbol(&'static str, #[source] libloading::Error),
    #[error("Package is not installed, searched {0:?}")]
    NotInstalled(Vec<PathBuf>),
    #[error("Input/output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Native operation error.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum BindingError {
    #[error("String contains NUL byte: {0}")]
    Nul(#[from] std::ffi::NulError),
    #[error("Native module returned invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Native module returned NULL string")]
    NullString,
}
