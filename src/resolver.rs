use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::log_enabled;
use log::trace;
use log::warn;
use log::Level::Trace;

use crate::fs;
use crate::libc::LibcClassifier;
use crate::libc::SystemLibc;
use crate::targets;
use crate::CandidateSpec;
use crate::Error;
use crate::LibraryLoader;
use crate::Libc;
use crate::LoadError;
use crate::Loader;
use crate::PlatformKey;
use crate::HOST_ARCH;
use crate::HOST_OS;

/// Resolver options.
pub struct ResolverOptions {
    product: String,
    extension: String,
    base_dir: Option<PathBuf>,
    package_dirs: Option<Vec<PathBuf>>,
    os: String,
    arch: String,
    libc: Option<Libc>,
}

impl ResolverOptions {
    /// Default options for `product`.
    ///
    /// The product name is the common prefix of local file names and package names.
    pub fn new<S: Into<String>>(product: S) -> Self {
        Self {
            product: product.into(),
            extension: "node".into(),
            base_dir: None,
            package_dirs: None,
            os: HOST_OS.into(),
            arch: HOST_ARCH.into(),
            libc: None,
        }
    }

    /// Set file name extension of the native modules (without the dot).
    ///
    /// The default is `node`.
    pub fn extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set directory where local files are searched for.
    ///
    /// When not set the directory of the current executable is used.
    pub fn base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Directories where packages are installed.
    ///
    /// When not set `node_modules` in the base directory and all of its ancestors are searched,
    /// nearest first.
    pub fn package_dirs(mut self, package_dirs: Option<Vec<PathBuf>>) -> Self {
        self.package_dirs = package_dirs;
        self
    }

    /// Override OS and architecture identifiers.
    ///
    /// Both Rust (`macos`, `x86_64`) and package (`darwin`, `x64`) names are accepted.
    pub fn platform<S1: Into<String>, S2: Into<String>>(mut self, os: S1, arch: S2) -> Self {
        self.os = os.into();
        self.arch = arch.into();
        self
    }

    /// Override libc detection.
    pub fn libc(mut self, libc: Option<Libc>) -> Self {
        self.libc = libc;
        self
    }

    /// Create new resolver that uses the system dynamic loader.
    pub fn new_resolver(self) -> Resolver {
        self.new_resolver_with(LibraryLoader, SystemLibc)
    }

    /// Create new resolver with custom loader and libc classifier.
    pub fn new_resolver_with<L, C>(self, loader: L, classifier: C) -> Resolver<L, C>
    where
        L: Loader,
        C: LibcClassifier,
    {
        let base_dir = self.base_dir.unwrap_or_else(current_exe_dir);
        let package_dirs = self.package_dirs.unwrap_or_else(|| {
            base_dir
                .ancestors()
                .map(|dir| dir.join("node_modules"))
                .collect()
        });
        if log_enabled!(Trace) {
            for dir in package_dirs.iter() {
                trace!("Package directory {:?}", dir);
            }
        }
        Resolver {
            product: self.product,
            extension: self.extension,
            base_dir,
            package_dirs,
            os: self.os,
            arch: self.arch,
            libc: self.libc,
            loader,
            classifier,
        }
    }
}

/// Where the module was loaded from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tier {
    /// File next to the resolver.
    Local,
    /// Distribution package.
    Package,
}

/// Outcome of loading one candidate.
#[derive(Debug)]
pub struct LoadAttempt<M> {
    /// Which tier was selected.
    pub tier: Tier,
    /// Loaded module or the error.
    pub outcome: Result<M, Error>,
}

/// Native module resolver.
///
/// Picks the binary for the current OS, architecture and libc and loads it either from a local
/// file or from the distribution package.
pub struct Resolver<L = LibraryLoader, C = SystemLibc> {
    product: String,
    extension: String,
    base_dir: PathBuf,
    package_dirs: Vec<PathBuf>,
    os: String,
    arch: String,
    libc: Option<Libc>,
    loader: L,
    classifier: C,
}

impl Resolver {
    /// Get default resolver options.
    pub fn options<S: Into<String>>(product: S) -> ResolverOptions {
        ResolverOptions::new(product)
    }
}

impl<L: Loader, C: LibcClassifier> Resolver<L, C> {
    /// Directory where local files are searched for.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directories where packages are searched for.
    pub fn package_dirs(&self) -> &[PathBuf] {
        &self.package_dirs
    }

    /// Classify the platform.
    ///
    /// Libc is detected only if the architecture has separate glibc and musl binaries.
    pub fn platform_key(&self) -> Result<PlatformKey, Error> {
        match self.libc {
            Some(libc) => PlatformKey::classify(&self.os, &self.arch, &libc),
            None => PlatformKey::classify(&self.os, &self.arch, &self.classifier),
        }
    }

    /// Get candidates in the order they are tried.
    ///
    /// Does not access the file system.
    pub fn candidates(&self) -> Result<Vec<CandidateSpec>, Error> {
        let key = self.platform_key()?;
        let Some(targets) = targets(&key) else {
            return Err(Error::UnsupportedPlatform {
                os: self.os.clone(),
                arch: self.arch.clone(),
            });
        };
        Ok(targets
            .into_iter()
            .map(|target| CandidateSpec::new(&self.product, &self.extension, target))
            .collect())
    }

    /// Load the first candidate that succeeds.
    ///
    /// When all candidates fail the error of the last one is returned.
    pub fn resolve(&self) -> Result<L::Module, Error> {
        self.resolve_inspect(|_, _| {})
    }

    /// Same as [`resolve`](Self::resolve) but calls `inspect` after every attempt.
    pub fn resolve_inspect<F>(&self, mut inspect: F) -> Result<L::Module, Error>
    where
        F: FnMut(&CandidateSpec, &LoadAttempt<L::Module>),
    {
        let candidates = self.candidates()?;
        let mut last_error = None;
        for candidate in candidates.iter() {
            let attempt = self.attempt(candidate);
            inspect(candidate, &attempt);
            match attempt.outcome {
                Ok(module) => {
                    debug!(
                        "Loaded {:?} from {:?} tier",
                        candidate.package_name, attempt.tier
                    );
                    return Ok(module);
                }
                Err(e) => {
                    debug!("Failed to load {:?}: {e}", candidate.package_name);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(Error::NotFound))
    }

    /// Load `candidate`.
    ///
    /// If the local file exists, it is loaded, otherwise the package is loaded.
    /// Failure to load the local file never falls back to the package.
    pub fn attempt(&self, candidate: &CandidateSpec) -> LoadAttempt<L::Module> {
        let path = self.base_dir.join(&candidate.local_file_name);
        if file_exists(&path) {
            trace!("Loading local file {:?}", path);
            let outcome = self
                .loader
                .load(&path)
                .map_err(|cause| Error::LocalLoadFailed { path, cause });
            return LoadAttempt {
                tier: Tier::Local,
                outcome,
            };
        }
        let outcome = match self.find_package(candidate) {
            Some(path) => {
                trace!("Loading package file {:?}", path);
                self.loader.load(&path)
            }
            None => Err(LoadError::NotInstalled(self.package_dirs.clone())),
        }
        .map_err(|cause| Error::PackageLoadFailed {
            package: candidate.package_name.clone(),
            cause,
        });
        LoadAttempt {
            tier: Tier::Package,
            outcome,
        }
    }

    /// Find the module file of the candidate's package.
    ///
    /// The first package directory that contains the package wins.
    pub fn find_package(&self, candidate: &CandidateSpec) -> Option<PathBuf> {
        self.package_dirs
            .iter()
            .map(|dir| {
                dir.join(&candidate.package_name)
                    .join(&candidate.local_file_name)
            })
            .find(|path| file_exists(path))
    }
}

fn file_exists(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(ref e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to access {path:?}: {e}");
            false
        }
    }
}

fn current_exe_dir() -> PathBuf {
    match std::env::current_exe() {
        Ok(path) => match path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => path,
        },
        Err(e) => {
            warn!("Failed to get current executable, using current directory: {e}");
            PathBuf::from(".")
        }
    }
}
