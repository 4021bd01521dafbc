use std::io::Error as IoError;
use std::io::ErrorKind;
use std::process::Command;
use std::process::Stdio;
use std::sync::OnceLock;

use log::trace;
use log::warn;

use crate::fs;
use crate::Libc;

/// Decides which C library the process is linked against.
pub trait LibcClassifier {
    /// C library of the current process.
    fn libc(&self) -> Libc;

    /// Returns `true` if the process is linked against musl.
    fn is_musl(&self) -> bool {
        self.libc() == Libc::Musl
    }
}

/// Fixed answer, i.e. no detection.
impl LibcClassifier for Libc {
    fn libc(&self) -> Libc {
        *self
    }
}

impl<T: LibcClassifier + ?Sized> LibcClassifier for &T {
    fn libc(&self) -> Libc {
        (**self).libc()
    }
}

/// Inspects the running process.
///
/// The result is computed once per process.
#[derive(Clone, Copy, Default, Debug)]
pub struct SystemLibc;

impl LibcClassifier for SystemLibc {
    fn libc(&self) -> Libc {
        static LIBC: OnceLock<Libc> = OnceLock::new();
        *LIBC.get_or_init(|| {
            let libc = classify(RuntimeReport::current().as_ref(), read_ldd);
            trace!("Detected libc {libc}");
            libc
        })
    }
}

/// Runtime diagnostic report.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RuntimeReport {
    /// GNU libc version of the running process.
    ///
    /// musl never populates this field.
    pub glibc_version_runtime: Option<String>,
}

impl RuntimeReport {
    /// Generate the report for the current process.
    ///
    /// On Unix the report is always available: `gnu_get_libc_version` is looked up in the process
    /// image, and if it is absent (musl, statically linked glibc) the version is `None`.
    /// Hence [`read_ldd`] is never consulted on Unix hosts.
    #[cfg(unix)]
    pub fn current() -> Option<Self> {
        use std::ffi::c_char;
        use std::ffi::CStr;

        type GnuGetLibcVersion = unsafe extern "C" fn() -> *const c_char;

        let this = libloading::os::unix::Library::this();
        // SAFETY: `gnu_get_libc_version` has this signature in every glibc release.
        let symbol = unsafe { this.get::<GnuGetLibcVersion>(b"gnu_get_libc_version\0") };
        let get_version = match symbol {
            Ok(symbol) => *symbol,
            Err(_) => return Some(Self::default()),
        };
        // SAFETY: The function returns a pointer to a static NUL-terminated string.
        let version = unsafe {
            let ptr = get_version();
            if ptr.is_null() {
                None
            } else {
                Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
            }
        };
        Some(Self {
            glibc_version_runtime: version,
        })
    }

    /// Generate the report for the current process.
    ///
    /// Returns `None` if the report is not available on this host.
    #[cfg(not(unix))]
    pub fn current() -> Option<Self> {
        None
    }
}

/// Classify the C library.
///
/// When the `report` is available, missing glibc version means musl.
/// Otherwise the contents of `ldd` returned by `probe` are searched for `musl` substring.
/// The `probe` is called only when the report is unavailable,
/// so [`SystemLibc`] never calls it on Unix (see [`RuntimeReport::current`]).
/// A statically linked glibc process has no `gnu_get_libc_version` in its image
/// and is classified as musl.
///
/// If the probe fails the library is assumed to be musl.
/// This errs on the side of the more restrictive binary and
/// may misclassify glibc systems that do not have `ldd` in `PATH`.
pub fn classify<F>(report: Option<&RuntimeReport>, probe: F) -> Libc
where
    F: FnOnce() -> Result<String, IoError>,
{
    if let Some(report) = report {
        return match report.glibc_version_runtime.as_deref() {
            Some(version) => {
                trace!("Found glibc {version} in runtime report");
                Libc::Glibc
            }
            None => Libc::Musl,
        };
    }
    match probe() {
        Ok(contents) if contents.contains("musl") => Libc::Musl,
        Ok(_) => Libc::Glibc,
        Err(e) => {
            warn!("Failed to inspect `ldd`, assuming musl: {e}");
            Libc::Musl
        }
    }
}

/// Find `ldd` via `which` and read its contents.
///
/// `ldd` is a shell script on glibc systems and an ELF file on musl systems,
/// hence invalid UTF-8 is replaced.
pub fn read_ldd() -> Result<String, IoError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg("which ldd")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(IoError::new(
            ErrorKind::NotFound,
            format!("`which ldd` failed: {}", output.status),
        ));
    }
    let path = String::from_utf8_lossy(&output.stdout);
    let path = path.trim();
    if path.is_empty() {
        return Err(ErrorKind::NotFound.into());
    }
    trace!("Found `ldd` at {path:?}");
    let contents = fs::read(path)?;
    Ok(String::from_utf8_lossy(&contents).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(version: Option<&str>) -> RuntimeReport {
        RuntimeReport {
            glibc_version_runtime: version.map(Into::into),
        }
    }

    fn unreachable_probe() -> Result<String, IoError> {
        panic!("Probe should not be called when the report is available");
    }

    #[test]
    fn report_without_glibc_version_is_musl() {
        let libc = classify(Some(&report(None)), unreachable_probe);
        assert_eq!(Libc::Musl, libc);
        assert!(libc.is_musl());
        assert!(!Libc::Glibc.is_musl());
    }

    #[test]
    fn report_with_glibc_version_is_glibc() {
        assert_eq!(
            Libc::Glibc,
            classify(Some(&report(Some("2.39"))), unreachable_probe)
        );
    }

    #[test]
    fn ldd_contents() {
        assert_eq!(
            Libc::Musl,
            classify(None, || Ok("\x7fELF...musl libc (x86_64)...".into()))
        );
        assert_eq!(
            Libc::Glibc,
            classify(None, || Ok("#!/bin/bash\n# ldd for GNU C Library\n".into()))
        );
    }

    #[test]
    fn probe_failure_is_musl() {
        assert_eq!(
            Libc::Musl,
            classify(None, || Err(ErrorKind::NotFound.into()))
        );
        assert_eq!(
            Libc::Musl,
            classify(None, || Err(ErrorKind::PermissionDenied.into()))
        );
    }

    #[test]
    fn system_libc_is_stable() {
        let _ = env_logger::try_init();
        let first = SystemLibc.libc();
        assert_eq!(first, SystemLibc.libc());
        assert_eq!(first == Libc::Musl, SystemLibc.is_musl());
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        assert_eq!(Libc::Glibc, first);
        #[cfg(all(target_os = "linux", target_env = "musl"))]
        assert_eq!(Libc::Musl, first);
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn report_on_glibc_host() {
        let report = RuntimeReport::current().unwrap();
        assert!(report.glibc_version_runtime.is_some());
    }
}
