use crate::Arch;
use crate::Libc;
use crate::Os;
use crate::PlatformKey;

/// Support matrix entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Target {
    /// Operating system.
    pub os: Os,
    /// Architecture or `None` for universal binaries.
    pub arch: Option<Arch>,
    /// C library or `None` if the architecture has only one variant.
    pub libc: Option<Libc>,
    /// File and package name suffix, e.g. `linux-x64-gnu`.
    pub suffix: &'static str,
}

const fn target(os: Os, arch: Option<Arch>, libc: Option<Libc>, suffix: &'static str) -> Target {
    Target {
        os,
        arch,
        libc,
        suffix,
    }
}

/// Supported platforms.
///
/// Universal binaries (no architecture) are tried before the architecture-specific ones.
pub const SUPPORT_MATRIX: &[Target] = &TARGETS;

const TARGETS: [Target; 18] = {
    use Arch::*;
    use Libc::*;
    use Os::*;
    [
        target(Android, Some(Arm64), None, "android-arm64"),
        target(Android, Some(Arm), None, "android-arm-eabi"),
        target(Windows, Some(X64), None, "win32-x64-msvc"),
        target(Windows, Some(Ia32), None, "win32-ia32-msvc"),
        target(Windows, Some(Arm64), None, "win32-arm64-msvc"),
        target(MacOs, None, None, "darwin-universal"),
        target(MacOs, Some(X64), None, "darwin-x64"),
        target(MacOs, Some(Arm64), None, "darwin-arm64"),
        target(FreeBsd, Some(X64), None, "freebsd-x64"),
        target(Linux, Some(X64), Some(Glibc), "linux-x64-gnu"),
        target(Linux, Some(X64), Some(Musl), "linux-x64-musl"),
        target(Linux, Some(Arm64), Some(Glibc), "linux-arm64-gnu"),
        target(Linux, Some(Arm64), Some(Musl), "linux-arm64-musl"),
        target(Linux, Some(Arm), Some(Glibc), "linux-arm-gnueabihf"),
        target(Linux, Some(Arm), Some(Musl), "linux-arm-musleabihf"),
        target(Linux, Some(Riscv64), Some(Glibc), "linux-riscv64-gnu"),
        target(Linux, Some(Riscv64), Some(Musl), "linux-riscv64-musl"),
        target(Linux, Some(S390x), None, "linux-s390x-gnu"),
    ]
};

/// Returns `true` if `arch` has separate glibc and musl binaries on `os`.
pub fn requires_libc(os: Os, arch: Arch) -> bool {
    SUPPORT_MATRIX
        .iter()
        .any(|t| t.os == os && t.arch == Some(arch) && t.libc.is_some())
}

/// Get the targets to try for `key` in order.
///
/// Returns `None` if the platform is not supported.
pub fn targets(key: &PlatformKey) -> Option<Vec<Target>> {
    let target = SUPPORT_MATRIX
        .iter()
        .find(|t| t.os == key.os && t.arch == Some(key.arch) && t.libc == key.libc)?;
    let mut targets: Vec<Target> = SUPPORT_MATRIX
        .iter()
        .filter(|t| t.os == key.os && t.arch.is_none())
        .copied()
        .collect();
    targets.push(*target);
    Some(targets)
}

/// Local file and package that provide the binary for one target.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CandidateSpec {
    /// File name in the base directory, e.g. `sunny.linux-x64-gnu.node`.
    pub local_file_name: String,
    /// Distribution package name, e.g. `sunny-linux-x64-gnu`.
    pub package_name: String,
    /// The target.
    pub target: Target,
}

impl CandidateSpec {
    /// Name local file and package for `product` and `target`.
    pub fn new(product: &str, extension: &str, target: Target) -> Self {
        let suffix = target.suffix;
        Self {
            local_file_name: format!("{product}.{suffix}.{extension}"),
            package_name: format!("{product}-{suffix}"),
            target,
        }
    }
}
