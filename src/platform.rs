//! Host parameters (OS, architecture, libc).

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::libc::LibcClassifier;
use crate::libc::SystemLibc;
use crate::requires_libc;
use crate::Error;

/// Host OS as reported by the Rust standard library.
pub const HOST_OS: &str = std::env::consts::OS;

/// Host architecture as reported by the Rust standard library.
pub const HOST_ARCH: &str = std::env::consts::ARCH;

macro_rules! define_platform_enum {
    {
        $doc: literal,
        $enum: ident,
        $kind: literal,
        $(($name: ident, $str: literal, [$($alias: literal),*], $doc1: literal),)*
    } => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(test, derive(arbitrary::Arbitrary))]
        #[doc = $doc]
        pub enum $enum {
            $(
                #[doc = $doc1]
                $name,
            )*
        }

        impl $enum {
            /// All known values.
            pub const ALL: &'static [Self] = &[$(Self::$name,)*];

            /// Name as used in file and package names.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$name => $str, )*
                }
            }

            /// Parse either the Rust or the file/package name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $str $(| $alias)* => Some(Self::$name), )*
                    _ => None,
                }
            }
        }

        impl Display for $enum {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $enum {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| UnknownName($kind, s.into()))
            }
        }
    };
}

define_platform_enum! {
    "Operating system.",
    Os,
    "operating system",
    (Android, "android", [], "Android."),
    (Windows, "win32", ["windows"], "Windows."),
    (MacOs, "darwin", ["macos"], "macOS."),
    (FreeBsd, "freebsd", [], "FreeBSD."),
    (Linux, "linux", [], "Linux."),
}

define_platform_enum! {
    "CPU architecture.",
    Arch,
    "architecture",
    (X64, "x64", ["x86_64", "amd64"], "64-bit x86."),
    (Ia32, "ia32", ["x86", "i386", "i686"], "32-bit x86."),
    (Arm64, "arm64", ["aarch64"], "64-bit ARM."),
    (Arm, "arm", ["armv7"], "32-bit ARM."),
    (Riscv64, "riscv64", [], "64-bit RISC-V."),
    (S390x, "s390x", [], "IBM Z."),
}

define_platform_enum! {
    "C library implementation.",
    Libc,
    "libc",
    (Glibc, "gnu", ["glibc"], "GNU libc and compatible implementations."),
    (Musl, "musl", [], "musl libc."),
}

/// Unknown OS, architecture or libc name.
#[derive(thiserror::Error, Debug)]
#[error("Unknown {0}: {1:?}")]
pub struct UnknownName(&'static str, String);

/// Which native binary variant a process requires.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PlatformKey {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
    /// C library.
    ///
    /// Present only when the support matrix distinguishes libc variants for `os` and `arch`.
    pub libc: Option<Libc>,
}

impl PlatformKey {
    /// Classify the platform from the OS and architecture identifiers.
    ///
    /// The `classifier` is consulted only when the architecture has separate glibc and musl
    /// binaries.
    pub fn classify<C: LibcClassifier + ?Sized>(
        os: &str,
        arch: &str,
        classifier: &C,
    ) -> Result<Self, Error> {
        let (Some(os_id), Some(arch_id)) = (Os::from_name(os), Arch::from_name(arch)) else {
            return Err(Error::UnsupportedPlatform {
                os: os.into(),
                arch: arch.into(),
            });
        };
        let libc = if requires_libc(os_id, arch_id) {
            Some(classifier.libc())
        } else {
            None
        };
        Ok(Self {
            os: os_id,
            arch: arch_id,
            libc,
        })
    }

    /// Platform of the current process.
    ///
    /// Computed once, subsequent calls return the cached value.
    pub fn current() -> Result<&'static Self, &'static Error> {
        static CURRENT: OnceLock<Result<PlatformKey, Error>> = OnceLock::new();
        CURRENT
            .get_or_init(|| Self::classify(HOST_OS, HOST_ARCH, &SystemLibc))
            .as_ref()
    }
}

impl Display for PlatformKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)?;
        if let Some(libc) = self.libc {
            write!(f, "-{libc}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arbtest::arbtest;

    #[test]
    fn names_round_trip() {
        arbtest(|u| {
            let os: Os = u.arbitrary()?;
            let arch: Arch = u.arbitrary()?;
            let libc: Libc = u.arbitrary()?;
            assert_eq!(Some(os), Os::from_name(os.as_str()));
            assert_eq!(Some(arch), Arch::from_name(&arch.to_string()));
            assert_eq!(Some(libc), libc.as_str().parse().ok());
            Ok(())
        });
    }

    #[test]
    fn rust_names() {
        assert_eq!(Some(Os::MacOs), Os::from_name("macos"));
        assert_eq!(Some(Os::Windows), Os::from_name("windows"));
        assert_eq!(Some(Arch::X64), Arch::from_name("x86_64"));
        assert_eq!(Some(Arch::Ia32), Arch::from_name("x86"));
        assert_eq!(Some(Arch::Arm64), Arch::from_name("aarch64"));
        assert_eq!(None, Os::from_name("solaris"));
        assert_eq!(None, Arch::from_name("sparc"));
    }

    #[test]
    fn host_is_recognized() {
        // CI runs on supported hosts only.
        let key = PlatformKey::current().unwrap();
        assert_eq!(Some(key.os), Os::from_name(HOST_OS));
        assert_eq!(Some(key.arch), Arch::from_name(HOST_ARCH));
        assert_eq!(requires_libc(key.os, key.arch), key.libc.is_some());
    }

    #[test]
    fn classify_asks_for_libc_only_when_needed() {
        let key = PlatformKey::classify("linux", "x86_64", &Libc::Musl).unwrap();
        assert_eq!(Some(Libc::Musl), key.libc);
        assert_eq!("linux-x64-musl", key.to_string());
        let key = PlatformKey::classify("linux", "s390x", &Libc::Musl).unwrap();
        assert_eq!(None, key.libc);
        let key = PlatformKey::classify("macos", "aarch64", &Libc::Musl).unwrap();
        assert_eq!(None, key.libc);
        assert_eq!("darwin-arm64", key.to_string());
    }

    #[test]
    fn classify_unknown() {
        match PlatformKey::classify("solaris", "sparc", &Libc::Glibc) {
            Err(Error::UnsupportedPlatform { os, arch }) => {
                assert_eq!("solaris", os);
                assert_eq!("sparc", arch);
            }
            other => panic!("Unexpected {other:?}"),
        }
    }
}
