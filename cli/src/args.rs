use std::env::split_paths;
use std::ffi::OsString;
use std::path::PathBuf;

use native_binding::Resolver;
use native_binding::ResolverOptions;

#[derive(clap::Args)]
pub struct ResolverArgs {
    /// Product name, i.e. the common prefix of file and package names.
    #[clap(short = 'p', long = "product", value_name = "NAME")]
    product: String,

    /// Directory with local files.
    #[clap(short = 'd', long = "dir", value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// Override package directories.
    ///
    /// By default `node_modules` in DIR and all of its parents are searched.
    #[clap(short = 'P', long = "package-dirs", value_name = "DIR1:DIR2:...")]
    package_dirs: Option<OsString>,

    /// File name extension of native modules.
    #[clap(
        short = 'e',
        long = "extension",
        value_name = "EXT",
        default_value = "node"
    )]
    extension: String,

    /// Override operating system, e.g. `linux` or `darwin`.
    #[clap(long = "os", value_name = "OS")]
    os: Option<String>,

    /// Override architecture, e.g. `x64` or `aarch64`.
    #[clap(long = "arch", value_name = "ARCH")]
    arch: Option<String>,

    /// Override libc detection.
    #[clap(short = 'l', long = "libc", value_name = "LIBC")]
    libc: Option<Libc>,
}

impl ResolverArgs {
    pub fn options(self) -> ResolverOptions {
        let mut options = Resolver::options(self.product)
            .extension(self.extension)
            .base_dir(Some(self.dir))
            .package_dirs(self.package_dirs.map(|dirs| split_paths(&dirs).collect()))
            .libc(self.libc.map(Into::into));
        if self.os.is_some() || self.arch.is_some() {
            options = options.platform(
                self.os.as_deref().unwrap_or(native_binding::HOST_OS),
                self.arch.as_deref().unwrap_or(native_binding::HOST_ARCH),
            );
        }
        options
    }

    pub fn new_resolver(self) -> Resolver {
        self.options().new_resolver()
    }
}

#[derive(clap::ValueEnum, Clone, Copy)]
pub enum Libc {
    Glibc,
    Musl,
}

impl From<Libc> for native_binding::Libc {
    fn from(other: Libc) -> Self {
        match other {
            Libc::Glibc => Self::Glibc,
            Libc::Musl => Self::Musl,
        }
    }
}
