#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::env::consts::DLL_PREFIX;
use std::env::consts::DLL_SUFFIX;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use fs_err::copy;
use fs_err::create_dir_all;
use tempfile::TempDir;

use native_binding::BindingError;
use native_binding::Error;
use native_binding::NativeBinding;
use native_binding::Resolver;
use native_binding::ResolverOptions;
use native_binding::ToolOptions;

#[test]
fn resolve_local_file_and_call_every_operation() {
    let workdir = Workdir::new();
    let resolver = workdir.options().new_resolver();
    let Some(file_name) = host_file_name(&workdir) else {
        return;
    };
    let local = workdir.path().join(file_name);
    copy(fixture_library(), &local).unwrap();
    let binding = resolver.resolve().unwrap();
    assert_eq!(local, binding.path());

    assert_eq!(3, binding.sum(1, 2));
    assert_eq!(i32::MIN, binding.sum(i32::MAX, 1));
    assert_eq!(-2, binding.sub(5, 7));

    assert_eq!("foobar", binding.concat_str("foo", "bar").unwrap());
    assert_eq!("", binding.concat_str("", "").unwrap());
    assert_eq!("héllo wörld", binding.concat_str("héllo ", "wörld").unwrap());
    assert!(matches!(
        binding.concat_str("a\0b", ""),
        Err(BindingError::Nul(..))
    ));

    let options = ToolOptions {
        id: 42,
        name: "sunny".into(),
    };
    assert_eq!(options, binding.get_options(&options).unwrap());

    let values = Mutex::new(Vec::new());
    binding.call_threadsafe_function(|value| values.lock().unwrap().push(value));
    let mut values = values.into_inner().unwrap();
    values.sort_unstable();
    assert_eq!(vec![0, 1, 2], values);

    assert_eq!(55, binding.async_fib(10, false).join().unwrap());
    assert_eq!(0, binding.async_fib(0, true).join().unwrap());
    let fib = binding.async_fib(90, true);
    drop(binding);
    assert_eq!(2_880_067_194_370_816_120, fib.join().unwrap());
}

#[test]
fn resolve_package() {
    let workdir = Workdir::new();
    let resolver = workdir.options().new_resolver();
    let Ok(candidates) = resolver.candidates() else {
        return;
    };
    let candidate = candidates.last().unwrap();
    let package_dir = workdir.package_dir().join(&candidate.package_name);
    create_dir_all(&package_dir).unwrap();
    let file = package_dir.join(&candidate.local_file_name);
    copy(fixture_library(), &file).unwrap();
    let binding = resolver.resolve().unwrap();
    assert_eq!(file, binding.path());
    assert_eq!(3, binding.sum(1, 2));
}

#[test]
fn corrupt_local_file() {
    let workdir = Workdir::new();
    let Some(file_name) = host_file_name(&workdir) else {
        return;
    };
    let local = workdir.path().join(file_name);
    fs_err::write(&local, b"not a shared library").unwrap();
    match workdir.options().new_resolver().resolve() {
        Err(Error::LocalLoadFailed { path, .. }) => assert_eq!(local, path),
        other => panic!("Unexpected {other:?}"),
    }
}

/// Local file name of the architecture-specific candidate for the host.
///
/// Returns `None` if the host is not supported.
fn host_file_name(workdir: &Workdir) -> Option<String> {
    match workdir.options().new_resolver().candidates() {
        Ok(mut candidates) => candidates.pop().map(|c| c.local_file_name),
        Err(e) => {
            eprintln!("Skipping the test: {e}");
            None
        }
    }
}

/// Find the `cdylib` that Cargo built alongside this test.
fn fixture_library() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    let prefix = format!("{DLL_PREFIX}native_binding_fixture");
    let exact = format!("{prefix}{DLL_SUFFIX}");
    for dir in [Some(deps), deps.parent()].into_iter().flatten() {
        let path = dir.join(&exact);
        if path.is_file() {
            return path;
        }
    }
    for entry in fs_err::read_dir(deps).unwrap() {
        let path = entry.unwrap().path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX) {
            return path;
        }
    }
    panic!("{exact} not found in {deps:?}");
}

struct Workdir {
    dir: TempDir,
}

impl Workdir {
    fn new() -> Self {
        let _ = env_logger::try_init();
        let dir = TempDir::with_prefix("native-binding-fixture-").unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn package_dir(&self) -> PathBuf {
        self.path().join("node_modules")
    }

    fn options(&self) -> ResolverOptions {
        Resolver::options("fixture")
            .extension("ext")
            .base_dir(Some(self.path().into()))
            .package_dirs(Some(vec![self.package_dir()]))
    }
}
