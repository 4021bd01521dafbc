use native_binding::libc::RuntimeReport;
use native_binding::PlatformKey;
use native_binding::HOST_ARCH;
use native_binding::HOST_OS;

use crate::Printer;
use crate::ResolverArgs;

pub fn platform() -> Result<(), Box<dyn std::error::Error>> {
    let mut printer = Printer::new();
    printer.title("Host");
    printer.kv("OS", HOST_OS);
    printer.kv("Architecture", HOST_ARCH);
    match RuntimeReport::current() {
        Some(report) => {
            let version = report.glibc_version_runtime.as_deref().unwrap_or("none");
            printer.kv("glibc version", version);
        }
        None => printer.kv("Runtime report", "not available"),
    }
    printer.title("Platform");
    match PlatformKey::current() {
        Ok(key) => {
            printer.kv("OS", key.os);
            printer.kv("Architecture", key.arch);
            if let Some(libc) = key.libc {
                printer.kv("Libc", libc);
            }
        }
        Err(e) => printer.failed(e),
    }
    printer.flush()?;
    Ok(())
}

pub fn candidates(args: ResolverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let resolver = args.new_resolver();
    let candidates = resolver.candidates()?;
    let mut printer = Printer::new();
    printer.title("Candidates");
    for candidate in candidates.iter() {
        printer.kv("Local file", resolver.base_dir().join(&candidate.local_file_name).display());
        printer.kv("Package", &candidate.package_name);
    }
    printer.title("Package directories");
    for dir in resolver.package_dirs() {
        printer.line(format_args!("  {}", dir.display()));
    }
    printer.flush()?;
    Ok(())
}
