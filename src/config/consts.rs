/// Default directory scanned for kernel modules
pub const DEFAULT_MODULE_DIRECTORY: &str = "wasm/lib";
/// Default file suffix stripped from module file names to derive module names
pub const DEFAULT_MODULE_SUFFIX: &str = ".wasm";
/// Default maximum module file size (16MB)
pub const DEFAULT_MAX_MODULE_BYTES: usize = 16 * 1024 * 1024;
/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info";
