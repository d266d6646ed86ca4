use std::path::PathBuf;

/// Absolute path to a file under `tests/fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
