use crate::config::Environment;

/// Entrypoint binaries the launcher recognizes. Paths ending in any of
/// these (plus `.exe` on Windows) are marked executable after download.
const SERVER_BINARY_SUFFIXES: [&str; 5] = [
    "Server-Debug",
    "Server-DebugGame",
    "Server",
    "Server-Test",
    "Server-Shipping",
];

/// Platform name as the release API spells it.
///
/// # Errors
/// Returns an error for any OS without server builds.
pub fn platform_name() -> Result<&'static str, String> {
    if cfg!(target_os = "windows") {
        Ok("Win64")
    } else if cfg!(target_os = "macos") {
        Ok("Mac")
    } else if cfg!(target_os = "linux") {
        Ok("Linux")
    } else {
        Err(format!("unsupported OS: {}", std::env::consts::OS))
    }
}

/// Binary suffix the entrypoint search matches against, for the current OS.
pub fn binary_suffix(environment: Environment) -> String {
    suffix_for(cfg!(target_os = "windows"), environment)
}

/// Suffix lookup keyed by (windows, environment). Kept separate from
/// [`binary_suffix`] so every combination stays testable on one host.
pub fn suffix_for(windows: bool, environment: Environment) -> String {
    let base = match environment {
        Environment::Debug => "Server-DebugGame",
        Environment::Dev => "Server",
        Environment::Test => "Server-Test",
        Environment::Prod => "Server-Shipping",
    };
    if windows {
        format!("{base}.exe")
    } else {
        base.to_string()
    }
}

/// Whether a downloaded path names a known server binary.
pub fn is_server_binary(path: &str) -> bool {
    let name = path.trim_end_matches(".exe");
    SERVER_BINARY_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}
