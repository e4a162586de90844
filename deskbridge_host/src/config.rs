//! Startup configuration: listen port, optional auth token, logs directory.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4780;

/// Parse `--port N`, `-p N`, or `--port=N` from the argument list, falling
/// back to `default_port`. Unknown arguments are ignored here.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}

/// Flag beats `DESKBRIDGE_PORT` beats the built-in default.
pub fn resolve_port<I: IntoIterator<Item = String>>(args: I) -> u16 {
    let fallback = std::env::var("DESKBRIDGE_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    parse_port(args, fallback)
}

/// Shared secret checked as a `token` query parameter on upgrade, when set.
pub fn auth_token() -> Option<String> {
    std::env::var("DESKBRIDGE_TOKEN").ok().filter(|t| !t.is_empty())
}

/// `DESKBRIDGE_LOGS_DIR`, else `<platform data dir>/deskbridge/logs`.
pub fn logs_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("DESKBRIDGE_LOGS_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deskbridge")
        .join("logs")
}
