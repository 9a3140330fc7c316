use std::env;
use tracing_subscriber::EnvFilter;

use crate::classpath::Classpath;
use crate::cli::Cli;
use crate::enumerate::ScanOptions;

pub const CLASSPATH_ENV: &str = "CLASSPATH";

/// Flag first, then `$CLASSPATH`, then the current directory.
pub fn resolve_classpath(cli: &Cli) -> Classpath {
    if let Some(cp) = cli.classpath.as_deref() {
        return Classpath::parse(cp);
    }

    if let Some(cp) = env::var_os(CLASSPATH_ENV)
        && !cp.is_empty()
    {
        return Classpath::parse(cp);
    }

    Classpath::parse(".")
}

pub fn scan_options(no_recursive: bool, skip_inner: bool) -> ScanOptions {
    ScanOptions {
        recursive: !no_recursive,
        skip_inner_classes: skip_inner,
    }
}

/// `RUST_LOG` wins; otherwise the verbosity count picks the level.
pub fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        EnvFilter::new(level)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::ClasspathEntry;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn classpath_flag_takes_precedence() {
        let cli = Cli::parse_from(["class-preload", "--classpath", "lib/rpc.jar", "resources", "com.example"]);
        let classpath = resolve_classpath(&cli);
        assert_eq!(
            classpath.entries(),
            [ClasspathEntry::Archive(PathBuf::from("lib/rpc.jar"))]
        );
    }

    #[test]
    fn scan_options_follow_flags() {
        assert_eq!(scan_options(false, false), ScanOptions::default());
        let flat = scan_options(true, true);
        assert!(!flat.recursive);
        assert!(flat.skip_inner_classes);
    }
}
