/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Numeric version: `major * 10_000_000 + minor * 10_000 + patch`.
///
/// Orders the same way as the semantic version for components below the
/// field widths.
pub fn version_id() -> u64 {
    compose(
        parse(env!("CARGO_PKG_VERSION_MAJOR")),
        parse(env!("CARGO_PKG_VERSION_MINOR")),
        parse(env!("CARGO_PKG_VERSION_PATCH")),
    )
}

/// Unix seconds at which this crate was built (`SOURCE_DATE_EPOCH` when set).
pub fn buildtime() -> u64 {
    option_env!("TAGFORM_BUILDTIME").map_or(0, parse)
}

/// Target triple this crate was built for, if known.
pub fn build_target() -> &'static str {
    option_env!("TAGFORM_BUILD_TARGET").unwrap_or("unknown")
}

fn compose(major: u64, minor: u64, patch: u64) -> u64 {
    major * 10_000_000 + minor * 10_000 + patch
}

fn parse(value: &str) -> u64 {
    value.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_layout() {
        assert_eq!(compose(1, 2, 3), 10_020_003);
        assert_eq!(compose(0, 1, 0), 10_000);
        assert!(compose(1, 0, 0) > compose(0, 999, 9_999));
    }

    #[test]
    fn id_matches_package_version() {
        let parts: Vec<u64> = VERSION
            .split(&['.', '-', '+'][..])
            .take(3)
            .map(|p| p.parse().unwrap())
            .collect();
        assert_eq!(version_id(), compose(parts[0], parts[1], parts[2]));
    }

    #[test]
    fn buildtime_is_recorded() {
        assert!(buildtime() > 0);
        assert!(!build_target().is_empty());
    }
}
