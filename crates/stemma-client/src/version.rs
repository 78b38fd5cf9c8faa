//! Simplified two-component version parsing.
//!
//! Split on the first `-` or `+`, keep the prefix, take the first two
//! dot-separated integers (defaulting to 0). Used only to gate the
//! background-transaction query flag at server version >= 2.7.

/// Parse the leading `major.minor` of a version string.
pub fn parse_two_component(version: &str) -> (u32, u32) {
    let prefix = version
        .split(['-', '+'])
        .next()
        .unwrap_or(version);
    let mut parts = prefix.split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor)
}

/// Whether the server supports background transaction processing.
pub fn supports_background(version: &str) -> bool {
    parse_two_component(version) >= (2, 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_versions() {
        assert_eq!(parse_two_component("2.7.0"), (2, 7));
        assert_eq!(parse_two_component("10.3"), (10, 3));
        assert_eq!(parse_two_component("3"), (3, 0));
    }

    #[test]
    fn strips_prerelease_and_build_metadata() {
        assert_eq!(parse_two_component("2.7.0-beta.1"), (2, 7));
        assert_eq!(parse_two_component("2.8.0+build42"), (2, 8));
    }

    #[test]
    fn malformed_components_default_to_zero() {
        assert_eq!(parse_two_component(""), (0, 0));
        assert_eq!(parse_two_component("v2.7"), (0, 7));
    }

    #[test]
    fn background_gate_is_2_7() {
        assert!(supports_background("2.7.0"));
        assert!(supports_background("2.10.1"));
        assert!(supports_background("3.0.0"));
        assert!(!supports_background("2.6.9"));
        assert!(!supports_background("1.9.0"));
    }
}
