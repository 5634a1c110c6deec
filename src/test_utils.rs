//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::component::Component;

    /// Generate a valid component name (lowercase alphanumeric with hyphens)
    pub fn component_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,30}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate a valid semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (1u32..100, 0u32..100, 0u32..100)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate a valid SHA256 hash (64 hex characters)
    pub fn sha256_hash() -> impl Strategy<Value = String> {
        "[0-9a-f]{64}"
    }

    /// Generate an option name/value pair
    pub fn option_pair() -> impl Strategy<Value = (String, String)> {
        ("[a-z][a-z0-9_]{0,15}", "[A-Za-z0-9]{1,10}")
            .prop_map(|(name, value)| (name, value))
    }

    /// Generate a component with a random identity and options
    pub fn component() -> impl Strategy<Value = Component> {
        (
            component_name(),
            semver_version(),
            proptest::collection::vec(option_pair(), 0..4),
        )
            .prop_map(|(name, version, options)| {
                let mut component = Component::new(name, version);
                for (option, value) in options {
                    component = component.with_option(&option, &[&value]);
                }
                component
            })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_component_name_generator(name in component_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_semver_version_generator(version in semver_version()) {
            let parts: Vec<&str> = version.split('.').collect();
            prop_assert_eq!(parts.len(), 3);
            for part in parts {
                prop_assert!(part.parse::<u32>().is_ok());
            }
        }

        #[test]
        fn test_sha256_hash_generator(hash in sha256_hash()) {
            prop_assert_eq!(hash.len(), 64);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_component_generator(component in component()) {
            prop_assert!(!component.name.is_empty());
            prop_assert!(!component.version.is_empty());
        }
    }
}
