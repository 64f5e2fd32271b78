//! Loading [`ExtractConfig`] from TOML.
//!
//! Every key is optional and falls back to the defaults used for the
//! published guides:
//!
//! ```toml
//! section_title = "Segmentlayout"
//! min_leader_dots = 1
//! data_scan_start_row = 4
//! numeric_prefix_len = 4
//! continuation_separator = "\n"
//! empty_pages = "skip"
//! ```

use std::path::Path;

use bdew_mig_models::ExtractConfig;

use crate::MigError;

/// Parses an extraction config from a TOML string.
///
/// # Errors
///
/// Returns [`MigError::Config`] if the TOML is malformed or contains
/// unknown keys.
pub fn parse_config_toml(toml_str: &str) -> Result<ExtractConfig, MigError> {
    toml::de::from_str(toml_str).map_err(|e| MigError::Config(e.to_string()))
}

/// Reads and parses an extraction config file.
///
/// # Errors
///
/// * [`MigError::Io`] if the file cannot be read
/// * [`MigError::Config`] if its contents are not a valid config
pub fn load_config(path: &Path) -> Result<ExtractConfig, MigError> {
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config_toml(&contents)?;

    log::debug!("Loaded extraction config from {}", path.display());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use bdew_mig_models::EmptyPagePolicy;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(parse_config_toml("").unwrap(), ExtractConfig::default());
    }

    #[test]
    fn overrides_selected_keys() {
        let config = parse_config_toml(
            r#"
            min_leader_dots = 4
            continuation_separator = " "
            empty_pages = "break"
            "#,
        )
        .unwrap();

        assert_eq!(config.min_leader_dots, 4);
        assert_eq!(config.continuation_separator, " ");
        assert_eq!(config.empty_pages, EmptyPagePolicy::Break);
        assert_eq!(config.section_title, "Segmentlayout");
        assert_eq!(config.data_scan_start_row, 4);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            parse_config_toml("section = \"Segmentlayout\""),
            Err(MigError::Config(_))
        ));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(matches!(
            parse_config_toml("empty_pages = \"merge\""),
            Err(MigError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/bdew_mig.toml")),
            Err(MigError::Io(_))
        ));
    }
}
