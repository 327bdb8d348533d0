// src/styles/prefix.rs

//! Vendor prefixing via `lightningcss`.
//!
//! The browser target list is expressed as browserslist queries (e.g.
//! "last 15 versions", "> 1%") and resolved once at pipeline construction;
//! prefixes are compiled in during the minify pass and the result is printed
//! expanded.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::errors::{Result, StylesyncError};

/// Resolve browserslist queries into concrete browser version targets.
pub fn browser_targets(queries: &[String]) -> Result<Browsers> {
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|err| {
            StylesyncError::ConfigError(format!("invalid browser target list: {err}"))
        })?;

    Ok(browsers.unwrap_or_default())
}

/// Parse plain CSS and add the vendor prefixes the given targets require.
pub fn apply_prefixes(css: &str, browsers: &Browsers) -> Result<String> {
    let targets = Targets::from(browsers.clone());

    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|err| StylesyncError::CssError(err.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|err| StylesyncError::CssError(err.to_string()))?;

    let result = sheet
        .to_css(PrinterOptions {
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|err| StylesyncError::CssError(err.to_string()))?;

    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_targets() -> Browsers {
        browser_targets(&["ie 10".to_string(), "chrome 20".to_string()]).unwrap()
    }

    #[test]
    fn flexbox_gains_vendor_prefixes_for_old_targets() {
        let css = ".row { display: flex; }";
        let out = apply_prefixes(css, &legacy_targets()).unwrap();
        assert!(out.contains("display: flex"));
        assert!(out.contains("-webkit-"), "expected webkit prefix in: {out}");
        assert!(out.contains("-ms-"), "expected ms prefix in: {out}");
    }

    #[test]
    fn modern_targets_leave_output_unprefixed() {
        let targets = browser_targets(&["chrome 120".to_string()]).unwrap();
        let out = apply_prefixes(".row { display: flex; }", &targets).unwrap();
        assert!(!out.contains("-webkit-box"));
    }

    #[test]
    fn invalid_query_is_a_config_error() {
        let err = browser_targets(&["not a real browser query %%%".to_string()]).unwrap_err();
        assert!(matches!(err, StylesyncError::ConfigError(_)));
    }

    #[test]
    fn invalid_css_is_a_css_error() {
        // A stray closing brace is unrecoverable at the top level.
        let err = apply_prefixes("} body { color: red; }", &legacy_targets()).unwrap_err();
        assert!(matches!(err, StylesyncError::CssError(_)));
    }
}
