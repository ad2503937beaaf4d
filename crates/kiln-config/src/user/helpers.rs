// Defaults applied during normalization

pub(crate) const DEFAULT_ENTRY: &str = "src/index";
pub(crate) const DEFAULT_INPUT: &str = "src";
pub(crate) const DEFAULT_OUTPUT: &str = "dist";

/// Extension of bundle outputs (`index.umd.js`).
pub(crate) const BUNDLE_EXT: &str = "umd.js";
