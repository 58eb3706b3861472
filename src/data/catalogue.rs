// ============================================================
// Layer 4 — Resource Catalogue
// ============================================================
// Maps an acquisition mode to the named remote resources that
// make up that mode:
//
//   "ordinary" ─┬─ fixations_Paragraph → <base>/ne4az
//               └─ ia_Paragraph        → <base>/xkgfz
//
// Every resource lands at `<root>/<mode>_<name>.zip`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::resource::DownloadResource;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCatalogue {
    base_locator: String,
    /// mode → (resource name → remote code)
    modes:        BTreeMap<String, BTreeMap<String, String>>,
}

impl ResourceCatalogue {
    pub fn new(base_locator: impl Into<String>) -> Self {
        Self { base_locator: base_locator.into(), modes: BTreeMap::new() }
    }

    /// Register a mode with its resources. A mode with no resources is
    /// valid: downloading it is a no-op (the data is placed by hand).
    pub fn with_mode(mut self, mode: &str, resources: &[(&str, &str)]) -> Self {
        let entry = self.modes.entry(mode.to_string()).or_default();
        for (name, code) in resources {
            entry.insert(name.to_string(), code.to_string());
        }
        self
    }

    /// Add one resource, creating the mode if needed.
    pub fn register(&mut self, mode: &str, name: &str, code: &str) {
        self.modes
            .entry(mode.to_string())
            .or_default()
            .insert(name.to_string(), code.to_string());
    }

    pub fn base_locator(&self) -> &str {
        &self.base_locator
    }

    /// Registered modes in sorted order
    pub fn modes(&self) -> Vec<String> {
        self.modes.keys().cloned().collect()
    }

    /// Fails with InvalidMode listing the registered modes.
    pub fn ensure_mode(&self, mode: &str) -> Result<()> {
        if self.modes.contains_key(mode) {
            Ok(())
        } else {
            Err(PipelineError::InvalidMode { mode: mode.to_string(), valid: self.modes() })
        }
    }

    /// Concrete download targets for `mode` under `root`.
    pub fn resources(&self, mode: &str, root: &Path) -> Result<Vec<DownloadResource>> {
        self.ensure_mode(mode)?;

        Ok(self.modes[mode]
            .iter()
            .map(|(name, code)| {
                DownloadResource::new(
                    name.as_str(),
                    format!("{}{}", self.base_locator, code),
                    root.join(format!("{mode}_{name}.zip")),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResourceCatalogue {
        ResourceCatalogue::new("https://osf.io/download/")
            .with_mode("ordinary", &[("fixations_Paragraph", "ne4az"), ("ia_Paragraph", "xkgfz")])
            .with_mode("manual", &[])
    }

    #[test]
    fn test_resources_are_built_from_mode() {
        let resources = sample().resources("ordinary", Path::new("root")).unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].identifier, "fixations_Paragraph");
        assert_eq!(resources[0].remote_locator, "https://osf.io/download/ne4az");
        assert_eq!(resources[0].local_path, Path::new("root/ordinary_fixations_Paragraph.zip"));
    }

    #[test]
    fn test_unknown_mode_names_valid_options() {
        let err = sample().resources("nonexistent", Path::new("root")).unwrap_err();
        match err {
            PipelineError::InvalidMode { mode, valid } => {
                assert_eq!(mode, "nonexistent");
                assert_eq!(valid, vec!["manual".to_string(), "ordinary".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_mode_is_valid() {
        assert!(sample().resources("manual", Path::new("root")).unwrap().is_empty());
    }

    #[test]
    fn test_register_extends_mode() {
        let mut catalogue = sample();
        catalogue.register("task1", "ZAB", "abc12");
        assert!(catalogue.ensure_mode("task1").is_ok());
        assert_eq!(catalogue.modes().len(), 3);
    }
}
