//! Module descriptors.

use std::collections::BTreeMap;

/// A resolved Lumen module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    /// The module name as spelled in Lumen sources.
    pub name: String,

    /// True for imports of native C headers rather than Lumen modules.
    pub is_plain_c: bool,

    /// The prefix used when mangling the module's symbols into C names.
    pub c_name: String,
}

impl Module {
    /// Create a module whose mangling prefix equals its name.
    pub fn new(name: impl Into<String>, is_plain_c: bool) -> Self {
        let name = name.into();
        let c_name = name.clone();
        Self { name, is_plain_c, c_name }
    }

    /// Create a module with an explicit mangling prefix.
    pub fn with_c_name(name: impl Into<String>, is_plain_c: bool, c_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_plain_c,
            c_name: c_name.into(),
        }
    }
}

/// The resolved module map, keyed by module name.
///
/// Iteration order is the sorted name order, which keeps every consumer
/// deterministic.
pub type Modules = BTreeMap<String, Module>;
