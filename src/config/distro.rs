use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{Error, Result};

/// A named third-party configuration with a fixed repository and pinned ref.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DistroDescriptor {
    pub name: String,
    #[serde(alias = "repository")]
    pub url: String,
    /// Path inside the repository holding the config; `.` is the repository root.
    #[serde(default = "default_config_path")]
    pub config_path: String,
    pub prefix: String,
    /// Branch or tag every install of this distro uses.
    pub version: String,
}

fn default_config_path() -> String {
    ".".to_string()
}

struct BuiltinDistro {
    name: &'static str,
    url: &'static str,
    config_path: &'static str,
    prefix: &'static str,
    version: &'static str,
}

const BUILTIN_DISTROS: &[BuiltinDistro] = &[
    BuiltinDistro {
        name: "LazyVim",
        url: "https://github.com/LazyVim/starter",
        config_path: ".",
        prefix: "lazyvim",
        version: "main",
    },
    BuiltinDistro {
        name: "AstroNvim",
        url: "https://github.com/AstroNvim/template",
        config_path: ".",
        prefix: "astronvim",
        version: "main",
    },
    BuiltinDistro {
        name: "NvChad",
        url: "https://github.com/NvChad/starter",
        config_path: ".",
        prefix: "nvchad",
        version: "main",
    },
    BuiltinDistro {
        name: "Kickstart",
        url: "https://github.com/nvim-lua/kickstart.nvim",
        config_path: ".",
        prefix: "kickstart",
        version: "master",
    },
    BuiltinDistro {
        name: "Kickstart-Modular",
        url: "https://github.com/dam9000/kickstart-modular.nvim",
        config_path: ".",
        prefix: "kickstart-modular",
        version: "master",
    },
];

impl BuiltinDistro {
    fn descriptor(&self) -> DistroDescriptor {
        DistroDescriptor {
            name: self.name.to_string(),
            url: self.url.to_string(),
            config_path: self.config_path.to_string(),
            prefix: self.prefix.to_string(),
            version: self.version.to_string(),
        }
    }
}

/// Lookup table of known distros, keyed case-insensitively by name.
#[derive(Debug, Clone)]
pub struct DistroRegistry {
    distros: Vec<DistroDescriptor>,
    by_name: FxHashMap<String, usize>,
}

impl Default for DistroRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DistroRegistry {
    /// Registry holding only the built-in distros.
    pub fn builtin() -> Self {
        Self::from_descriptors(BUILTIN_DISTROS.iter().map(BuiltinDistro::descriptor))
    }

    /// Built-in distros extended by user-declared ones.
    ///
    /// A declared distro whose name matches a built-in one replaces it.
    pub fn with_extra(extra: impl IntoIterator<Item = DistroDescriptor>) -> Self {
        Self::from_descriptors(
            BUILTIN_DISTROS
                .iter()
                .map(BuiltinDistro::descriptor)
                .chain(extra),
        )
    }

    fn from_descriptors(descriptors: impl IntoIterator<Item = DistroDescriptor>) -> Self {
        let mut registry = Self {
            distros: Vec::new(),
            by_name: FxHashMap::default(),
        };

        for descriptor in descriptors {
            let key = descriptor.name.to_lowercase();
            match registry.by_name.get(&key) {
                Some(&index) => registry.distros[index] = descriptor,
                None => {
                    registry.by_name.insert(key, registry.distros.len());
                    registry.distros.push(descriptor);
                }
            }
        }

        registry
    }

    /// Find a distro by display name, ignoring case.
    pub fn resolve(&self, name: &str) -> Result<&DistroDescriptor> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.distros[index])
            .ok_or_else(|| Error::UnknownDistro {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Find the distro that installs under `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&DistroDescriptor> {
        self.distros.iter().find(|d| d.prefix == prefix)
    }

    /// Display names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.distros.iter().map(|d| d.name.clone()).collect()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.distros.iter().map(|d| d.prefix.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DistroDescriptor> {
        self.distros.iter()
    }

    pub fn len(&self) -> usize {
        self.distros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distros.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_five_entries() {
        let registry = DistroRegistry::builtin();
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = DistroRegistry::builtin();

        let a = registry.resolve("lazyvim").unwrap();
        let b = registry.resolve("LazyVim").unwrap();
        let c = registry.resolve("LAZYVIM").unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.prefix, "lazyvim");
        assert_eq!(a.config_path, ".");
    }

    #[test]
    fn test_resolve_unknown_lists_names() {
        let registry = DistroRegistry::builtin();

        let result = registry.resolve("doesnotexist");
        match result {
            Err(Error::UnknownDistro { name, available }) => {
                assert_eq!(name, "doesnotexist");
                assert!(available.contains(&"LazyVim".to_string()));
                assert_eq!(available.len(), 5);
            }
            other => panic!("expected UnknownDistro, got {:?}", other),
        }
    }

    #[test]
    fn test_with_extra_appends_and_replaces() {
        let registry = DistroRegistry::with_extra([
            DistroDescriptor {
                name: "lazyvim".to_string(),
                url: "https://example.com/my-lazyvim".to_string(),
                config_path: "nvim".to_string(),
                prefix: "mylazy".to_string(),
                version: "stable".to_string(),
            },
            DistroDescriptor {
                name: "Mine".to_string(),
                url: "https://example.com/mine".to_string(),
                config_path: ".".to_string(),
                prefix: "mine".to_string(),
                version: "v1".to_string(),
            },
        ]);

        assert_eq!(registry.len(), 6);
        assert_eq!(
            registry.resolve("LazyVim").unwrap().url,
            "https://example.com/my-lazyvim"
        );
        assert_eq!(registry.resolve("mine").unwrap().version, "v1");
    }

    #[test]
    fn test_find_by_prefix() {
        let registry = DistroRegistry::builtin();

        let distro = registry.find_by_prefix("kickstart-modular").unwrap();
        assert_eq!(distro.name, "Kickstart-Modular");
        assert!(registry.find_by_prefix("kick").is_none());
    }
}
