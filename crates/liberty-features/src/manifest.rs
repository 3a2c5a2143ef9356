//! OSGi subsystem manifest (`.mf`) parsing for installed feature descriptors.
//!
//! Manifest headers fold: a physical line starting with a single space
//! continues the previous header's value. Header values such as
//! `Subsystem-SymbolicName` carry `;`-separated directives
//! (`visibility:=public`).

use std::collections::HashMap;

/// Parsed headers of one feature descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubsystemManifest {
    headers: HashMap<String, String>,
}

impl SubsystemManifest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The symbolic name with directives stripped.
    pub fn symbolic_name(&self) -> Option<&str> {
        let raw = self.header("Subsystem-SymbolicName")?;
        let name = raw.split(';').next().unwrap_or(raw).trim();
        (!name.is_empty()).then_some(name)
    }

    /// The `visibility:=` directive of `Subsystem-SymbolicName`, lowercased.
    pub fn visibility(&self) -> Option<String> {
        let raw = self.header("Subsystem-SymbolicName")?;
        for part in raw.split(';').skip(1) {
            let part = part.trim();
            if let Some(value) = part.strip_prefix("visibility:=") {
                return Some(value.trim_matches('"').trim().to_ascii_lowercase());
            }
        }
        None
    }

    pub fn short_name(&self) -> Option<&str> {
        self.header("IBM-ShortName").map(str::trim).filter(|s| !s.is_empty())
    }

    /// Auto features declare a provisioning condition instead of being
    /// user-installable.
    pub fn is_auto_feature(&self) -> bool {
        self.header("IBM-Provision-Capability").is_some()
    }
}

/// Parse manifest text into folded headers.
///
/// Lines that are not `Name: value` pairs and not continuations are ignored
/// rather than rejected; a descriptor is only unusable when it yields no
/// headers at all.
pub fn parse_subsystem_manifest(text: &str) -> SubsystemManifest {
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut current: Option<String> = None;

    for raw in text.lines() {
        if let Some(rest) = raw.strip_prefix(' ') {
            // Continuation of the previous header.
            if let Some(name) = &current {
                if let Some(value) = headers.get_mut(name) {
                    value.push_str(rest.trim_end());
                }
            }
            continue;
        }

        let line = raw.trim_end();
        if line.is_empty() {
            current = None;
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            current = None;
            continue;
        };

        let name = name.trim().to_string();
        headers.insert(name.clone(), value.trim().to_string());
        current = Some(name);
    }

    SubsystemManifest { headers }
}
