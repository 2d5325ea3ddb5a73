//! Input documents and upload-name de-duplication.

use std::collections::{BTreeMap, BTreeSet};

/// A document as supplied by the user: display name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputDocument {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Assigns unique display names to documents uploaded under the same name.
///
/// The first document keeps its name; later ones get `_2`, `_3`, ...
/// inserted before the extension, or appended when there is none. A
/// generated name is never one already handed out, even when a later
/// upload literally carries it.
#[derive(Debug, Clone, Default)]
pub struct NameDeduper {
    seen: BTreeMap<String, usize>,
    used: BTreeSet<String>,
}

impl NameDeduper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique name for the next document called `name`.
    pub fn unique_name(&mut self, name: &str) -> String {
        let count = self.seen.entry(name.to_owned()).or_insert(0);
        loop {
            *count += 1;
            let candidate = if *count == 1 {
                name.to_owned()
            } else {
                numbered(name, *count)
            };
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn numbered(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}_{n}{}", &name[..idx], &name[idx..]),
        _ => format!("{name}_{n}"),
    }
}
