//! Project name to store id mapping.
//!
//! Configured as a single string `Name:ID,Name2:ID2`. Entries without an id
//! are still offered as clarification options but cannot be moved to.

/// One configured project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub name: String,
    pub id: Option<String>,
}

/// Ordered set of known projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDirectory {
    entries: Vec<ProjectEntry>,
}

impl ProjectDirectory {
    /// Parses the mapping string. Blank items and items with an empty name are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut entries: Vec<ProjectEntry> = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, id) = match item.split_once(':') {
                Some((name, id)) => {
                    let id = id.trim();
                    (name.trim(), (!id.is_empty()).then(|| id.to_string()))
                }
                None => (item, None),
            };
            if name.is_empty() {
                continue;
            }
            // later duplicates win, as with a map insert
            if let Some(existing) = entries.iter_mut().find(|e| e.name == name) {
                existing.id = id;
            } else {
                entries.push(ProjectEntry {
                    name: name.to_string(),
                    id,
                });
            }
        }
        Self { entries }
    }

    pub fn from_entries(entries: Vec<ProjectEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ProjectEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Store id for a project name. Exact match first, then case-insensitive.
    pub fn id_for(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|e| e.name == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.name.to_lowercase() == name.to_lowercase())
            })
            .and_then(|e| e.id.as_deref())
    }

    /// Reverse lookup used when rendering store records.
    pub fn name_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id.as_deref() == Some(id))
            .map(|e| e.name.as_str())
    }
}
