use crate::url::NormalizedUrl;
use std::collections::HashMap;

/// A resolved artifact name
///
/// `sequence_suffix` is set only when a different URL already claimed the
/// base name in this run (or in a persisted earlier run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArtifact {
    pub base_name: String,
    pub sequence_suffix: Option<u32>,
}

impl NamedArtifact {
    /// Returns the full logical name, `{base}` or `{base}_{N}`
    pub fn name(&self) -> String {
        match self.sequence_suffix {
            Some(n) => format!("{}_{}", self.base_name, n),
            None => self.base_name.clone(),
        }
    }
}

/// Claim table mapping logical names to the URL that owns them
///
/// Names are compared ASCII case-insensitively so that two artifacts can
/// never alias on a case-insensitive filesystem. A URL keeps whatever name
/// it was first given; later calls for the same URL return it unchanged.
#[derive(Debug, Default)]
pub struct NameRegistry {
    /// Lowercased logical name -> owning URL
    owners: HashMap<String, NormalizedUrl>,

    /// URL -> assigned artifact
    assigned: HashMap<NormalizedUrl, NamedArtifact>,
}

impl NameRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-seeded with names persisted by earlier runs
    ///
    /// Each URL keeps its persisted name, and no other URL can claim it.
    pub fn with_reserved<I>(reserved: I) -> Self
    where
        I: IntoIterator<Item = (String, NormalizedUrl)>,
    {
        let mut registry = Self::new();
        for (name, url) in reserved {
            registry.owners.insert(name.to_ascii_lowercase(), url.clone());
            registry.assigned.entry(url).or_insert(NamedArtifact {
                base_name: name,
                sequence_suffix: None,
            });
        }
        registry
    }

    /// Assigns a collision-free name for `url`
    ///
    /// If `base_name` is free (or already owned by `url`) it is used as is;
    /// otherwise the smallest unused `_N` with `N >= 1` is appended.
    pub fn assign(&mut self, url: &NormalizedUrl, base_name: &str) -> NamedArtifact {
        if let Some(existing) = self.assigned.get(url) {
            return existing.clone();
        }

        let artifact = if self.is_free(base_name, url) {
            NamedArtifact {
                base_name: base_name.to_string(),
                sequence_suffix: None,
            }
        } else {
            let mut n = 1;
            while !self.is_free(&format!("{}_{}", base_name, n), url) {
                n += 1;
            }
            tracing::debug!(
                "Name '{}' already taken, using suffix _{} for {}",
                base_name,
                n,
                url
            );
            NamedArtifact {
                base_name: base_name.to_string(),
                sequence_suffix: Some(n),
            }
        };

        self.owners
            .insert(artifact.name().to_ascii_lowercase(), url.clone());
        self.assigned.insert(url.clone(), artifact.clone());
        artifact
    }

    /// Returns the artifact already assigned to `url`
    pub fn get(&self, url: &NormalizedUrl) -> Option<&NamedArtifact> {
        self.assigned.get(url)
    }

    /// Returns the number of claimed names
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if no names are claimed
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn is_free(&self, name: &str, url: &NormalizedUrl) -> bool {
        match self.owners.get(&name.to_ascii_lowercase()) {
            Some(owner) => owner == url,
            None => true,
        }
    }
}
