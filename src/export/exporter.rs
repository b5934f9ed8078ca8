use crate::export::{content_digest, ExportError, ExportMode, Outcome};
use crate::naming::{derive_name, NameRegistry, NamedArtifact};
use crate::render::RenderResult;
use crate::storage::{HashRecord, Storage};
use crate::url::NormalizedUrl;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What to do with a rendered page, given the mode and any stored hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write `{name}.pdf` as version 1
    Create,

    /// Write over the file recorded in the stored hash, keeping its version
    Replace { file_name: String, version: u32 },

    /// Write a new `{name}.v{N}.pdf` file
    AppendVersion { version: u32 },

    /// Write nothing
    Skip,
}

impl Action {
    /// Maps the action to the outcome reported for the page
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Create => Outcome::Created,
            Self::Replace { .. } | Self::AppendVersion { .. } => Outcome::Updated,
            Self::Skip => Outcome::Skipped,
        }
    }
}

/// Decides how to export a page
///
/// | mode      | no prior hash | hash matches | hash differs   |
/// |-----------|---------------|--------------|----------------|
/// | append    | Create        | Skip         | AppendVersion  |
/// | update    | Create        | Skip         | Replace        |
/// | skip      | Create        | Skip         | Skip           |
/// | overwrite | Create        | Replace      | Replace        |
pub fn decide(mode: ExportMode, prior: Option<&HashRecord>, digest: &str) -> Action {
    let Some(prior) = prior else {
        return Action::Create;
    };

    let replace = Action::Replace {
        file_name: prior.pdf_path.clone(),
        version: prior.version,
    };
    let matches = prior.content_hash.eq_ignore_ascii_case(digest);

    match (mode, matches) {
        (ExportMode::Overwrite, _) => replace,
        (_, true) => Action::Skip,
        (ExportMode::Append, false) => Action::AppendVersion {
            version: prior.version + 1,
        },
        (ExportMode::Update, false) => replace,
        (ExportMode::Skip, false) => Action::Skip,
    }
}

/// Returns the file name for a version of a logical page
///
/// Version 1 is `{name}.pdf`; later versions are `{name}.v{N}.pdf`.
pub(crate) fn version_file_name(logical_name: &str, version: u32) -> String {
    if version <= 1 {
        format!("{}.pdf", logical_name)
    } else {
        format!("{}.v{}.pdf", logical_name, version)
    }
}

/// Result of exporting one page
#[derive(Debug, Clone)]
pub struct ExportedPage {
    pub logical_name: String,
    pub outcome: Outcome,

    /// Path of the written file, if anything was written
    pub path: Option<PathBuf>,
}

/// Writes rendered pages into the output folder, deduplicated by content hash
///
/// The read-decide-write sequence for a logical name runs under a per-name
/// async lock, so two workers can never race on the same file or record.
pub struct Exporter {
    output_dir: PathBuf,
    mode: ExportMode,
    storage: Arc<Mutex<dyn Storage>>,
    registry: Mutex<NameRegistry>,
    name_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Exporter {
    /// Creates an exporter writing into `output_dir`
    ///
    /// The output folder is created if missing. Names recorded by earlier
    /// runs are reserved so each URL keeps its name.
    ///
    /// # Arguments
    ///
    /// * `output_dir` - Folder receiving the PDFs
    /// * `mode` - Effective export mode
    /// * `storage` - Hash record persistence
    pub fn new(
        output_dir: impl Into<PathBuf>,
        mode: ExportMode,
        storage: Arc<Mutex<dyn Storage>>,
    ) -> Result<Self, ExportError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|source| ExportError::CreateDir {
            path: output_dir.clone(),
            source,
        })?;

        let persisted = {
            let storage = storage.lock().unwrap_or_else(|e| e.into_inner());
            storage.list_records()
        };
        let reserved: Vec<(String, NormalizedUrl)> = match persisted {
            Ok(records) => records
                .into_iter()
                .filter_map(|record| match NormalizedUrl::parse(&record.url) {
                    Ok(url) => Some((record.logical_name, url)),
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring stored name '{}' with invalid URL: {}",
                            record.logical_name,
                            e
                        );
                        None
                    }
                })
                .collect(),
            Err(e) => {
                tracing::warn!("Could not load stored hash records: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("Reserved {} names from earlier runs", reserved.len());

        Ok(Self {
            output_dir,
            mode,
            storage,
            registry: Mutex::new(NameRegistry::with_reserved(reserved)),
            name_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn mode(&self) -> ExportMode {
        self.mode
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Names a rendered page, compares its hash and writes it if needed
    ///
    /// A stored record that cannot be read is treated as absent. A failure
    /// to persist the new hash is logged; the written file is kept.
    pub async fn export(&self, page: &RenderResult) -> Result<ExportedPage, ExportError> {
        let artifact = self.assign_name(page);
        let logical_name = artifact.name();

        let lock = self.name_lock(&logical_name);
        let _guard = lock.lock().await;

        let digest = content_digest(&page.pdf_bytes);
        let prior = self.load_prior(&logical_name);
        let action = decide(self.mode, prior.as_ref(), &digest);

        let (file_name, version) = match &action {
            Action::Skip => {
                tracing::debug!("{} unchanged, not writing", logical_name);
                return Ok(ExportedPage {
                    logical_name,
                    outcome: Outcome::Skipped,
                    path: None,
                });
            }
            Action::Create => (version_file_name(&logical_name, 1), 1),
            Action::Replace { file_name, version } => (file_name.clone(), *version),
            Action::AppendVersion { version } => {
                (version_file_name(&logical_name, *version), *version)
            }
        };

        let path = self.output_dir.join(&file_name);
        write_atomically(&path, &page.pdf_bytes).await?;

        let record = HashRecord {
            logical_name: logical_name.clone(),
            url: page.url.to_string(),
            content_hash: digest,
            pdf_path: file_name,
            version,
            updated_at: page.timestamp.to_rfc3339(),
        };
        let stored = {
            let mut storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
            storage.put_record(&record)
        };
        if let Err(e) = stored {
            tracing::warn!("Failed to record hash for {}: {}", logical_name, e);
        }

        Ok(ExportedPage {
            logical_name,
            outcome: action.outcome(),
            path: Some(path),
        })
    }

    fn assign_name(&self, page: &RenderResult) -> NamedArtifact {
        let base = derive_name(&page.title, &page.url);
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.assign(&page.url, &base)
    }

    fn name_lock(&self, logical_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.name_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(logical_name.to_ascii_lowercase())
            .or_default()
            .clone()
    }

    fn load_prior(&self, logical_name: &str) -> Option<HashRecord> {
        let loaded = {
            let storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
            storage.get_record(logical_name)
        };
        match loaded {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    "Treating {} as new, stored hash unreadable: {}",
                    logical_name,
                    e
                );
                None
            }
        }
    }
}

/// Writes `bytes` to `{path}.part` and renames it into place
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let write_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(&part, bytes).await.map_err(write_err)?;
    if let Err(source) = tokio::fs::rename(&part, path).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(write_err(source));
    }
    Ok(())
}
