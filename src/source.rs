use std::io::Read;
use std::path::{Path, PathBuf};

use crate::document::DocumentRecord;
use crate::error::SourceError;

/// Anything that can yield raw documents for the knowledge base
pub trait DocumentSource {
    /// Short label used in logs
    fn name(&self) -> &str;

    fn load(&self) -> Result<Vec<DocumentRecord>, SourceError>;
}

// ---- Built-in sample data ----

/// Fixed medical sample documents, useful for smoke runs and tests
pub struct SampleSource;

impl DocumentSource for SampleSource {
    fn name(&self) -> &str {
        "sample"
    }

    fn load(&self) -> Result<Vec<DocumentRecord>, SourceError> {
        let records = SAMPLE_DATA
            .iter()
            .enumerate()
            .map(|(idx, (title, content, source, category))| DocumentRecord {
                id: Some(format!("doc_{}", idx)),
                title: title.to_string(),
                content: content.to_string(),
                source: source.to_string(),
                category: category.to_string(),
            })
            .collect();
        Ok(records)
    }
}

const SAMPLE_DATA: &[(&str, &str, &str, &str)] = &[
    (
        "Type 2 Diabetes",
        "
        Type 2 diabetes is a chronic condition that affects the way the body processes blood sugar (glucose).
        In this type, the body resists insulin or does not produce enough of it.

        Symptoms:
        - Increased thirst
        - Frequent urination
        - Fatigue
        - Blurred vision

        Risk factors:
        - Obesity
        - Age (45 years and older)
        - Family history
        - Physical inactivity

        Treatment:
        - Lifestyle changes (diet and exercise)
        - Medication (metformin and others)
        - Regular blood sugar monitoring
        ",
        "MedlinePlus",
        "Endocrine System",
    ),
    (
        "Cardiovascular Disease",
        "
        Cardiovascular diseases are a group of conditions that affect the heart and blood vessels.
        They include heart failure, arterial disease and stroke.

        Common symptoms:
        - Chest pain
        - Shortness of breath
        - Dizziness
        - Fatigue

        Prevention:
        - Regular physical exercise
        - A healthy diet low in salt and fat
        - Not smoking
        - Stress management

        Diagnosis:
        - Electrocardiogram (ECG)
        - Echocardiography
        - Blood tests
        ",
        "MedlinePlus",
        "Blood, Heart and Circulation",
    ),
];

// ---- JSON ----

/// JSON array of document records, read from a file or from stdin (`-`)
pub struct JsonSource {
    path: PathBuf,
    label: String,
}

impl JsonSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = path.display().to_string();
        Self { path, label }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    fn read_raw(&self) -> Result<String, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.label.clone(),
            source,
        };
        if self.is_stdin() {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input).map_err(io_err)?;
            Ok(input)
        } else {
            std::fs::read_to_string(&self.path).map_err(io_err)
        }
    }
}

impl DocumentSource for JsonSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn load(&self) -> Result<Vec<DocumentRecord>, SourceError> {
        let raw = self.read_raw()?;
        parse_records(&raw, &self.label)
    }
}

/// Parses a JSON array of records, rejecting untitled entries
pub fn parse_records(raw: &str, label: &str) -> Result<Vec<DocumentRecord>, SourceError> {
    let records: Vec<DocumentRecord> =
        serde_json::from_str(raw).map_err(|source| SourceError::Json {
            path: label.to_string(),
            source,
        })?;

    if let Some(index) = records.iter().position(|r| r.title.trim().is_empty()) {
        return Err(SourceError::EmptyTitle {
            path: label.to_string(),
            index,
        });
    }

    Ok(records)
}

/// Keeps records whose category matches, ignoring case (Unicode-aware)
pub fn filter_category(records: Vec<DocumentRecord>, category: &str) -> Vec<DocumentRecord> {
    let wanted = category.trim().to_lowercase();
    records
        .into_iter()
        .filter(|r| r.category.trim().to_lowercase() == wanted)
        .collect()
}

/// Restricts another source to a single category
pub struct FilteredSource<'a> {
    inner: &'a dyn DocumentSource,
    category: &'a str,
}

impl<'a> FilteredSource<'a> {
    pub fn new(inner: &'a dyn DocumentSource, category: &'a str) -> Self {
        Self { inner, category }
    }
}

impl DocumentSource for FilteredSource<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn load(&self) -> Result<Vec<DocumentRecord>, SourceError> {
        Ok(filter_category(self.inner.load()?, self.category))
    }
}
