use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{SurveyRecord, SurveyResult};

const ID_PREFIX: &str = "survey_";
const FILE_EXTENSION: &str = "json";

/// Identifier of a persisted survey: `survey_<storeName>_<timestamp>`.
///
/// The timestamp is ISO 8601 with `:` and `.` replaced by `-`, so the id is
/// usable as a file stem and still sorts by submission time per store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurveyId(pub String);

impl SurveyId {
    pub fn new(store_name: &str, submitted_at: DateTime<Utc>) -> Self {
        let stamp = submitted_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        SurveyId(format!("{ID_PREFIX}{}_{stamp}", sanitize_store_name(store_name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Submission time embedded in the id, when it carries a well-formed stamp.
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        let stamp = self.0.rsplit('_').next()?;
        let (date, time) = stamp.split_once('T')?;
        let time = time.strip_suffix('Z')?;
        let mut parts = time.split('-');
        let (hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
        let rfc3339 = match parts.next() {
            Some(millis) => format!("{date}T{hours}:{minutes}:{seconds}.{millis}Z"),
            None => format!("{date}T{hours}:{minutes}:{seconds}Z"),
        };

        DateTime::parse_from_rfc3339(&rfc3339)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }

    /// Ids are file stems; anything that could escape the survey directory is
    /// rejected.
    pub fn validate(&self) -> Result<(), StoreError> {
        let id = self.0.as_str();
        let hostile = matches!(id, "" | "." | "..")
            || id.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
        if hostile {
            Err(StoreError::InvalidId(id.to_string()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurveyId {
    fn from(value: &str) -> Self {
        SurveyId(value.to_string())
    }
}

fn sanitize_store_name(store_name: &str) -> String {
    store_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// Key-value persistence for submitted surveys.
pub trait SurveyStore: Send + Sync {
    fn put(&self, id: &SurveyId, record: &SurveyRecord) -> Result<SurveyResult, StoreError>;
    /// All stored results, newest first.
    fn list(&self) -> Result<Vec<SurveyResult>, StoreError>;
    fn delete(&self, id: &SurveyId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("survey not found: {0}")]
    NotFound(String),
    #[error("invalid survey id '{0}'")]
    InvalidId(String),
    #[error("survey store unavailable: {0}")]
    Unavailable(String),
}

/// One pretty-printed JSON file per survey inside a single directory.
#[derive(Debug, Clone)]
pub struct FileSurveyStore {
    dir: PathBuf,
}

impl FileSurveyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SurveyId) -> PathBuf {
        self.dir.join(format!("{}.{FILE_EXTENSION}", id.as_str()))
    }

    fn read_result(&self, path: &Path) -> Result<SurveyResult, StoreError> {
        let id = path
            .file_stem()
            .map(|stem| SurveyId(stem.to_string_lossy().into_owned()))
            .ok_or_else(|| StoreError::InvalidId(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        let record: SurveyRecord = serde_json::from_slice(&bytes)?;

        let submitted_at = match id.submitted_at() {
            Some(at) => at,
            None => fs::metadata(path)
                .and_then(|meta| meta.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now()),
        };

        Ok(SurveyResult {
            id: id.0,
            submitted_at,
            record,
        })
    }
}

impl SurveyStore for FileSurveyStore {
    fn put(&self, id: &SurveyId, record: &SurveyRecord) -> Result<SurveyResult, StoreError> {
        id.validate()?;
        fs::create_dir_all(&self.dir)?;

        let bytes = serde_json::to_vec_pretty(record)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        let path = self.path_for(id);
        tmp.persist(&path).map_err(|err| StoreError::Io(err.error))?;
        debug!(path = %path.display(), "survey persisted");

        Ok(SurveyResult {
            id: id.0.clone(),
            submitted_at: id.submitted_at().unwrap_or_else(Utc::now),
            record: record.clone(),
        })
    }

    fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "no survey directory yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        let mut results = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(FILE_EXTENSION));
            if !is_json || !path.is_file() {
                continue;
            }

            match self.read_result(&path) {
                Ok(result) => results.push(result),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable survey"),
            }
        }

        results.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(results)
    }

    fn delete(&self, id: &SurveyId) -> Result<(), StoreError> {
        id.validate()?;
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id.0.clone())),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}
