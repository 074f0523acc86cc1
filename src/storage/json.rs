use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::Expense;

use super::ExpenseStore;

/// Stores the ledger as a JSON array of expense objects in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "expenses.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ExpenseStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Expense>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no expense file yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read expense file: {}", self.path.display())
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        // `null` is what an unset store looks like; treat it as empty
        let expenses: Option<Vec<Expense>> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Malformed expense file: {}", self.path.display()))?;
        let expenses = expenses.unwrap_or_default();

        tracing::debug!(
            path = %self.path.display(),
            count = expenses.len(),
            "loaded expenses from json"
        );
        Ok(expenses)
    }

    async fn save(&self, expenses: &[Expense]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_vec_pretty(expenses)?;
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, json)
            .await
            .with_context(|| format!("Failed to write: {}", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace: {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            count = expenses.len(),
            "saved expenses to json"
        );
        Ok(())
    }
}
