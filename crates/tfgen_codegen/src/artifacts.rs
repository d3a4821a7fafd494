//! Output artifacts and write-if-changed persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::aggregate::AggregateOutput;
use crate::error::CodegenResult;

pub const RESOURCES_TF: &str = "resources.tf";
pub const DATA_SOURCES_TF: &str = "data_sources.tf";
pub const RESOURCES_JSON: &str = "resources.json";
pub const DATA_SOURCES_JSON: &str = "data_sources.json";

/// A file to be written into the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub contents: String,
}

impl AggregateOutput {
    /// The four artifacts of a project, manifests pretty-printed.
    pub fn artifacts(&self) -> CodegenResult<[Artifact; 4]> {
        Ok([
            Artifact {
                file_name: RESOURCES_TF,
                contents: self.resources_text.clone(),
            },
            Artifact {
                file_name: DATA_SOURCES_TF,
                contents: self.data_sources_text.clone(),
            },
            Artifact {
                file_name: RESOURCES_JSON,
                contents: serde_json::to_string_pretty(&self.resources_manifest)?,
            },
            Artifact {
                file_name: DATA_SOURCES_JSON,
                contents: serde_json::to_string_pretty(&self.data_sources_manifest)?,
            },
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Created,
    Updated,
    Unchanged,
}

impl ArtifactStatus {
    pub fn is_changed(&self) -> bool {
        !matches!(self, ArtifactStatus::Unchanged)
    }
}

impl std::fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactStatus::Created => write!(f, "created"),
            ArtifactStatus::Updated => write!(f, "updated"),
            ArtifactStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Per-artifact outcome of a write or check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub output_dir: PathBuf,
    pub entries: Vec<(&'static str, ArtifactStatus)>,
    /// False for a dry run.
    pub written: bool,
}

impl WriteReport {
    pub fn changed(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, status)| status.is_changed())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.entries.iter().all(|(_, status)| !status.is_changed())
    }

    pub fn status(&self, file_name: &str) -> Option<ArtifactStatus> {
        self.entries
            .iter()
            .find(|(name, _)| *name == file_name)
            .map(|(_, status)| *status)
    }
}

/// Writes artifacts into a directory, leaving unchanged files untouched.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write every artifact whose content differs from the file on disk.
    pub async fn write(&self, output: &AggregateOutput) -> CodegenResult<WriteReport> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let report = self.process(output, true).await?;
        info!(
            "Wrote {} of 4 artifacts to {:?}",
            report.changed().len(),
            self.output_dir
        );
        Ok(report)
    }

    /// Compare artifacts with the files on disk without writing anything.
    pub async fn check(&self, output: &AggregateOutput) -> CodegenResult<WriteReport> {
        self.process(output, false).await
    }

    /// Compare all artifacts first; write only once every comparison succeeded.
    async fn process(&self, output: &AggregateOutput, write: bool) -> CodegenResult<WriteReport> {
        let artifacts = output.artifacts()?;
        let [resources, data_sources, resources_json, data_sources_json] = &artifacts;

        let (a, b, c, d) = tokio::try_join!(
            self.compare(resources),
            self.compare(data_sources),
            self.compare(resources_json),
            self.compare(data_sources_json),
        )?;
        let entries = vec![
            (resources.file_name, a),
            (data_sources.file_name, b),
            (resources_json.file_name, c),
            (data_sources_json.file_name, d),
        ];

        if write {
            let changed: Vec<&Artifact> = artifacts
                .iter()
                .zip(&entries)
                .filter(|(_, (_, status))| status.is_changed())
                .map(|(artifact, _)| artifact)
                .collect();
            self.commit(&changed).await?;
        }

        Ok(WriteReport {
            output_dir: self.output_dir.clone(),
            entries,
            written: write,
        })
    }

    async fn compare(&self, artifact: &Artifact) -> CodegenResult<ArtifactStatus> {
        let path = self.output_dir.join(artifact.file_name);
        let status = match tokio::fs::read(&path).await {
            Ok(existing) if existing == artifact.contents.as_bytes() => ArtifactStatus::Unchanged,
            Ok(_) => ArtifactStatus::Updated,
            Err(e) if e.kind() == ErrorKind::NotFound => ArtifactStatus::Created,
            Err(e) => return Err(e.into()),
        };

        if status == ArtifactStatus::Unchanged {
            debug!("Skipping unchanged {:?}", path);
        }
        Ok(status)
    }

    /// Stage every changed artifact next to its target, then rename them into place.
    async fn commit(&self, changed: &[&Artifact]) -> CodegenResult<()> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(changed.len());
        for artifact in changed {
            let target = self.output_dir.join(artifact.file_name);
            let staging = staging_path(&target);
            if let Err(e) = tokio::fs::write(&staging, &artifact.contents).await {
                staged.push((staging, target));
                discard(&staged).await;
                return Err(e.into());
            }
            staged.push((staging, target));
        }

        for (staging, target) in &staged {
            debug!("Writing {:?}", target);
            tokio::fs::rename(staging, target).await?;
        }
        Ok(())
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.tmp", name))
}

async fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        if let Err(e) = tokio::fs::remove_file(staging).await {
            debug!("Could not remove staging file {:?}: {}", staging, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn output() -> AggregateOutput {
        let mut output = AggregateOutput {
            resources_text: "resource \"widget\" \"a\" {\n  name = \"x\"\n}\n".to_string(),
            ..Default::default()
        };
        output
            .resources_manifest
            .entry("widget".to_string())
            .or_default()
            .insert("a".to_string(), json!({"name": "x"}));
        output
    }

    #[test]
    fn test_manifest_is_pretty_printed() {
        let [_, _, resources_json, data_sources_json] = output().artifacts().unwrap();
        assert_eq!(
            resources_json.contents,
            "{\n  \"widget\": {\n    \"a\": {\n      \"name\": \"x\"\n    }\n  }\n}"
        );
        assert_eq!(data_sources_json.contents, "{}");
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_files() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("tf_out");
        let writer = ArtifactWriter::new(&out);

        let report = writer.write(&output()).await.unwrap();
        assert_eq!(report.changed().len(), 4);
        assert_eq!(report.status(RESOURCES_TF), Some(ArtifactStatus::Created));
        assert_eq!(
            std::fs::read_to_string(out.join(RESOURCES_TF)).unwrap(),
            output().resources_text
        );
        assert_eq!(std::fs::read_to_string(out.join(DATA_SOURCES_TF)).unwrap(), "");
    }

    #[tokio::test]
    async fn test_rewrite_is_idempotent() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        writer.write(&output()).await.unwrap();

        let again = writer.write(&output()).await.unwrap();
        assert!(again.is_up_to_date());

        let mut changed = output();
        changed.data_sources_text = "data \"acme_zone\" \"z\" {\n}\n".to_string();
        let report = writer.write(&changed).await.unwrap();
        assert_eq!(report.changed(), vec![DATA_SOURCES_TF]);
        assert_eq!(report.status(DATA_SOURCES_TF), Some(ArtifactStatus::Updated));
    }

    #[tokio::test]
    async fn test_check_does_not_write() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        let report = writer.check(&output()).await.unwrap();
        assert!(!report.is_up_to_date());
        assert!(!report.written);
        assert!(!dir.path().join(RESOURCES_TF).exists());

        writer.write(&output()).await.unwrap();
        assert!(writer.check(&output()).await.unwrap().is_up_to_date());
    }

    #[tokio::test]
    async fn test_unreadable_artifact_leaves_others_untouched() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        writer.write(&output()).await.unwrap();

        // A directory in place of a manifest cannot be read back.
        std::fs::remove_file(dir.path().join(DATA_SOURCES_JSON)).unwrap();
        std::fs::create_dir(dir.path().join(DATA_SOURCES_JSON)).unwrap();

        let mut changed = output();
        changed.resources_text = "resource \"widget\" \"b\" {\n  name = \"y\"\n}\n".to_string();
        assert!(writer.write(&changed).await.is_err());

        assert_eq!(
            std::fs::read_to_string(dir.path().join(RESOURCES_TF)).unwrap(),
            output().resources_text
        );
        assert!(!dir.path().join(".resources.tf.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_leaves_no_staging_files() {
        let dir = tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        writer.write(&output()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(names.is_empty());
    }
}
