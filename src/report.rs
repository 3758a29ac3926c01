use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use audiorip::process::extract::ExtractedArtifact;
use audiorip::process::scan::ScanStats;
use audiorip::process::validate::AudioFormat;
use serde::Serialize;

/// Machine-readable summary of one run, written with `--report`.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    input: PathBuf,
    input_size: u64,
    scan_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
    passes: Vec<PassReport>,
}

#[derive(Debug, Serialize)]
pub struct PassReport {
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<PassStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    streams: Vec<StreamRecord>,
}

#[derive(Debug, Serialize)]
pub struct PassStats {
    candidates: u64,
    rejected: u64,
    matches: u64,
    bytes_matched: u64,
}

#[derive(Debug, Serialize)]
pub struct StreamRecord {
    /// Artifact file name; absent in scan-only mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    offset: u64,
    length: u64,
    kind: String,
}

impl From<&ScanStats> for PassStats {
    fn from(stats: &ScanStats) -> Self {
        Self {
            candidates: stats.candidates,
            rejected: stats.rejected,
            matches: stats.matches,
            bytes_matched: stats.bytes_matched,
        }
    }
}

impl From<&ExtractedArtifact> for StreamRecord {
    fn from(artifact: &ExtractedArtifact) -> Self {
        Self {
            file: artifact.path.as_ref().map(|_| artifact.name.clone()),
            offset: artifact.found.start,
            length: artifact.found.length,
            kind: artifact.found.kind.to_string(),
        }
    }
}

impl ScanReport {
    pub fn new(input: &Path, input_size: u64, scan_only: bool) -> Self {
        Self {
            input: input.to_path_buf(),
            input_size,
            scan_only,
            output_dir: None,
            passes: Vec::new(),
        }
    }

    pub fn set_output_dir(&mut self, dir: Option<&Path>) {
        self.output_dir = dir.map(Path::to_path_buf);
    }

    /// Records a pass. `result` holds the statistics of a completed pass or the
    /// error that aborted it; `artifacts` are the matches handled either way.
    pub fn push_pass(
        &mut self,
        format: AudioFormat,
        artifacts: &[ExtractedArtifact],
        result: &Result<ScanStats>,
    ) {
        let (stats, error) = match result {
            Ok(stats) => (Some(stats.into()), None),
            Err(e) => (None, Some(format!("{e:#}"))),
        };

        self.passes.push(PassReport {
            format: format.to_string(),
            stats,
            error,
            streams: artifacts.iter().map(StreamRecord::from).collect(),
        });
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Can't write report \"{}\"", path.display()))?;
        log::info!("Report written to \"{}\"", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiorip::process::validate::{Match, StreamKind};

    fn artifact(name: &str, extracted: bool, start: u64) -> ExtractedArtifact {
        ExtractedArtifact {
            name: name.to_string(),
            path: extracted.then(|| PathBuf::from("out").join(name)),
            found: Match {
                start,
                length: 1012,
                kind: StreamKind::Wav { declared_len: 1012 },
            },
        }
    }

    #[test]
    fn test_report_lists_passes_and_streams() -> Result<()> {
        let mut report = ScanReport::new(Path::new("dump.bin"), 4096, false);
        report.set_output_dir(Some(Path::new("out")));

        let stats = ScanStats {
            candidates: 3,
            rejected: 1,
            matches: 2,
            bytes_matched: 2024,
        };
        report.push_pass(
            AudioFormat::Wav,
            &[artifact("00000000.wav", true, 10), artifact("00000001.wav", true, 2000)],
            &Ok(stats),
        );
        report.push_pass(
            AudioFormat::Mpeg,
            &[],
            &Err(anyhow::anyhow!("Can't create file \"out/00000000.mp3\"")),
        );

        let yaml = report.to_yaml()?;
        assert!(yaml.contains("input: dump.bin"));
        assert!(yaml.contains("output_dir: out"));
        assert!(yaml.contains("format: MS Riff Wave"));
        assert!(yaml.contains("file: 00000001.wav"));
        assert!(yaml.contains("offset: 2000"));
        assert!(yaml.contains("bytes_matched: 2024"));
        assert!(yaml.contains("RIFF WAVE, declared size: 1012"));
        assert!(yaml.contains("error:"));
        Ok(())
    }

    #[test]
    fn test_scan_only_streams_have_no_file() -> Result<()> {
        let mut report = ScanReport::new(Path::new("dump.bin"), 4096, true);
        report.push_pass(
            AudioFormat::Wav,
            &[artifact("00000000.wav", false, 10)],
            &Ok(ScanStats::default()),
        );

        let yaml = report.to_yaml()?;
        assert!(yaml.contains("scan_only: true"));
        assert!(!yaml.contains("file:"));
        assert!(!yaml.contains("output_dir"));
        Ok(())
    }
}
