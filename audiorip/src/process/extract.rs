use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use log::{debug, info};

use crate::process::scan::MatchSink;
use crate::process::validate::{AudioFormat, Match};
use crate::utils::errors::{DirectoryCause, ExtractError};
use crate::utils::source::ByteSource;

/// Chunk size used when copying a range into an artifact.
pub const COPY_BLOCK_SIZE: usize = 4096;

pub const OUTPUT_DIR_PREFIX: &str = "AUDIORIP_";

/// Number of directory name indices tried before giving up.
pub const OUTPUT_DIR_ATTEMPTS: usize = 1000;

/// Name of the `index`-th candidate output directory for an input.
pub fn output_dir_name(index: usize, input_name: &str) -> String {
    format!("{OUTPUT_DIR_PREFIX}{index:03}_[{input_name}]")
}

/// Name of the `counter`-th artifact of a format.
pub fn artifact_name(counter: u32, extension: &str) -> String {
    format!("{counter:08}{extension}")
}

/// Creates the first free `AUDIORIP_NNN_[name]` directory below `base`.
pub fn create_output_dir(base: &Path, input_name: &str) -> Result<PathBuf, ExtractError> {
    for index in 0..OUTPUT_DIR_ATTEMPTS {
        let path = base.join(output_dir_name(index, input_name));
        match fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("\"{}\" already exists", path.display());
            }
            Err(source) => {
                return Err(ExtractError::CreateDirectory {
                    cause: DirectoryCause::classify(&source),
                    path,
                    source,
                });
            }
        }
    }

    Err(ExtractError::DirectoryExhausted {
        base: base.to_path_buf(),
        attempts: OUTPUT_DIR_ATTEMPTS,
    })
}

/// Copies `[start, start + length)` of the source into a new file at `path`.
pub fn copy_range(
    source: &mut dyn ByteSource,
    start: u64,
    length: u64,
    path: &Path,
) -> Result<()> {
    if !source.contains(start, length) {
        bail!(ExtractError::InvalidRange {
            start,
            length,
            size: source.size(),
        });
    }

    let mut file = File::create(path).map_err(|source| ExtractError::CreateArtifact {
        path: path.to_path_buf(),
        source,
    })?;

    let mut buf = vec![0u8; COPY_BLOCK_SIZE];
    let end = start + length;
    let mut offset = start;
    while offset < end {
        let n = (end - offset).min(COPY_BLOCK_SIZE as u64) as usize;
        source.read_exact_at(offset, &mut buf[..n])?;
        file.write_all(&buf[..n])
            .map_err(|source| ExtractError::WriteArtifact {
                path: path.to_path_buf(),
                source,
            })?;
        offset += n as u64;
    }

    Ok(())
}

/// Run-wide extraction state: where artifacts go and how they are numbered.
///
/// The output directory is created on first use, so a run that extracts nothing
/// leaves no trace on disk.
#[derive(Debug)]
pub struct ExtractionContext {
    base: PathBuf,
    input_name: String,
    output_dir: Option<PathBuf>,
    counters: HashMap<AudioFormat, u32>,
}

impl ExtractionContext {
    /// `base` is the directory the output directory is created in; `input` names
    /// the scanned file and is only used for the directory name.
    pub fn new(base: impl Into<PathBuf>, input: impl AsRef<Path>) -> Self {
        let input = input.as_ref();
        let input_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        Self {
            base: base.into(),
            input_name,
            output_dir: None,
            counters: HashMap::new(),
        }
    }

    /// The output directory, once it has been created.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Returns the output directory, creating it on the first call.
    pub fn ensure_output_dir(&mut self) -> Result<&Path, ExtractError> {
        let dir = match self.output_dir.take() {
            Some(dir) => dir,
            None => {
                let dir = create_output_dir(&self.base, &self.input_name)?;
                info!("Extraction dir \"{}\" created", dir.display());
                dir
            }
        };
        Ok(self.output_dir.insert(dir).as_path())
    }

    /// Hands out the next artifact number of `format`, starting at 0.
    pub fn next_counter(&mut self, format: AudioFormat) -> u32 {
        let counter = self.counters.entry(format).or_insert(0);
        let current = *counter;
        *counter += 1;
        current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Copy every match into the output directory.
    Extract,
    /// Only report matches; nothing is written.
    ScanOnly,
}

/// One handled match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArtifact {
    pub name: String,
    /// Written file, `None` in scan-only mode.
    pub path: Option<PathBuf>,
    pub found: Match,
}

/// [`MatchSink`] that writes each match to its own numbered file.
#[derive(Debug)]
pub struct Extractor<'a> {
    context: &'a mut ExtractionContext,
    mode: ExtractMode,
    artifacts: Vec<ExtractedArtifact>,
}

impl<'a> Extractor<'a> {
    pub fn new(context: &'a mut ExtractionContext, mode: ExtractMode) -> Self {
        Self {
            context,
            mode,
            artifacts: Vec::new(),
        }
    }

    pub fn artifacts(&self) -> &[ExtractedArtifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<ExtractedArtifact> {
        self.artifacts
    }

    /// Handles one match: in extract mode its range is copied into the output
    /// directory, which is created first if needed.
    pub fn extract(
        &mut self,
        source: &mut dyn ByteSource,
        found: &Match,
    ) -> Result<&ExtractedArtifact> {
        if !source.contains(found.start, found.length) {
            bail!(ExtractError::InvalidRange {
                start: found.start,
                length: found.length,
                size: source.size(),
            });
        }

        let counter = self.context.next_counter(found.format());
        let name = artifact_name(counter, found.kind.extension());

        let path = match self.mode {
            ExtractMode::ScanOnly => {
                info!(" At position {}, bytes: {}", found.start, found.length);
                None
            }
            ExtractMode::Extract => {
                let path = self.context.ensure_output_dir()?.join(&name);
                copy_range(source, found.start, found.length, &path)?;
                info!(
                    " Extracted \"{name}\" from position {}, bytes: {}",
                    found.start, found.length
                );
                Some(path)
            }
        };

        self.artifacts.push(ExtractedArtifact {
            name,
            path,
            found: *found,
        });
        Ok(&self.artifacts[self.artifacts.len() - 1])
    }
}

impl MatchSink for Extractor<'_> {
    fn accept(&mut self, source: &mut dyn ByteSource, found: &Match) -> Result<()> {
        self.extract(source, found)?;
        Ok(())
    }
}
