use std::path::Path;

use anyhow::{Context, Result, bail};
use audiorip::process::extract::{ExtractMode, ExtractedArtifact, ExtractionContext, Extractor};
use audiorip::process::scan::{MatchSink, ScanStats, scan};
use audiorip::process::validate::{AudioFormat, Match};
use audiorip::utils::errors::ExtractError;
use audiorip::utils::source::{ByteSource, FileSource};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::Cli;
use crate::report::ScanReport;

/// Extractor wrapper that also drives the pass's progress bar.
struct RipSink<'a> {
    extractor: Extractor<'a>,
    bar: Option<ProgressBar>,
}

impl MatchSink for RipSink<'_> {
    fn accept(&mut self, source: &mut dyn ByteSource, found: &Match) -> Result<()> {
        self.extractor.extract(source, found)?;
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} found", self.extractor.artifacts().len()));
        }
        Ok(())
    }

    fn progress(&mut self, position: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(position);
        }
    }
}

struct PassOutcome {
    artifacts: Vec<ExtractedArtifact>,
    result: Result<ScanStats>,
}

pub fn cmd_rip(cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let mut source = FileSource::open(&cli.input)
        .with_context(|| format!("Can't open input file \"{}\"", cli.input.display()))?;
    let size = source.size();
    log::info!("Scanning \"{}\" ({size} bytes)", cli.input.display());

    let mode = if cli.scan_only {
        ExtractMode::ScanOnly
    } else {
        ExtractMode::Extract
    };
    let mut context = ExtractionContext::new(&cli.output_path, &cli.input);
    let mut report = ScanReport::new(&cli.input, size, cli.scan_only);
    let mut failed = Vec::new();

    for format in cli.formats() {
        let bar = multi
            .map(|multi| create_progress_bar(multi, size, format))
            .transpose()?;
        let outcome = run_pass(&mut source, format, &mut context, mode, bar);
        report.push_pass(format, &outcome.artifacts, &outcome.result);

        match outcome.result {
            Ok(_) => println!("{}", pass_summary(format, outcome.artifacts.len(), mode)),
            Err(e) => {
                log::error!("{format} pass aborted: {e:#}");
                failed.push(format);
                if stops_run(&e, cli.strict) {
                    break;
                }
            }
        }
    }

    report.set_output_dir(context.output_dir());
    if let Some(path) = &cli.report {
        report.write(path)?;
    }
    println!("{}", final_line(mode, context.output_dir()));

    if !failed.is_empty() {
        let names: Vec<String> = failed.iter().map(ToString::to_string).collect();
        bail!("Scan failed for: {}", names.join(", "));
    }

    Ok(())
}

fn run_pass(
    source: &mut FileSource,
    format: AudioFormat,
    context: &mut ExtractionContext,
    mode: ExtractMode,
    bar: Option<ProgressBar>,
) -> PassOutcome {
    let validator = format.validator();
    let mut sink = RipSink {
        extractor: Extractor::new(context, mode),
        bar,
    };

    let result = scan(source, validator.as_ref(), &mut sink);

    if let Some(bar) = &sink.bar {
        bar.finish_and_clear();
    }

    PassOutcome {
        artifacts: sink.extractor.into_artifacts(),
        result,
    }
}

/// Whether a failed pass ends the run. A lost output directory ends it even when
/// not in strict mode.
fn stops_run(error: &anyhow::Error, strict: bool) -> bool {
    strict
        || error
            .downcast_ref::<ExtractError>()
            .is_some_and(ExtractError::is_directory_failure)
}

fn pass_summary(format: AudioFormat, count: usize, mode: ExtractMode) -> String {
    let verb = match mode {
        ExtractMode::Extract => "found/extracted",
        ExtractMode::ScanOnly => "found",
    };
    format!(">>> Finished: {count} {} files {verb}", format.label())
}

fn final_line(mode: ExtractMode, output_dir: Option<&Path>) -> String {
    match (mode, output_dir) {
        (ExtractMode::ScanOnly, _) => ">>>>>  Scan mode, nothing extracted".to_string(),
        (ExtractMode::Extract, Some(dir)) => {
            format!(">>>>>  Extraction dir: \"{}\"", dir.display())
        }
        (ExtractMode::Extract, None) => ">>>>>  Nothing extracted".to_string(),
    }
}

fn create_progress_bar(
    multi: &MultiProgress,
    size: u64,
    format: AudioFormat,
) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(size));
    pb.set_style(ProgressStyle::with_template(
        "{prefix} {bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    pb.set_prefix(format.to_string());
    pb.set_message("0 found");
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as ClapParser;
    use std::fs;
    use std::path::PathBuf;

    fn wave(data_len: u32) -> Vec<u8> {
        let mut blob = b"RIFF".to_vec();
        blob.extend_from_slice(&(data_len + 4).to_le_bytes());
        blob.extend_from_slice(b"WAVE");
        blob.extend((0..data_len).map(|i| (i % 13) as u8));
        blob
    }

    fn write_input(dir: &Path) -> Result<(PathBuf, Vec<u8>)> {
        let mut data = vec![0x20u8; 700];
        data.extend(wave(6000));
        data.extend(vec![0x20u8; 33]);
        let path = dir.join("dump.bin");
        fs::write(&path, &data)?;
        Ok((path, data))
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("audiorip").chain(args.iter().copied()))
    }

    #[test]
    fn test_extracts_into_numbered_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (input, data) = write_input(dir.path())?;
        let out = dir.path().join("out");
        fs::create_dir(&out)?;
        let report = dir.path().join("scan.yaml");

        cmd_rip(
            &cli(&[
                input.to_str().unwrap(),
                "-o",
                out.to_str().unwrap(),
                "--report",
                report.to_str().unwrap(),
            ]),
            None,
        )?;

        let extracted = fs::read(out.join("AUDIORIP_000_[dump.bin]").join("00000000.wav"))?;
        assert_eq!(extracted, &data[700..700 + 6012]);

        let yaml = fs::read_to_string(&report)?;
        assert!(yaml.contains("file: 00000000.wav"));
        assert!(yaml.contains("offset: 700"));
        assert!(yaml.contains("length: 6012"));
        Ok(())
    }

    #[test]
    fn test_scan_only_leaves_output_untouched() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (input, _) = write_input(dir.path())?;
        let out = dir.path().join("out");
        fs::create_dir(&out)?;

        cmd_rip(
            &cli(&[input.to_str().unwrap(), "-s", "-o", out.to_str().unwrap()]),
            None,
        )?;

        assert_eq!(fs::read_dir(&out)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");

        let err = cmd_rip(&cli(&[missing.to_str().unwrap()]), None).unwrap_err();
        assert!(err.to_string().contains("Can't open input file"));
    }

    #[test]
    fn test_unusable_output_directory_fails_run() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (input, _) = write_input(dir.path())?;
        let out = dir.path().join("missing").join("parent");

        let err = cmd_rip(
            &cli(&[input.to_str().unwrap(), "--wav", "-o", out.to_str().unwrap()]),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("MS Riff Wave"));
        Ok(())
    }

    #[test]
    fn test_failure_policy() {
        let dir_failure = anyhow::Error::from(ExtractError::DirectoryExhausted {
            base: PathBuf::from("."),
            attempts: 1000,
        });
        let write_failure = anyhow::anyhow!("disk full");

        assert!(stops_run(&dir_failure, false));
        assert!(!stops_run(&write_failure, false));
        assert!(stops_run(&write_failure, true));
    }

    #[test]
    fn test_console_lines() {
        assert_eq!(
            pass_summary(AudioFormat::Mpeg, 3, ExtractMode::Extract),
            ">>> Finished: 3 MPEG files found/extracted"
        );
        assert_eq!(
            pass_summary(AudioFormat::Wav, 0, ExtractMode::ScanOnly),
            ">>> Finished: 0 .wav files found"
        );
        assert_eq!(
            final_line(ExtractMode::ScanOnly, None),
            ">>>>>  Scan mode, nothing extracted"
        );
        assert_eq!(
            final_line(ExtractMode::Extract, Some(Path::new("out/AUDIORIP_000_[a]"))),
            ">>>>>  Extraction dir: \"out/AUDIORIP_000_[a]\""
        );
    }
}
