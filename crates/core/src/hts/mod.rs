//! Driver for the external parametric synthesis engine.
//!
//! Builds the engine command line from a default parameter table merged
//! with voice- and utterance-level overrides, materializes the label list
//! to a scoped temporary file, runs the engine, and reads back per-phone
//! durations, the waveform, and (for tone voices) the generated log-F0.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::hrg::Utterance;
use crate::labels::htk_int_to_float;
use crate::track::Track;
use crate::waveform::Waveform;

/// Spacing of generated F0 frames (seconds), tied to the engine's 80
/// sample frame period at 16 kHz.
pub const F0_FRAME_SHIFT: f64 = 0.005;

/// One engine parameter value. Unset/zero/empty values are omitted from
/// the command line; `Flag(true)` renders as a bare option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parm {
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Parm {
    fn is_set(&self) -> bool {
        match self {
            Parm::Flag(b) => *b,
            Parm::Int(i) => *i != 0,
            Parm::Float(f) => *f != 0.0,
            Parm::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Parm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parm::Flag(_) => Ok(()),
            Parm::Int(i) => write!(f, "{i}"),
            Parm::Float(v) => write!(f, "{v}"),
            Parm::Text(s) => write!(f, "{s}"),
        }
    }
}

pub type ParmMap = BTreeMap<String, Option<Parm>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub bin: PathBuf,
    pub models_dir: PathBuf,
    pub parms: ParmMap,
    /// Tone variant: request and ingest the generated log-F0 stream.
    pub read_f0: bool,
}

fn text(s: &str) -> Option<Parm> {
    Some(Parm::Text(s.to_string()))
}

impl EngineConfig {
    /// The default parameter table. Model files live under
    /// `{models_dir}`; `{lab_out}`, `{wav_out}` and `{f0_out}` are bound
    /// to scoped temporaries at synthesis time.
    pub fn new(bin: &Path, models_dir: &Path) -> Self {
        let mut parms = ParmMap::new();
        parms.insert("-td".into(), text("{models_dir}/tree-dur.inf"));
        parms.insert("-tm".into(), text("{models_dir}/tree-mgc.inf"));
        parms.insert("-tf".into(), text("{models_dir}/tree-lf0.inf"));
        parms.insert("-tl".into(), None);
        parms.insert("-md".into(), text("{models_dir}/dur.pdf"));
        parms.insert("-mm".into(), text("{models_dir}/mgc.pdf"));
        parms.insert("-mf".into(), text("{models_dir}/lf0.pdf"));
        parms.insert("-ml".into(), None);
        parms.insert(
            "-dm".into(),
            text("{models_dir}/mgc.win1 -dm {models_dir}/mgc.win2 -dm {models_dir}/mgc.win3"),
        );
        parms.insert(
            "-df".into(),
            text("{models_dir}/lf0.win1 -df {models_dir}/lf0.win2 -df {models_dir}/lf0.win3"),
        );
        parms.insert("-dl".into(), None);
        parms.insert("-od".into(), text("{lab_out}"));
        parms.insert("-om".into(), None);
        parms.insert("-of".into(), None);
        parms.insert("-ol".into(), None);
        parms.insert("-or".into(), None);
        parms.insert("-ow".into(), text("{wav_out}"));
        parms.insert("-ot".into(), None);
        parms.insert("-qp".into(), None);
        parms.insert("-vp".into(), Some(Parm::Flag(false)));
        parms.insert("-i".into(), None);
        parms.insert("-s".into(), Some(Parm::Int(16000)));
        parms.insert("-p".into(), Some(Parm::Int(80)));
        parms.insert("-a".into(), Some(Parm::Float(0.42)));
        parms.insert("-g".into(), Some(Parm::Int(0)));
        parms.insert("-b".into(), Some(Parm::Float(0.0)));
        parms.insert("-l".into(), Some(Parm::Flag(true)));
        parms.insert("-r".into(), Some(Parm::Float(1.0)));
        parms.insert("-fm".into(), None);
        parms.insert("-u".into(), None);
        parms.insert("-em".into(), text("{models_dir}/tree-gv-mgc.inf"));
        parms.insert("-ef".into(), text("{models_dir}/tree-gv-lf0.inf"));
        parms.insert("-el".into(), None);
        parms.insert("-cm".into(), text("{models_dir}/gv-mgc.pdf"));
        parms.insert("-cf".into(), text("{models_dir}/gv-lf0.pdf"));
        parms.insert("-cl".into(), None);
        parms.insert("-jm".into(), None);
        parms.insert("-jf".into(), None);
        parms.insert("-jl".into(), None);
        parms.insert("-k".into(), text("{models_dir}/gv-switch.inf"));
        parms.insert("-z".into(), None);
        EngineConfig {
            bin: bin.to_path_buf(),
            models_dir: models_dir.to_path_buf(),
            parms,
            read_f0: false,
        }
    }

    /// Defaults overlaid with per-utterance overrides.
    pub fn merged(&self, overrides: &ParmMap) -> ParmMap {
        let mut merged = self.parms.clone();
        for (k, v) in overrides {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Render the argument vector: unset or falsy parameters are
    /// skipped, flags are bare, and text values are substituted and
    /// whitespace-split (multi-window values repeat their option).
    pub fn build_args(parms: &ParmMap, subst: &[(&str, String)]) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in parms {
            let value = match value {
                Some(v) if v.is_set() => v,
                _ => continue,
            };
            args.push(key.clone());
            if let Parm::Flag(_) = value {
                continue;
            }
            let mut rendered = value.to_string();
            for (name, replacement) in subst {
                rendered = rendered.replace(&format!("{{{name}}}"), replacement);
            }
            args.extend(rendered.split_whitespace().map(str::to_string));
        }
        args
    }

    /// Run the engine over `utt.labels`, writing per-phone end times back
    /// onto the Segment relation and the waveform (and optionally the F0
    /// track) onto the utterance. All temporaries are released on every
    /// exit path.
    pub fn synthesize(&self, utt: &mut Utterance) -> Result<()> {
        if utt.labels.is_empty() {
            bail!("utterance has no labels");
        }

        let mut lab_in = NamedTempFile::new().context("Failed to create label tempfile")?;
        let wav_out = NamedTempFile::new().context("Failed to create wav tempfile")?;
        let dur_out = NamedTempFile::new().context("Failed to create duration tempfile")?;
        let f0_out = NamedTempFile::new().context("Failed to create f0 tempfile")?;

        lab_in
            .write_all(utt.labels.join("\n").as_bytes())
            .context("Failed to write label file")?;
        lab_in.flush().context("Failed to flush label file")?;

        let mut parms = self.merged(&utt.engine_overrides);
        if self.read_f0 && !matches!(parms.get("-of"), Some(Some(p)) if p.is_set()) {
            parms.insert("-of".into(), text("{f0_out}"));
        }

        let subst = [
            ("models_dir", self.models_dir.display().to_string()),
            ("lab_out", dur_out.path().display().to_string()),
            ("wav_out", wav_out.path().display().to_string()),
            ("f0_out", f0_out.path().display().to_string()),
        ];
        let mut args = Self::build_args(&parms, &subst);
        args.push(lab_in.path().display().to_string());

        log::debug!("running engine: {} {}", self.bin.display(), args.join(" "));
        let status = Command::new(&self.bin)
            .args(&args)
            .status()
            .with_context(|| format!("Failed to run engine: {}", self.bin.display()))?;
        if !status.success() {
            bail!("engine exited with {status}");
        }

        let durations = std::fs::read_to_string(dur_out.path())
            .context("Failed to read engine duration output")?;
        apply_durations(utt, &durations)?;

        utt.waveform =
            Some(Waveform::read(wav_out.path()).context("Failed to read engine waveform")?);

        if self.read_f0 {
            let bytes =
                std::fs::read(f0_out.path()).context("Failed to read engine log-F0 output")?;
            utt.f0 = Some(lf0_to_track(&bytes));
        }
        Ok(())
    }
}

/// Parse the engine's per-phone duration output (start/end in 100 ns
/// units, one line per phone) and write end times in seconds onto the
/// Segment relation.
pub fn apply_durations(utt: &mut Utterance, text: &str) -> Result<()> {
    let ends: Vec<f64> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let end: i64 = line
                .split_whitespace()
                .nth(1)
                .with_context(|| format!("duration line too short: '{line}'"))?
                .parse()
                .with_context(|| format!("bad duration line: '{line}'"))?;
            Ok(htk_int_to_float(end))
        })
        .collect::<Result<_>>()?;
    let segs = utt.items_named("Segment");
    if segs.len() != ends.len() {
        bail!("engine produced {} durations for {} segments", ends.len(), segs.len());
    }
    for (seg, end) in segs.into_iter().zip(ends) {
        utt.set_feature(seg, "end", end);
    }
    Ok(())
}

/// Decode a little-endian f32 log-F0 stream into a 5 ms-spaced track of
/// semitones re 1 Hz; unvoiced frames stay 0.
pub fn lf0_to_track(bytes: &[u8]) -> Track {
    let values: Vec<f64> = bytes
        .chunks_exact(4)
        .map(|chunk| {
            let lf0 = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64;
            let hz = lf0.exp();
            if hz > 0.0 {
                12.0 * hz.log2()
            } else {
                0.0
            }
        })
        .collect();
    Track::evenly_spaced(values, F0_FRAME_SHIFT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voices::english_voice;

    fn config() -> EngineConfig {
        EngineConfig::new(Path::new("hts_engine"), Path::new("/models/en"))
    }

    #[test]
    fn test_default_table() {
        let cfg = config();
        assert_eq!(cfg.parms["-s"], Some(Parm::Int(16000)));
        assert_eq!(cfg.parms["-p"], Some(Parm::Int(80)));
        assert_eq!(cfg.parms["-a"], Some(Parm::Float(0.42)));
        assert_eq!(cfg.parms["-g"], Some(Parm::Int(0)));
        assert_eq!(cfg.parms["-tl"], None);
        assert_eq!(cfg.parms["-l"], Some(Parm::Flag(true)));
    }

    #[test]
    fn test_merge_overrides() {
        let cfg = config();
        let mut overrides = ParmMap::new();
        overrides.insert("-r".into(), Some(Parm::Float(1.5)));
        overrides.insert("-ow".into(), None);
        let merged = cfg.merged(&overrides);
        assert_eq!(merged["-r"], Some(Parm::Float(1.5)));
        assert_eq!(merged["-ow"], None);
        // Untouched defaults survive.
        assert_eq!(merged["-s"], Some(Parm::Int(16000)));
    }

    #[test]
    fn test_build_args_skips_unset_and_falsy() {
        let cfg = config();
        let subst = [
            ("models_dir", "/models/en".to_string()),
            ("lab_out", "/tmp/d".to_string()),
            ("wav_out", "/tmp/w".to_string()),
            ("f0_out", "/tmp/f".to_string()),
        ];
        let args = EngineConfig::build_args(&cfg.parms, &subst);
        // Zero-valued numerics and unset entries do not appear.
        assert!(!args.contains(&"-g".to_string()));
        assert!(!args.contains(&"-b".to_string()));
        assert!(!args.contains(&"-tl".to_string()));
        assert!(!args.contains(&"-vp".to_string()));
        // Flags are bare; -l is followed by another option, not a value.
        let l = args.iter().position(|a| a == "-l").unwrap();
        assert!(args[l + 1].starts_with('-'));
        // Substitution applied.
        let td = args.iter().position(|a| a == "-td").unwrap();
        assert_eq!(args[td + 1], "/models/en/tree-dur.inf");
    }

    #[test]
    fn test_multi_window_args_repeat_option() {
        let cfg = config();
        let subst = [("models_dir", "/m".to_string())];
        let args = EngineConfig::build_args(&cfg.parms, &subst);
        let count = args.iter().filter(|a| *a == "-dm").count();
        assert_eq!(count, 3);
        let first = args.iter().position(|a| a == "-dm").unwrap();
        assert_eq!(args[first + 1], "/m/mgc.win1");
    }

    #[test]
    fn test_apply_durations() {
        let voice = english_voice();
        let mut utt = voice.synthesize("hello", "text-to-segments").unwrap();
        let n = utt.items_named("Segment").len();
        let text: String = (0..n)
            .map(|i| format!("{} {} x\n", i * 1_000_000, (i + 1) * 1_000_000))
            .collect();
        apply_durations(&mut utt, &text).unwrap();
        let segs = utt.items_named("Segment");
        let end = utt.feature(segs[n - 1], "end").and_then(|v| v.as_float()).unwrap();
        assert!((end - n as f64 * 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_apply_durations_count_mismatch() {
        let voice = english_voice();
        let mut utt = voice.synthesize("hello", "text-to-segments").unwrap();
        assert!(apply_durations(&mut utt, "0 1000000 x\n").is_err());
    }

    #[test]
    fn test_lf0_decoding() {
        // Two voiced frames at 220 Hz and 110 Hz, one unvoiced.
        let lf0s: Vec<f32> = vec![(220.0f32).ln(), -1.0e10, (110.0f32).ln()];
        let bytes: Vec<u8> = lf0s.iter().flat_map(|v| v.to_le_bytes()).collect();
        let track = lf0_to_track(&bytes);
        assert_eq!(track.len(), 3);
        assert!((track.frames[0][0] - 12.0 * (220.0f64).log2()).abs() < 1e-3);
        assert_eq!(track.frames[1][0], 0.0);
        // An octave apart differs by 12 semitones.
        assert!((track.frames[0][0] - track.frames[2][0] - 12.0).abs() < 1e-3);
        assert!((track.times[2] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_engine_failure_leaves_symbolic_content() {
        let voice = english_voice();
        let mut utt = voice.synthesize("hello", "text-to-segments").unwrap();
        utt.labels = vec!["dummy".into()];
        let cfg = EngineConfig::new(Path::new("/nonexistent/engine-binary"), Path::new("/m"));
        assert!(cfg.synthesize(&mut utt).is_err());
        assert!(utt.waveform.is_none());
        assert!(!utt.items_named("Segment").is_empty());
    }
}
