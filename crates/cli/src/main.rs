//! karoo CLI — synthesize speech, print full-context labels, and serve
//! the framed TTS protocol.

mod server;

use std::net::TcpListener;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use karoo_core::labels::{self, LabelStyle};
use karoo_core::voice::Voice;
use karoo_core::voices;

use server::TtsServer;

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "karoo", about = "Text-to-speech engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize text to a WAV file
    Say(SayArgs),
    /// Print full-context labels for text
    Label(LabelArgs),
    /// Serve the framed TTS protocol over TCP
    Serve(ServeArgs),
    /// List the built-in voices
    Voices,
}

// ─── Voice selection (shared) ────────────────────────────────────

const BUILTIN_VOICES: &[&str] = &["english", "yoruba", "zulu", "afrikaans"];

#[derive(Parser, Debug)]
struct VoiceArgs {
    /// Voice definition file (JSON)
    #[arg(long)]
    voice_file: Option<PathBuf>,

    /// Built-in voice name
    #[arg(long, default_value = "english")]
    voice: String,
}

impl VoiceArgs {
    fn load(&self) -> Result<Voice> {
        if let Some(path) = &self.voice_file {
            return Voice::from_file(path);
        }
        builtin_voice(&self.voice)
    }
}

fn builtin_voice(name: &str) -> Result<Voice> {
    match name {
        "english" => Ok(voices::english_voice()),
        "yoruba" => Ok(voices::yoruba_voice()),
        "zulu" => Ok(voices::zulu_voice()),
        "afrikaans" => Ok(voices::afrikaans_voice()),
        other => bail!("unknown built-in voice '{}' (try: {})", other, BUILTIN_VOICES.join(", ")),
    }
}

// ─── Say ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct SayArgs {
    #[command(flatten)]
    voice: VoiceArgs,

    /// Text to synthesize
    text: String,

    /// Output WAV path
    #[arg(short, long, default_value = "karoo-out.wav")]
    output: PathBuf,

    /// Play the result through the default audio device
    #[arg(long)]
    play: bool,

    /// Pipeline process to run
    #[arg(long, default_value = "text-to-wave")]
    process: String,
}

fn cmd_say(args: SayArgs) -> Result<()> {
    let voice = args.voice.load()?;
    let utt = voice
        .synthesize(&args.text, &args.process)
        .with_context(|| format!("process '{}' failed", args.process))?;
    match &utt.waveform {
        Some(wave) => {
            wave.write(&args.output)?;
            println!(
                "{} ({:.2}s at {} Hz)",
                args.output.display(),
                wave.duration(),
                wave.samplerate
            );
            if args.play {
                wave.play()?;
            }
        }
        None => {
            // Symbolic results stay inspectable even without audio.
            let words: Vec<&str> = utt
                .items_named("Word")
                .iter()
                .filter_map(|&w| utt.name(w))
                .collect();
            let segments: Vec<&str> = utt
                .items_named("Segment")
                .iter()
                .filter_map(|&s| utt.name(s))
                .collect();
            eprintln!("no waveform produced (voice '{}' backend)", voice.name);
            println!("words:    {}", words.join(" "));
            println!("segments: {}", segments.join(" "));
        }
    }
    Ok(())
}

// ─── Label ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct LabelArgs {
    #[command(flatten)]
    voice: VoiceArgs,

    /// Text to analyze
    text: String,

    /// Emit the tone-language label variant (K/L/M/N groups)
    #[arg(long)]
    tone: bool,
}

fn cmd_label(args: LabelArgs) -> Result<()> {
    let voice = args.voice.load()?;
    let utt = voice
        .synthesize(&args.text, "text-to-segments")
        .context("front-end pipeline failed")?;
    let style = if args.tone { LabelStyle::Tone } else { LabelStyle::Standard };
    for label in labels::build(&utt, &voice, style) {
        println!("{label}");
    }
    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Listen port
    #[arg(short, long, default_value_t = 22223)]
    port: u16,

    /// Voice definition files to load
    #[arg(long)]
    voice_file: Vec<PathBuf>,

    /// Built-in voices to load
    #[arg(long, default_value = "english")]
    builtin: Vec<String>,
}

fn cmd_serve(args: ServeArgs) -> Result<()> {
    let mut server = TtsServer::new();
    for name in &args.builtin {
        server.add_voice(builtin_voice(name)?);
    }
    for path in &args.voice_file {
        server.add_voice(Voice::from_file(path)?);
    }
    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .with_context(|| format!("failed to bind port {}", args.port))?;
    server.run(listener)
}

// ─── Entry point ─────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Say(args) => cmd_say(args),
        Command::Label(args) => cmd_label(args),
        Command::Serve(args) => cmd_serve(args),
        Command::Voices => {
            for name in BUILTIN_VOICES {
                println!("{name}");
            }
            Ok(())
        }
    }
}
