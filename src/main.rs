//! Command line front-end: inspect modules, dump patterns, render to WAV.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use mod_replayer::export::{export_to_wav_with_config, ExportConfig};
use mod_replayer::format::{Module, ROWS_PER_PATTERN};
use mod_replayer::replayer::{measure_duration, Effect, ExtendedEffect, LoadOptions, LoadSummary};
use mod_replayer::visualization::{create_volume_bar, format_cell};
use mod_replayer::ModFileLoader;

const VU_BAR_WIDTH: usize = 24;
const DURATION_LIMIT: Duration = Duration::from_secs(30 * 60);

#[derive(Parser)]
#[command(name = "mod-replayer")]
#[command(about = "Inspect and render ProTracker MOD files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show song and sample information
    Info {
        /// Module file (`*.mod` or `mod.*`)
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Pretty print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Dump pattern data in tracker notation
    Patterns {
        /// Module file
        file: PathBuf,

        /// Only dump the pattern at this song position
        #[arg(short, long)]
        position: Option<usize>,
    },

    /// Render the song to a 16-bit WAV file
    Render {
        /// Module file
        file: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Output sample rate in Hz
        #[arg(short, long, default_value_t = 44_100)]
        sample_rate: u32,

        /// Keep playing past the end of the song (use with --seconds)
        #[arg(long)]
        repeat: bool,

        /// Maximum length in seconds
        #[arg(long, default_value_t = 600.0)]
        seconds: f32,

        /// Fade out over the last N seconds
        #[arg(long, default_value_t = 0.0)]
        fade: f32,

        /// Downmix to mono
        #[arg(long)]
        mono: bool,

        /// Skip peak normalization
        #[arg(long)]
        no_normalize: bool,
    },
}

#[derive(Serialize)]
struct SampleInfo {
    index: usize,
    name: String,
    length: usize,
    finetune: i8,
    volume: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    loop_range: Option<(usize, usize)>,
}

#[derive(Serialize)]
struct ModuleReport {
    #[serde(flatten)]
    summary: LoadSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_position: Option<u8>,
    filter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f32>,
    effects: Vec<String>,
    samples: Vec<SampleInfo>,
}

impl ModuleReport {
    fn new(module: &Module) -> Self {
        let summary = LoadSummary::from_module(module, 44_100);
        let duration = measure_duration(module, summary.sample_rate, DURATION_LIMIT);
        let samples = module
            .used_samples()
            .map(|(index, s)| SampleInfo {
                index: index + 1,
                name: s.name.trim_end().to_string(),
                length: s.length,
                finetune: s.finetune,
                volume: s.volume,
                loop_range: s.has_loop().then(|| (s.loop_start, s.loop_end())),
            })
            .collect();

        Self {
            summary,
            repeat_position: module.repeat_position,
            filter: module.filter,
            duration_seconds: duration.map(|d| d.as_secs_f32()),
            effects: used_effects(module),
            samples,
        }
    }

    fn print_text(&self) {
        let s = &self.summary;
        println!("Title:     {}", s.title);
        println!("Format:    {} ({} channels)", s.signature.tag(), s.channels);
        println!("Length:    {} positions, {} patterns", s.song_length, s.pattern_count);
        match self.duration_seconds {
            Some(secs) => println!("Duration:  {}:{:05.2}", (secs / 60.0) as u32, secs % 60.0),
            None => println!("Duration:  loops forever"),
        }
        println!("Filter:    {}", if self.filter { "on" } else { "off" });
        println!("Effects:   {}", self.effects.join(", "));
        println!();
        println!("Samples ({}):", s.sample_count);
        for sample in &self.samples {
            let looping = match sample.loop_range {
                Some((start, end)) => format!("loop {start}..{end}"),
                None => String::new(),
            };
            println!(
                "  {:02} {:<22} {:>6} bytes  vol {:>2}  ft {:>2}  {}",
                sample.index, sample.name, sample.length, sample.volume, sample.finetune, looping
            );
        }
    }
}

/// Names of all effects that occur in the song's patterns.
fn used_effects(module: &Module) -> Vec<String> {
    let mut seen = Vec::new();
    for pattern in &module.patterns {
        for row in 0..ROWS_PER_PATTERN {
            for cell in pattern.row(row) {
                if cell.command == 0 && cell.param == 0 {
                    continue;
                }
                let name = if cell.command == 0x0E {
                    ExtendedEffect::from_param(cell.param).map(|e| format!("{e:?}"))
                } else {
                    Effect::from_command(cell.command).map(|e| format!("{e:?}"))
                };
                if let Some(name) = name {
                    if !seen.contains(&name) {
                        seen.push(name);
                    }
                }
            }
        }
    }
    seen.sort();
    seen
}

fn dump_patterns(module: &Module, position: Option<usize>) -> Result<()> {
    let positions = match position {
        Some(p) if p >= module.song_length => {
            bail!("position {p} is past the song length ({})", module.song_length)
        }
        Some(p) => p..p + 1,
        None => 0..module.song_length,
    };

    for pos in positions {
        let pattern = module.pattern_at(pos);
        println!("Position {pos:03}  pattern {:02}", module.order[pos]);
        for row in 0..ROWS_PER_PATTERN {
            let cells: Vec<String> = pattern.row(row).iter().map(format_cell).collect();
            println!("{row:02} | {}", cells.join(" | "));
        }
        println!();
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Info { file, json, pretty } => {
            let module = ModFileLoader::load(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            let report = ModuleReport::new(&module);
            if json {
                let text = if pretty {
                    serde_json::to_string_pretty(&report)?
                } else {
                    serde_json::to_string(&report)?
                };
                println!("{text}");
            } else {
                report.print_text();
            }
        }

        Command::Patterns { file, position } => {
            let module = ModFileLoader::load(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            dump_patterns(&module, position)?;
        }

        Command::Render {
            file,
            output,
            sample_rate,
            repeat,
            seconds,
            fade,
            mono,
            no_normalize,
        } => {
            let options = LoadOptions::default()
                .sample_rate(sample_rate)
                .repeat(repeat);
            let (mut player, summary) = ModFileLoader::load_player(&file, options)
                .with_context(|| format!("loading {}", file.display()))?;

            let base = if mono { ExportConfig::mono() } else { ExportConfig::stereo() };
            let config = ExportConfig {
                sample_rate,
                ..base
            }
            .normalize(!no_normalize)
            .fade_out(fade)
            .max_duration(seconds);

            let frames = export_to_wav_with_config(&mut player, &output, config)
                .with_context(|| format!("rendering {}", output.display()))?;

            println!(
                "Rendered \"{}\" to {} ({:.1}s)",
                summary.title,
                output.display(),
                frames as f32 / sample_rate as f32
            );
            for (ch, peak) in player.channel_vu().iter().enumerate() {
                println!("  ch {:>2} {} {:.2}", ch + 1, create_volume_bar(*peak, VU_BAR_WIDTH), peak);
            }
        }
    }

    Ok(())
}
