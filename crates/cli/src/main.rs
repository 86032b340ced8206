//! CLI tool for analyzing PPTX templates and generating or patching decks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_core::{DeckSpec, PatchOp, PatchOps, PresentationFormat};
use deck_pptx::TemplateAnalyzer;
use serde_json::json;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Work with PowerPoint templates and decks offline.
#[derive(Parser, Debug)]
#[command(name = "pptx-tool")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the style profile of a template as JSON
    Analyze {
        /// Template file (.pptx)
        input: PathBuf,

        /// Write the JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Build a deck from a template and a deck spec
    Generate {
        /// Template file (.pptx)
        template: PathBuf,

        /// Deck spec JSON file
        #[arg(short, long)]
        spec: PathBuf,

        /// Output file (default: <template>-generated.pptx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply patch operations to a deck
    Patch {
        /// Deck file (.pptx)
        deck: PathBuf,

        /// Patch operations JSON file, `{"ops": [...]}` or a bare array
        #[arg(long)]
        ops: PathBuf,

        /// Output file (default: <deck>-patched.pptx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match &args.command {
        Command::Analyze {
            input,
            output,
            compact,
        } => analyze(input, output.as_deref(), *compact),
        Command::Generate {
            template,
            spec,
            output,
        } => {
            let output_path = output
                .clone()
                .unwrap_or_else(|| default_output_path(template, "generated"));
            generate(template, spec, &output_path, args.verbose)
        }
        Command::Patch { deck, ops, output } => {
            let output_path = output
                .clone()
                .unwrap_or_else(|| default_output_path(deck, "patched"));
            patch(deck, ops, &output_path, args.verbose)
        }
    }
}

fn analyze(input: &Path, output: Option<&Path>, compact: bool) -> Result<()> {
    let bytes = read_presentation(input)?;
    let profile = TemplateAnalyzer::new()
        .analyze(std::io::Cursor::new(bytes))
        .with_context(|| format!("Failed to analyze {}", input.display()))?;

    let value = json!({ "styleProfile": profile });
    let mut text = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    text.push('\n');

    match output {
        Some(path) => write_output(path, text.as_bytes()),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn generate(template: &Path, spec_path: &Path, output: &Path, verbose: bool) -> Result<()> {
    let bytes = read_presentation(template)?;
    let spec: DeckSpec = read_json(spec_path)?;

    let generated = deck_pptx::generate_deck(&bytes, &spec)
        .with_context(|| format!("Failed to generate deck from {}", template.display()))?;
    write_output(output, &generated)?;

    if verbose {
        eprintln!(
            "Generated {} slides, written to: {}",
            spec.slides.len(),
            output.display()
        );
    }
    Ok(())
}

fn patch(deck: &Path, ops_path: &Path, output: &Path, verbose: bool) -> Result<()> {
    let bytes = read_presentation(deck)?;
    let ops = read_patch_ops(ops_path)?;

    let patched = deck_pptx::patch_deck(&bytes, &ops)
        .with_context(|| format!("Failed to patch {}", deck.display()))?;
    write_output(output, &patched)?;

    if verbose {
        eprintln!(
            "Applied {} operations, written to: {}",
            ops.ops.len(),
            output.display()
        );
    }
    Ok(())
}

/// Read a file and make sure it is a PPTX package.
fn read_presentation(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;
    PresentationFormat::ensure_pptx(&bytes, path.to_str())
        .with_context(|| format!("Cannot use {}", path.display()))?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_patch_ops(path: &Path) -> Result<PatchOps> {
    let value: serde_json::Value = read_json(path)?;
    parse_patch_ops(value).with_context(|| format!("Invalid patch operations in {}", path.display()))
}

fn parse_patch_ops(value: serde_json::Value) -> Result<PatchOps> {
    if value.is_array() {
        let ops: Vec<PatchOp> = serde_json::from_value(value)?;
        Ok(PatchOps { ops })
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

/// `<dir>/<stem>-<suffix>.pptx` next to the input file.
fn default_output_path(input_path: &Path, suffix: &str) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}-{}.pptx", stem, suffix);

    match input_path.parent() {
        Some(parent) => parent.join(output_filename),
        None => PathBuf::from(output_filename),
    }
}

/// Write output to a file, creating parent directories.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("decks/brand.pptx"), "generated"),
            PathBuf::from("decks/brand-generated.pptx")
        );
        assert_eq!(
            default_output_path(Path::new("q3.pptx"), "patched"),
            PathBuf::from("q3-patched.pptx")
        );
    }

    #[test]
    fn test_parse_patch_ops_forms() {
        let wrapped = parse_patch_ops(json!({
            "ops": [{"type": "replace_text", "placeholder": "Title 1", "newText": "Hi"}]
        }))
        .unwrap();
        assert_eq!(wrapped.ops.len(), 1);

        let bare = parse_patch_ops(json!([
            {"type": "add_slide"},
            {"type": "replace_text", "placeholder": "Title 1"}
        ]))
        .unwrap();
        assert_eq!(bare.ops.len(), 2);
        assert_eq!(bare.ops[0].kind(), "add_slide");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "pptx-tool",
            "patch",
            "deck.pptx",
            "--ops",
            "ops.json",
            "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Patch { .. }));
    }
}
