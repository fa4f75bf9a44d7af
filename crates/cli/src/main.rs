//! CLI tool for converting PowerPoint decks to markup documents.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::{
    convert_deck, render, ConversionConfig, ConversionContext, Dialect, NoImages, TitleOutline,
};
use deck_media::DirImageStore;
use deck_pptx::PptxParser;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Convert PowerPoint decks to Markdown, wiki, Madoko, Quarto, Marp or Beamer.
#[derive(Parser, Debug)]
#[command(name = "deck2md")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input .pptx file(s) or directories containing them
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Outline file of titles; indentation sets heading depth
    #[arg(short, long)]
    title: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Image directory (default: <output-dir>/img)
    #[arg(short, long)]
    image_dir: Option<PathBuf>,

    /// Maximum image width in pixels
    #[arg(long)]
    image_width: Option<u32>,

    /// Do not extract pictures
    #[arg(long)]
    disable_image: bool,

    /// Keep WMF/EMF pictures untouched instead of converting them
    #[arg(long)]
    disable_wmf: bool,

    /// Do not emit color markup
    #[arg(long)]
    disable_color: bool,

    /// Do not escape reserved characters
    #[arg(long)]
    disable_escaping: bool,

    /// Drop presenter notes
    #[arg(long)]
    disable_notes: bool,

    /// Separate slides with delimiters
    #[arg(long)]
    enable_slides: bool,

    /// Detect multi-column slide layouts
    #[arg(long)]
    try_multi_column: bool,

    /// Minimum characters for a text shape to be kept
    #[arg(long, default_value_t = 0)]
    min_block_size: usize,

    /// Only convert this slide (1-based)
    #[arg(long)]
    page: Option<usize>,

    /// Keep repeated titles, marked as continued
    #[arg(long)]
    keep_similar_titles: bool,

    /// Do not float left/right pictures in Beamer output
    #[arg(long)]
    disable_image_wrapping: bool,

    /// Markdown output (default when no format is given)
    #[arg(long)]
    md: bool,

    /// Wiki output
    #[arg(long)]
    wiki: bool,

    /// Madoko output
    #[arg(long)]
    mdk: bool,

    /// Quarto presentation output
    #[arg(long)]
    qmd: bool,

    /// Marp presentation output
    #[arg(long)]
    marp: bool,

    /// Beamer (LaTeX) output
    #[arg(long)]
    beamer: bool,

    /// Write the converted block model as JSON instead of markup
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn dialects(&self) -> Vec<Dialect> {
        [
            (self.md, Dialect::Markdown),
            (self.wiki, Dialect::Wiki),
            (self.mdk, Dialect::Madoko),
            (self.qmd, Dialect::Quarto),
            (self.marp, Dialect::Marp),
            (self.beamer, Dialect::Beamer),
        ]
        .into_iter()
        .filter_map(|(selected, dialect)| selected.then_some(dialect))
        .collect()
    }

    fn config(&self) -> ConversionConfig {
        ConversionConfig::new()
            .with_image_width(self.image_width)
            .with_extract_images(!self.disable_image)
            .with_escaping(!self.disable_escaping)
            .with_notes(!self.disable_notes)
            .with_convert_unsupported_images(!self.disable_wmf)
            .with_color(!self.disable_color)
            .with_slide_delimiters(self.enable_slides)
            .with_detect_columns(self.try_multi_column)
            .with_min_block_size(self.min_block_size)
            .with_page(self.page)
            .with_keep_similar_titles(self.keep_similar_titles)
            .with_image_wrapping(!self.disable_image_wrapping)
            .with_dialects(self.dialects())
    }

    fn image_dir(&self) -> PathBuf {
        self.image_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("img"))
    }
}

/// Settings shared by every file of a batch.
struct Job {
    config: ConversionConfig,
    outline: Option<TitleOutline>,
    output_dir: PathBuf,
    image_dir: PathBuf,
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let outline = match &args.title {
        Some(path) => Some(
            TitleOutline::load(path)
                .with_context(|| format!("Failed to load title outline {}", path.display()))?,
        ),
        None => None,
    };

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.output_dir.display()
        )
    })?;

    let inputs = collect_inputs(&args.input)?;
    let job = Job {
        config: args.config(),
        outline,
        output_dir: args.output_dir.clone(),
        image_dir: args.image_dir(),
        json: args.json,
    };

    let stems = output_stems(&inputs);
    let results: Vec<(&PathBuf, Result<Vec<PathBuf>>)> = inputs
        .par_iter()
        .zip(stems.par_iter())
        .map(|(input, stem)| (input, process_file(input, stem, &job)))
        .collect();

    let mut failures = 0;
    for (input, result) in &results {
        match result {
            Ok(written) => {
                if args.verbose {
                    for path in written {
                        eprintln!("{} -> {}", input.display(), path.display());
                    }
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error processing {}: {:#}", input.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed", failures, results.len());
    }
    Ok(())
}

/// Expand directories into their `.pptx` entries, sorted.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        let entries = fs::read_dir(input)
            .with_context(|| format!("Failed to read directory {}", input.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .path();
            if is_deck(&path) {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// A `.pptx` file that is not an Office lock file (`~$name.pptx`).
fn is_deck(path: &Path) -> bool {
    let is_pptx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
    let is_lock = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));
    path.is_file() && is_pptx && !is_lock
}

/// Output stem per input. Inputs sharing a file stem share the output and
/// image directories, so later ones get a `_2`, `_3`... suffix.
fn output_stems(inputs: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut candidate = stem.clone();
            let mut n = 1;
            while !used.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{}_{}", stem, n);
            }
            candidate
        })
        .collect()
}

/// Convert one deck and write its outputs. Returns the written paths.
fn process_file(input_path: &Path, stem: &str, job: &Job) -> Result<Vec<PathBuf>> {
    let mut deck = PptxParser::new()
        .parse_file(input_path)
        .with_context(|| format!("Failed to parse {}", input_path.display()))?;
    log::info!("Parsed {} ({} slides)", deck.filename, deck.slides.len());
    if deck.stem() != stem {
        log::info!("Writing {} as {}", input_path.display(), stem);
        deck.filename = format!("{}.pptx", stem);
    }

    let mut ctx = ConversionContext::new(&job.config, job.outline.as_ref());
    let converted = if job.config.extract_images {
        let mut store = DirImageStore::new(&job.image_dir, &job.output_dir)
            .with_conversion(job.config.convert_unsupported_images);
        convert_deck(&deck, &mut ctx, &mut store)
    } else {
        convert_deck(&deck, &mut ctx, &mut NoImages)
    };

    if job.json {
        let path = job.output_dir.join(format!("{}.json", stem));
        let json = serde_json::to_string_pretty(&converted)
            .with_context(|| format!("Failed to serialize {}", input_path.display()))?;
        write_output(&path, &json)?;
        return Ok(vec![path]);
    }

    let mut written = Vec::new();
    for dialect in &job.config.dialects {
        let path = job.output_dir.join(dialect.output_file_name(stem));
        write_output(&path, &render(&converted, *dialect, &job.config))?;
        log::info!("Wrote {:?} output to {}", dialect, path.display());
        written.push(path);
    }
    Ok(written)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("deck2md").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["talk.pptx"]);
        let config = args.config();
        assert_eq!(config.dialects, vec![Dialect::Markdown]);
        assert!(config.extract_images && config.notes && config.color);
        assert_eq!(args.output_dir, PathBuf::from("outputs"));
        assert_eq!(args.image_dir(), PathBuf::from("outputs").join("img"));
    }

    #[test]
    fn test_flags_map_onto_config() {
        let args = parse(&[
            "talk.pptx",
            "--qmd",
            "--beamer",
            "--disable-notes",
            "--disable-wmf",
            "--image-width",
            "480",
            "--page",
            "3",
            "--min-block-size",
            "15",
            "--try-multi-column",
            "-i",
            "pics",
        ]);
        let config = args.config();
        assert_eq!(config.dialects, vec![Dialect::Quarto, Dialect::Beamer]);
        assert!(!config.notes);
        assert!(!config.convert_unsupported_images);
        assert_eq!(config.image_width, Some(480));
        assert_eq!(config.page, Some(3));
        assert_eq!(config.min_block_size, 15);
        assert!(config.detect_columns);
        assert_eq!(args.image_dir(), PathBuf::from("pics"));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Args::try_parse_from(["deck2md"]).is_err());
    }

    #[test]
    fn test_collect_inputs_expands_directories() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pptx", "a.PPTX", "notes.txt", "~$a.pptx"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let single = PathBuf::from("elsewhere/x.pptx");
        let files = collect_inputs(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.PPTX"), dir.path().join("b.pptx"), single]
        );
    }

    #[test]
    fn test_shared_stems_get_distinct_outputs() {
        let inputs = [
            PathBuf::from("a/talk.pptx"),
            PathBuf::from("b/talk.pptx"),
            PathBuf::from("talk_2.pptx"),
            PathBuf::from("c/other.pptx"),
        ];
        assert_eq!(
            output_stems(&inputs),
            vec!["talk", "talk_2", "talk_2_2", "other"]
        );
    }

    #[test]
    fn test_unreadable_deck_is_reported() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.pptx");
        fs::write(&input, b"not a zip").unwrap();
        let job = Job {
            config: ConversionConfig::default(),
            outline: None,
            output_dir: dir.path().to_path_buf(),
            image_dir: dir.path().join("img"),
            json: false,
        };
        let err = process_file(&input, "broken", &job).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.pptx"));
    }
}
