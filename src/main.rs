//! fb2epub - FictionBook to EPUB converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};

use fb2epub::config::{ConversionConfig, NoteStrategy};
use fb2epub::{FictionBook, read_fb2};

#[derive(Parser)]
#[command(name = "fb2epub")]
#[command(version, about = "FictionBook (FB2) to EPUB converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    fb2epub book.fb2                    Convert to book.epub
    fb2epub book.fb2 out.epub --back-links
                                        Link notes instead of embedding them
    fb2epub -i book.fb2                 Show book information")]
struct Cli {
    /// Input FB2 file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output EPUB file (defaults to INPUT with an .epub extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Show book information without converting
    #[arg(short, long)]
    info: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// More logging (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// JSON file with conversion settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upper bound for the size of one XHTML document, in bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<usize>,

    /// Link to notes and add back-links instead of embedding footnotes
    #[arg(long)]
    back_links: bool,

    /// Mark the first paragraph of each section for a drop capital
    #[arg(long)]
    capital_drop: bool,

    /// Add a page with the FB2 document and publish information
    #[arg(long)]
    fb2_info: bool,

    /// Leave out the about and license pages
    #[arg(long)]
    no_about: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = if cli.info {
        show_info(&cli.input)
    } else {
        convert(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn settings(cli: &Cli) -> fb2epub::Result<ConversionConfig> {
    let mut config = match &cli.config {
        Some(path) => ConversionConfig::from_json_file(path)?,
        None => ConversionConfig::default(),
    };
    if let Some(size) = cli.max_size {
        config = config.with_max_document_size(size);
    }
    if cli.back_links {
        config = config.with_notes(NoteStrategy::BackLinks);
    }
    if cli.capital_drop {
        config = config.with_capital_drop(true);
    }
    if cli.fb2_info {
        config = config.with_fb2_info(true);
    }
    if cli.no_about {
        config = config.with_skip_about_page(true);
    }
    config.validate()?;
    Ok(config)
}

fn convert(cli: &Cli) -> fb2epub::Result<()> {
    let config = settings(cli)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("epub"));

    let diagnostics = fb2epub::convert_file(&cli.input, &output, &config)?;
    if !cli.quiet {
        println!(
            "{} -> {} ({} warning(s))",
            cli.input.display(),
            output.display(),
            diagnostics.len()
        );
    }
    Ok(())
}

fn show_info(path: &Path) -> fb2epub::Result<()> {
    let book: FictionBook = read_fb2(path)?;
    let info = &book.description.title_info;

    println!("File: {}", path.display());
    println!("Title: {}", info.book_title);
    let authors: Vec<String> = info.authors.iter().map(|a| a.display_name()).collect();
    if !authors.is_empty() {
        println!("Authors: {}", authors.join(", "));
    }
    if let Some(lang) = &info.lang {
        println!("Language: {lang}");
    }
    for sequence in &info.sequences {
        match &sequence.number {
            Some(number) => println!("Series: {} #{number}", sequence.name),
            None => println!("Series: {}", sequence.name),
        }
    }
    if let Some(annotation) = &info.annotation {
        let text = annotation.text();
        let text = text.trim();
        match text.char_indices().nth(200) {
            Some((cut, _)) => println!("Annotation: {}...", &text[..cut]),
            None => println!("Annotation: {text}"),
        }
    }

    let sections = book.main_body().map_or(0, |b| count_sections(&b.sections));
    println!("Sections: {sections}");
    println!("Notes bodies: {}", book.notes_bodies().count());
    println!("Images: {}", book.binaries.len());

    Ok(())
}

fn count_sections(sections: &[fb2epub::fb2::Section]) -> usize {
    sections
        .iter()
        .map(|s| 1 + count_sections(&s.sections))
        .sum()
}
