use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use pdf_highlight::{
    DEFAULT_FILL_STYLE, DEFAULT_MIN_RUN_LEN, FillStyle, HighlightOptions, Highlighter, PdfCanvas,
    PdfDocument, RecordingCanvas, StampMode, decode_html_entities,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Write a copy of the PDF with the highlights painted into the page
    Pdf,
    /// Write a copy of the PDF with highlight annotations
    Annotate,
    /// Print the highlighted rectangles in canvas coordinates
    Boxes,
    /// Print the page's text items with their positions
    Text,
}

#[derive(Parser)]
#[command(name = "pdf-highlight")]
#[command(about = "Highlight a passage of text on a PDF page", long_about = None)]
struct Args {
    /// PDF file to highlight
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Page number, starting at 1
    #[arg(short = 'n', long, default_value_t = 1)]
    page: u32,

    /// Passage to highlight; repeat to highlight several passages
    #[arg(short, long)]
    text: Vec<String>,

    /// Read a passage to highlight from a file; may be repeated
    #[arg(long, value_name = "PATH")]
    text_file: Vec<PathBuf>,

    /// Treat the passage as HTML and decode entities and tags first
    #[arg(long)]
    decode_entities: bool,

    /// Password for encrypted PDFs
    #[arg(short, long)]
    password: Option<String>,

    /// Viewport scale
    #[arg(short, long, default_value_t = pdf_highlight::DEFAULT_SCALE)]
    scale: f64,

    /// Highlight runs longer than this many text items
    #[arg(long, default_value_t = DEFAULT_MIN_RUN_LEN)]
    min_run: usize,

    /// CSS fill colour: rgba(), rgb(), #rrggbb or #rgb
    #[arg(short, long, default_value = DEFAULT_FILL_STYLE)]
    color: FillStyle,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Boxes)]
    format: OutputFormat,

    /// Where to write the PDF for the pdf and annotate formats
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log more; repeat for debug output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn passages(args: &Args) -> Result<Vec<String>, std::io::Error> {
    let mut passages = args.text.clone();
    for path in &args.text_file {
        passages.push(std::fs::read_to_string(path)?);
    }
    if args.decode_entities {
        for passage in &mut passages {
            *passage = decode_html_entities(passage);
        }
    }
    Ok(passages)
}

fn open(args: &Args) -> pdf_highlight::Result<PdfDocument> {
    match &args.password {
        Some(password) => PdfDocument::builder()
            .password(password.clone())
            .build()
            .load_path(&args.file),
        None => pdf_highlight::from_path(&args.file),
    }
}

fn highlighter(args: &Args) -> Highlighter {
    Highlighter::new(
        HighlightOptions::builder()
            .min_run_len(args.min_run)
            .fill_style(args.color)
            .scale(args.scale)
            .build(),
    )
}

fn print_text_items(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let document = open(args)?;
    let page = document.get_page(args.page)?;
    for (i, item) in page.get_text_content()?.items().iter().enumerate() {
        let [a, b, c, d, e, f] = item.transform;
        println!(
            "{:4} [{:.2} {:.2} {:.2} {:.2} {:.2} {:.2}] w={:.2} h={:.2} {:?}",
            i, a, b, c, d, e, f, item.width, item.height, item.text
        );
    }
    Ok(())
}

fn print_boxes(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let document = open(args)?;
    let passages = passages(args)?;
    let mut canvas = RecordingCanvas::new();
    let highlighted =
        highlighter(args).highlight_document_many(document, &passages, args.page, &mut canvas)?;
    println!("canvas {:.1}x{:.1}", canvas.width(), canvas.height());
    for highlight in &highlighted.highlights {
        println!(
            "{} {} items {:?}",
            highlight.rect, highlight.fragment_count, highlight.text
        );
    }
    Ok(())
}

fn write_pdf(
    args: &Args,
    mode: StampMode,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = open(args)?;
    let passages = passages(args)?;
    let mut canvas = PdfCanvas::new(mode);
    let mut highlighted =
        highlighter(args).highlight_document_many(document, &passages, args.page, &mut canvas)?;
    let count = canvas.stamp(&mut highlighted.document)?;
    highlighted.document.save(output)?;
    eprintln!("{} highlights written to {:?}", count, output);
    Ok(())
}

fn missing_argument(message: &str) -> ! {
    Args::command()
        .error(ErrorKind::MissingRequiredArgument, message)
        .exit()
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.format != OutputFormat::Text && args.text.is_empty() && args.text_file.is_empty() {
        missing_argument("one of --text or --text-file is required");
    }

    let result = match args.format {
        OutputFormat::Text => print_text_items(&args),
        OutputFormat::Boxes => print_boxes(&args),
        OutputFormat::Pdf | OutputFormat::Annotate => {
            let Some(output) = &args.output else {
                missing_argument("--output is required for the pdf and annotate formats");
            };
            let mode = if args.format == OutputFormat::Pdf {
                StampMode::Content
            } else {
                StampMode::Annotation
            };
            write_pdf(&args, mode, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error highlighting {:?}: {}", args.file, e);
        std::process::exit(1);
    }
}
