//! Highlights a passage on one page and writes the result next to the input.
//!
//! ```text
//! cargo run --example highlight_page -- paper.pdf 3 "the quoted passage"
//! ```

use std::env;
use std::process::exit;

use pdf_highlight::{PdfCanvas, StampMode, decode_html_entities, load_pdf};

fn main() -> Result<(), pdf_highlight::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let args: Vec<String> = env::args().collect();
    let [_, path, page, text] = args.as_slice() else {
        eprintln!("usage: highlight_page <FILE> <PAGE> <TEXT>");
        exit(2);
    };
    let Ok(page) = page.parse::<u32>() else {
        eprintln!("page must be a number, got {:?}", page);
        exit(2);
    };

    let mut canvas = PdfCanvas::new(StampMode::Content);
    let mut highlighted = load_pdf(path, &decode_html_entities(text), page, &mut canvas)?;
    for highlight in &highlighted.highlights {
        println!("{} {:?}", highlight.rect, highlight.text);
    }

    canvas.stamp(&mut highlighted.document)?;
    let output = format!("{}.highlighted.pdf", path.trim_end_matches(".pdf"));
    highlighted.document.save(&output)?;
    println!("wrote {}", output);
    Ok(())
}
