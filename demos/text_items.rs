use std::env;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let file = env::args().nth(1).expect("Usage: text_items <pdf_file> [page]");
    let page_number = env::args()
        .nth(2)
        .map(|p| p.parse().expect("page must be a number"))
        .unwrap_or(1);

    let doc = pdf_highlight::from_path(&file).expect("Failed to load PDF");
    let page = doc.get_page(page_number).expect("No such page");
    let viewport = page.get_viewport(1.0).expect("Bad viewport");
    let content = page.get_text_content().expect("Failed to read text");

    println!(
        "Page {} of {}: {:.1}x{:.1}, rotated {}, {} items",
        page_number,
        doc.page_count(),
        viewport.width(),
        viewport.height(),
        viewport.rotation(),
        content.len()
    );
    for (i, item) in content.items().iter().enumerate() {
        let origin = item.origin();
        let p = viewport.convert_to_viewport_point(origin.x, origin.y);
        println!(
            "  {:4} ({:.2}, {:.2}) w {:.2} h {:.2} {} {:?}",
            i, p.x, p.y, item.width, item.height, item.font_name, item.text
        );
    }
}
