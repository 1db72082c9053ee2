use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("page {page} not found (document has {page_count} pages)")]
    PageNotFound { page: u32, page_count: u32 },

    #[error("page {0} has no usable MediaBox")]
    MissingPageBox(u32),

    #[error("invalid viewport scale {0}")]
    InvalidScale(f64),

    #[error("invalid fill style {0:?}")]
    InvalidColor(String),

    #[error("nothing to draw on, no page has been rendered to the canvas")]
    NoPageRendered,
}

pub type Result<T> = std::result::Result<T, Error>;
