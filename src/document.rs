use std::io::{Read, Write};
use std::path::Path;

use euclid::Transform2D;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::output::TextContentOutput;
use crate::processor::Processor;
use crate::types::{PageBox, TextContent};
use crate::utils::get_inherited;
use crate::viewport::{Viewport, normalize_rotation};

/// Builder for configuring how documents are opened.
///
/// # Examples
///
/// ```no_run
/// use pdf_highlight::PdfDocument;
///
/// let doc = PdfDocument::builder()
///     .password("secret")
///     .build()
///     .load_path("encrypted.pdf")?;
/// # Ok::<(), pdf_highlight::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PdfDocumentBuilder {
    password: Option<String>,
}

impl PdfDocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the password for encrypted PDFs.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn build(self) -> PdfDocumentLoader {
        PdfDocumentLoader {
            password: self.password,
        }
    }
}

/// Opens PDF documents with the options of a [`PdfDocumentBuilder`].
#[derive(Debug, Clone, Default)]
pub struct PdfDocumentLoader {
    password: Option<String>,
}

impl PdfDocumentLoader {
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<PdfDocument> {
        let doc = Document::load(path)?;
        self.open(doc)
    }

    pub fn load_bytes(&self, bytes: &[u8]) -> Result<PdfDocument> {
        let doc = Document::load_mem(bytes)?;
        self.open(doc)
    }

    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<PdfDocument> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.load_bytes(&bytes)
    }

    fn open(&self, mut doc: Document) -> Result<PdfDocument> {
        if doc.is_encrypted() {
            if doc.encryption_state.is_some() {
                // objects were decrypted while loading with the empty user password
                if let Some(password) = &self.password {
                    doc.authenticate_password(password)?;
                }
                drop_encryption_dictionary(&mut doc);
            } else {
                let password = self.password.as_deref().unwrap_or("");
                doc.decrypt(password)?;
            }
        }
        debug!("opened document with {} pages", doc.get_pages().len());
        Ok(PdfDocument { doc })
    }
}

/// Leaves a document the loader already decrypted in the same state as
/// `Document::decrypt` would, so saving it writes a plain file.
fn drop_encryption_dictionary(doc: &mut Document) {
    if let Some(Object::Reference(id)) = doc.trailer.remove(b"Encrypt") {
        doc.objects.remove(&id);
    }
    doc.encryption_state = None;
}

/// A loaded PDF document.
///
/// # Examples
///
/// ```no_run
/// let doc = pdf_highlight::from_path("file.pdf")?;
/// let page = doc.get_page(1)?;
/// let content = page.get_text_content()?;
/// println!("{}", content);
/// # Ok::<(), pdf_highlight::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    pub fn builder() -> PdfDocumentBuilder {
        PdfDocumentBuilder::new()
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Returns the page with the given 1-based number.
    pub fn get_page(&self, page_number: u32) -> Result<PdfPage<'_>> {
        let page_count = self.page_count();
        let not_found = Error::PageNotFound {
            page: page_number,
            page_count,
        };
        let Some(&id) = self.doc.get_pages().get(&page_number) else {
            return Err(not_found);
        };
        let dict = self.doc.get_dictionary(id)?;
        PdfPage::new(&self.doc, page_number, id, dict)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.doc.save(path)?;
        Ok(())
    }

    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        self.doc.save_to(writer)?;
        Ok(())
    }
}

impl From<Document> for PdfDocument {
    fn from(doc: Document) -> Self {
        PdfDocument { doc }
    }
}

/// Open a document at the given path using default settings.
///
/// This is a convenience function equivalent to
/// `PdfDocument::builder().build().load_path(path)`.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<PdfDocument> {
    PdfDocumentLoader::default().load_path(path)
}

/// Open a document held in memory using default settings.
pub fn from_bytes(bytes: &[u8]) -> Result<PdfDocument> {
    PdfDocumentLoader::default().load_bytes(bytes)
}

/// Open a document from a reader using default settings.
pub fn from_reader<R: Read>(reader: R) -> Result<PdfDocument> {
    PdfDocumentLoader::default().load_reader(reader)
}

/// One page of a [`PdfDocument`].
#[derive(Debug, Clone)]
pub struct PdfPage<'a> {
    doc: &'a Document,
    page_number: u32,
    id: ObjectId,
    dict: &'a Dictionary,
    view_box: PageBox,
    rotation: u32,
}

fn page_box(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<PageBox> {
    let b: Vec<f64> = get_inherited(doc, dict, key)?;
    match b[..] {
        [x0, y0, x1, y1] => Some(PageBox::new(x0, y0, x1, y1)),
        _ => {
            warn!("ignoring malformed {:?}", String::from_utf8_lossy(key));
            None
        }
    }
}

impl<'a> PdfPage<'a> {
    fn new(
        doc: &'a Document,
        page_number: u32,
        id: ObjectId,
        dict: &'a Dictionary,
    ) -> Result<PdfPage<'a>> {
        let media_box =
            page_box(doc, dict, b"MediaBox").ok_or(Error::MissingPageBox(page_number))?;
        let view_box = match page_box(doc, dict, b"CropBox") {
            Some(crop) if crop.width() > 0. && crop.height() > 0. => crop,
            _ => media_box,
        };
        let rotation = normalize_rotation(get_inherited::<i64>(doc, dict, b"Rotate").unwrap_or(0));

        Ok(PdfPage {
            doc,
            page_number,
            id,
            dict,
            view_box,
            rotation,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn view_box(&self) -> PageBox {
        self.view_box
    }

    pub fn rotation(&self) -> u32 {
        self.rotation
    }

    pub fn get_viewport(&self, scale: f64) -> Result<Viewport> {
        Viewport::new(self.view_box, scale, self.rotation)
    }

    /// Extracts the positioned strings of the page in content stream order.
    pub fn get_text_content(&self) -> Result<TextContent> {
        let doc = self.doc;
        let empty_resources = Dictionary::new();
        let resources = get_inherited(doc, self.dict, b"Resources").unwrap_or(&empty_resources);
        let content = match doc.get_page_content(self.id) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "failed to read content of page {}: {}",
                    self.page_number, e
                );
                Vec::new()
            }
        };

        let mut output = TextContentOutput::new();
        Processor::new(doc, self.page_number).process_stream(
            &content,
            resources,
            Transform2D::identity(),
            &mut output,
            0,
        );
        let content = output.into_content();
        debug!(
            "page {}: {} text items",
            self.page_number,
            content.len()
        );
        Ok(content)
    }
}
