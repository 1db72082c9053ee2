#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream,
    StringFormat, dictionary,
};

pub const FONT_SIZE: f64 = 12.;
/// Advance of one Courier glyph at [`FONT_SIZE`].
pub const GLYPH_ADVANCE: f64 = 0.6 * FONT_SIZE;

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn string(s: &str) -> Object {
    Object::string_literal(s)
}

/// Operations drawing `text` with its origin at `(x, y)`.
pub fn show_at(text: &str, x: f64, y: f64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), real(FONT_SIZE)]),
        Operation::new(
            "Tm",
            vec![real(1.), real(0.), real(0.), real(1.), real(x), real(y)],
        ),
        Operation::new("Tj", vec![string(text)]),
        Operation::new("ET", vec![]),
    ]
}

pub struct FormXObject {
    name: String,
    operations: Vec<Operation>,
    matrix: Option<[f64; 6]>,
}

#[derive(Default)]
pub struct TestPage {
    operations: Vec<Operation>,
    forms: Vec<FormXObject>,
    rotate: Option<i64>,
    crop_box: Option<[f64; 4]>,
}

impl TestPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str, x: f64, y: f64) -> Self {
        self.operations.extend(show_at(text, x, y));
        self
    }

    /// One text item per word, 40pt apart, starting at x = 72.
    pub fn words(mut self, words: &[&str], y: f64) -> Self {
        for (i, word) in words.iter().enumerate() {
            self.operations
                .extend(show_at(word, 72. + 40. * i as f64, y));
        }
        self
    }

    pub fn operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    /// Adds a form XObject and draws it with `Do`.
    pub fn form(mut self, name: &str, operations: Vec<Operation>, matrix: Option<[f64; 6]>) -> Self {
        self.operations
            .push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.forms.push(FormXObject {
            name: name.to_owned(),
            operations,
            matrix,
        });
        self
    }

    pub fn rotate(mut self, rotate: i64) -> Self {
        self.rotate = Some(rotate);
        self
    }

    pub fn crop_box(mut self, crop_box: [f64; 4]) -> Self {
        self.crop_box = Some(crop_box);
        self
    }
}

/// Builds small PDFs in memory. Fonts, resources and the media box live on the
/// page tree root so pages inherit them.
#[derive(Default)]
pub struct TestPdf {
    pages: Vec<TestPage>,
    media_box: Option<[f64; 4]>,
    font: Option<Dictionary>,
}

impl TestPdf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: TestPage) -> Self {
        self.pages.push(page);
        self
    }

    pub fn media_box(mut self, media_box: [f64; 4]) -> Self {
        self.media_box = Some(media_box);
        self
    }

    /// Replaces the Courier font used as `/F1`.
    pub fn font(mut self, font: Dictionary) -> Self {
        self.font = Some(font);
        self
    }

    pub fn build(self) -> Document {
        let mut doc = Document::with_version("1.5");

        let font_id = doc.add_object(self.font.unwrap_or_else(|| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            }
        }));
        let fonts = dictionary! {
            "F1" => Object::Reference(font_id),
        };

        let mut page_ids = Vec::new();
        for page in self.pages {
            let content = Content {
                operations: page.operations,
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode page content"),
            ));

            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Contents" => Object::Reference(content_id),
            };
            if let Some(rotate) = page.rotate {
                page_dict.set("Rotate", Object::Integer(rotate));
            }
            if let Some(crop_box) = page.crop_box {
                page_dict.set("CropBox", crop_box.map(real).to_vec());
            }
            if !page.forms.is_empty() {
                let mut xobjects = Dictionary::new();
                for form in page.forms {
                    let content = Content {
                        operations: form.operations,
                    };
                    let mut dict = dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Form",
                        "BBox" => vec![real(0.), real(0.), real(612.), real(792.)],
                    };
                    if let Some(matrix) = form.matrix {
                        dict.set("Matrix", matrix.map(real).to_vec());
                    }
                    let form_id = doc.add_object(Stream::new(
                        dict,
                        content.encode().expect("encode form content"),
                    ));
                    xobjects.set(form.name, Object::Reference(form_id));
                }
                page_dict.set(
                    "Resources",
                    dictionary! {
                        "Font" => fonts.clone(),
                        "XObject" => xobjects,
                    },
                );
            }
            page_ids.push(doc.add_object(page_dict));
        }

        let media_box = self.media_box.unwrap_or([0., 0., 612., 792.]);
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            "Count" => Object::Integer(page_ids.len() as i64),
            "MediaBox" => media_box.map(real).to_vec(),
            "Resources" => dictionary! {
                "Font" => fonts,
            },
        });
        for &page_id in &page_ids {
            if let Ok(page) = doc.get_object_mut(page_id) {
                if let Ok(dict) = page.as_dict_mut() {
                    dict.set("Parent", Object::Reference(pages_id));
                }
            }
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    pub fn to_bytes(self) -> Vec<u8> {
        let mut doc = self.build();
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save test pdf");
        buf
    }

    /// Saves the document with 128-bit RC4 encryption.
    pub fn to_encrypted_bytes(self, owner_password: &str, user_password: &str) -> Vec<u8> {
        let mut doc = self.build();
        doc.trailer.set(
            "ID",
            vec![
                Object::String(vec![7; 16], StringFormat::Literal),
                Object::String(vec![9; 16], StringFormat::Literal),
            ],
        );
        let version = EncryptionVersion::V2 {
            document: &doc,
            owner_password,
            user_password,
            key_length: 128,
            permissions: Permissions::all(),
        };
        let state = EncryptionState::try_from(version).expect("encryption state");
        doc.encrypt(&state).expect("encrypt test pdf");

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save encrypted test pdf");
        buf
    }
}

/// The twelve words used as the passage in most tests.
pub const WORDS: [&str; 12] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve",
];

pub fn passage() -> String {
    WORDS.join(" ")
}
