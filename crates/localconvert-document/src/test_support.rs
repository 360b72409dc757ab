// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixtures shared by the unit tests: small synthetic images and hand-built PDFs.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

pub(crate) fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128])
    });
    DynamicImage::ImageRgb8(img)
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), format)
        .expect("encode fixture");
    buffer
}

pub(crate) fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

pub(crate) fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Jpeg)
}

/// Description of one fixture page: its width in points (used to identify
/// the page after a merge) and the RGB fill painted over its whole area.
#[derive(Clone, Copy)]
pub(crate) struct FixturePage {
    pub width: i64,
    pub height: i64,
    pub fill: (f32, f32, f32),
}

impl FixturePage {
    pub fn new(width: i64, fill: (f32, f32, f32)) -> Self {
        Self {
            width,
            height: 100,
            fill,
        }
    }
}

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

fn fill_content(page: &FixturePage) -> Vec<u8> {
    let (r, g, b) = page.fill;
    let content = Content {
        operations: vec![
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new(
                "re",
                vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(page.width),
                    Object::Integer(page.height),
                ],
            ),
            Operation::new("f", vec![]),
        ],
    };
    content.encode().expect("encode content stream")
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>, inherited_box: Option<Object>) -> Vec<u8> {
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    if let Some(media) = inherited_box {
        pages.set("MediaBox", media);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save fixture PDF");
    bytes
}

/// Build a PDF whose pages each carry their own MediaBox and a solid fill.
pub(crate) fn pdf_with_pages(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), fill_content(page)));
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(pages_id));
        dict.set("MediaBox", media_box(page.width, page.height));
        dict.set("Contents", Object::Reference(content_id));
        dict.set("Resources", Object::Dictionary(Dictionary::new()));
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(dict))));
    }

    finish(doc, pages_id, kids, None)
}

/// Build a PDF where the MediaBox lives only on the page tree root, so pages
/// must inherit it.
pub(crate) fn pdf_with_inherited_media_box(page_count: usize, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let fixture = FixturePage {
        width,
        height,
        fill: (0.0, 0.0, 1.0),
    };
    let mut kids = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), fill_content(&fixture)));
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(pages_id));
        dict.set("Contents", Object::Reference(content_id));
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(dict))));
    }
    finish(doc, pages_id, kids, Some(media_box(width, height)))
}

/// Width (in points) of every page of `pdf`, in page order.
pub(crate) fn page_widths(pdf: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(pdf).expect("load merged output");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let dict = doc
                .get_object(*page_id)
                .and_then(Object::as_dict)
                .expect("page dictionary");
            let media = dict
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("page carries its own MediaBox");
            match &media[2] {
                Object::Integer(w) => *w,
                Object::Real(w) => *w as i64,
                other => panic!("unexpected MediaBox entry {other:?}"),
            }
        })
        .collect()
}

/// A 200x100 pt page whose left half is covered by a raw (unfiltered) 2x1
/// RGB image XObject: a green pixel then a blue pixel.
pub(crate) fn pdf_with_image_xobject() -> Vec<u8> {
    pdf_with_image_scaled_to(100)
}

/// One 200x100 page drawing a 2x1 RGB image (green, blue) scaled by
/// `size` points in both directions from the origin.
pub(crate) fn pdf_with_image_scaled_to(size: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut image_dict = Dictionary::new();
    image_dict.set("Type", Object::Name(b"XObject".to_vec()));
    image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
    image_dict.set("Width", Object::Integer(2));
    image_dict.set("Height", Object::Integer(1));
    image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    image_dict.set("BitsPerComponent", Object::Integer(8));
    let image_id = doc.add_object(Stream::new(image_dict, vec![0, 255, 0, 0, 0, 255]));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(size),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(size),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("encode content stream"),
    ));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("MediaBox", media_box(200, 100));
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    let page_id = doc.add_object(Object::Dictionary(page));

    finish(doc, pages_id, vec![Object::Reference(page_id)], None)
}
