// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in preview rasterizer over the parsed `lopdf` document.
//
// Covers what thumbnails of scanned and generated pages actually contain:
// filled paths in device gray/RGB/CMYK, and image XObjects (JPEG, or 8-bit
// Gray/RGB/CMYK samples behind any lopdf-supported filter), with graphics
// state nesting and form XObjects. Text is not drawn.

use std::collections::HashSet;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use localconvert_core::error::{ConvertError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use super::PageRasterizer;
use crate::pdf::loader::LoadedPdf;

/// US Letter, used when a page has no usable MediaBox anywhere in its tree.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];
const MAX_TREE_DEPTH: usize = 64;
/// Largest edge, in pixels, the rasterizer will allocate.
const MAX_EDGE_PX: u32 = 8192;

/// Pure-Rust rasterizer for page thumbnails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfRasterizer;

impl PageRasterizer for LopdfRasterizer {
    fn rasterize(&self, doc: &LoadedPdf, page_index: usize, scale: f32) -> Result<DynamicImage> {
        let page_id = doc.page_id(page_index)?;
        let fail = |reason: String| ConvertError::MalformedDocument {
            name: doc.name().to_string(),
            reason,
        };

        let document = doc.document();
        let media_box = media_box(document, page_id);
        let (width, height) = pixel_size(media_box, scale);
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        let content_bytes = page_content(document, page_id)
            .map_err(|err| fail(format!("page {} content unreadable: {err}", page_index + 1)))?;
        let content = Content::decode(&content_bytes)
            .map_err(|err| fail(format!("page {} content does not parse: {err}", page_index + 1)))?;
        let resources = inherited(document, page_id, b"Resources")
            .and_then(|obj| resolve_dict(document, obj))
            .cloned()
            .unwrap_or_default();

        // Device space: origin top-left, y down, `scale` pixels per point.
        let [x0, _, _, y1] = media_box;
        let device = Matrix::new(scale, 0.0, 0.0, -scale, -x0 * scale, y1 * scale);

        let mut painter = Painter {
            doc: document,
            canvas: &mut canvas,
            visited_forms: HashSet::new(),
            painted: 0,
        };
        painter
            .run(&content.operations, &resources, GraphicsState::new(device))
            .map_err(fail)?;

        debug!(
            page = page_index + 1,
            width,
            height,
            painted = painter.painted,
            "Page rasterized"
        );
        Ok(DynamicImage::ImageRgb8(canvas))
    }
}

/// Pixel size of page `page_index` at `scale`, falling back to Letter when the
/// page cannot be resolved.
pub(crate) fn page_pixel_size(doc: &LoadedPdf, page_index: usize, scale: f32) -> (u32, u32) {
    let media = doc
        .page_id(page_index)
        .map(|id| media_box(doc.document(), id))
        .unwrap_or(DEFAULT_MEDIA_BOX);
    pixel_size(media, scale)
}

fn pixel_size(media_box: [f32; 4], scale: f32) -> (u32, u32) {
    let [x0, y0, x1, y1] = media_box;
    let edge = |len: f32| ((len.abs() * scale).round() as u32).clamp(1, MAX_EDGE_PX);
    (edge(x1 - x0), edge(y1 - y0))
}

/// MediaBox of a page, normalised to `[llx, lly, urx, ury]`.
fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| resolve(doc, obj)?.as_array().ok())
        .and_then(|arr| parse_rect(arr))
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

fn parse_rect(arr: &[Object]) -> Option<[f32; 4]> {
    if arr.len() < 4 {
        return None;
    }
    let (a, b, c, d) = (
        number(&arr[0])?,
        number(&arr[1])?,
        number(&arr[2])?,
        number(&arr[3])?,
    );
    if (c - a).abs() < 1.0 || (d - b).abs() < 1.0 {
        return None;
    }
    Some([a.min(c), b.min(d), a.max(c), b.max(d)])
}

/// Look `key` up on the page, then on each ancestor.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_TREE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            _ => return Some(obj),
        }
    }
    None
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj)?.as_dict().ok()
}

/// Decoded content of a page, whose `/Contents` may be one stream or an array.
fn page_content(doc: &Document, page_id: ObjectId) -> std::result::Result<Vec<u8>, String> {
    let page = doc.get_dictionary(page_id).map_err(|err| err.to_string())?;
    let contents = match page.get(b"Contents") {
        Ok(obj) => resolve(doc, obj).ok_or("page contents cannot be resolved")?,
        Err(_) => return Ok(Vec::new()),
    };
    let streams: Vec<&Object> = match contents {
        Object::Array(parts) => parts.iter().collect(),
        single => vec![single],
    };

    let mut bytes = Vec::new();
    for part in streams {
        let stream = resolve(doc, part)
            .and_then(|obj| obj.as_stream().ok())
            .ok_or("page contents entry is not a stream")?;
        let plain = stream.get_plain_content().map_err(|err| err.to_string())?;
        bytes.extend_from_slice(&plain);
        bytes.push(b'\n');
    }
    Ok(bytes)
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(v) => Some(*v as f32),
        Object::Real(v) => Some(*v),
        _ => None,
    }
}

fn operands<const N: usize>(op: &Operation) -> Option<[f32; N]> {
    if op.operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(&op.operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

fn to_byte(component: f32) -> u8 {
    (component.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> Rgb<u8> {
    let k = k.clamp(0.0, 1.0);
    Rgb([
        to_byte((1.0 - c) * (1.0 - k)),
        to_byte((1.0 - m) * (1.0 - k)),
        to_byte((1.0 - y) * (1.0 - k)),
    ])
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn from_object(obj: &Object) -> Option<Self> {
        let arr = obj.as_array().ok()?;
        if arr.len() < 6 {
            return None;
        }
        Some(Self::new(
            number(&arr[0])?,
            number(&arr[1])?,
            number(&arr[2])?,
            number(&arr[3])?,
            number(&arr[4])?,
            number(&arr[5])?,
        ))
    }

    /// `self` applied first, then `then`.
    fn then(self, then: Self) -> Self {
        Self {
            a: self.a * then.a + self.b * then.c,
            b: self.a * then.b + self.b * then.d,
            c: self.c * then.a + self.d * then.c,
            d: self.c * then.b + self.d * then.d,
            e: self.e * then.a + self.f * then.c + then.e,
            f: self.e * then.b + self.f * then.d + then.f,
        }
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Device-space bounds of the unit square, if the transform keeps it axis-aligned.
    fn unit_square_bounds(self) -> Option<(f32, f32, f32, f32)> {
        if self.b.abs() > 1e-4 || self.c.abs() > 1e-4 {
            return None;
        }
        let (x0, x1) = (self.e, self.e + self.a);
        let (y0, y1) = (self.f, self.f + self.d);
        Some((x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    fill: Rgb<u8>,
    stroke: Rgb<u8>,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            fill: Rgb([0, 0, 0]),
            stroke: Rgb([0, 0, 0]),
        }
    }
}

/// Current path, already transformed to device space.
#[derive(Default)]
struct Path {
    subpaths: Vec<Vec<(f32, f32)>>,
}

impl Path {
    fn move_to(&mut self, p: (f32, f32)) {
        self.subpaths.push(vec![p]);
    }

    fn line_to(&mut self, p: (f32, f32)) {
        match self.subpaths.last_mut() {
            Some(sub) => sub.push(p),
            None => self.subpaths.push(vec![p]),
        }
    }

    fn clear(&mut self) {
        self.subpaths.clear();
    }
}

struct Painter<'a> {
    doc: &'a Document,
    canvas: &'a mut RgbImage,
    visited_forms: HashSet<ObjectId>,
    painted: usize,
}

impl Painter<'_> {
    fn run(
        &mut self,
        operations: &[Operation],
        resources: &Dictionary,
        mut state: GraphicsState,
    ) -> std::result::Result<(), String> {
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut path = Path::default();

        for op in operations {
            match op.operator.as_str() {
                "q" => stack.push(state),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some([a, b, c, d, e, f]) = operands::<6>(op) {
                        state.ctm = Matrix::new(a, b, c, d, e, f).then(state.ctm);
                    }
                }
                "g" => {
                    if let Some([gray]) = operands::<1>(op) {
                        let v = to_byte(gray);
                        state.fill = Rgb([v, v, v]);
                    }
                }
                "G" => {
                    if let Some([gray]) = operands::<1>(op) {
                        let v = to_byte(gray);
                        state.stroke = Rgb([v, v, v]);
                    }
                }
                "rg" => {
                    if let Some([r, g, b]) = operands::<3>(op) {
                        state.fill = Rgb([to_byte(r), to_byte(g), to_byte(b)]);
                    }
                }
                "RG" => {
                    if let Some([r, g, b]) = operands::<3>(op) {
                        state.stroke = Rgb([to_byte(r), to_byte(g), to_byte(b)]);
                    }
                }
                "k" => {
                    if let Some([c, m, y, k]) = operands::<4>(op) {
                        state.fill = cmyk_to_rgb(c, m, y, k);
                    }
                }
                "K" => {
                    if let Some([c, m, y, k]) = operands::<4>(op) {
                        state.stroke = cmyk_to_rgb(c, m, y, k);
                    }
                }
                "m" => {
                    if let Some([x, y]) = operands::<2>(op) {
                        path.move_to(state.ctm.apply(x, y));
                    }
                }
                "l" => {
                    if let Some([x, y]) = operands::<2>(op) {
                        path.line_to(state.ctm.apply(x, y));
                    }
                }
                // Curves are flattened to their end point.
                "c" => {
                    if let Some([_, _, _, _, x, y]) = operands::<6>(op) {
                        path.line_to(state.ctm.apply(x, y));
                    }
                }
                "v" | "y" => {
                    if let Some([_, _, x, y]) = operands::<4>(op) {
                        path.line_to(state.ctm.apply(x, y));
                    }
                }
                "re" => {
                    if let Some([x, y, w, h]) = operands::<4>(op) {
                        path.move_to(state.ctm.apply(x, y));
                        path.line_to(state.ctm.apply(x + w, y));
                        path.line_to(state.ctm.apply(x + w, y + h));
                        path.line_to(state.ctm.apply(x, y + h));
                    }
                }
                "f" | "F" | "f*" => {
                    self.fill_path(&path, state.fill);
                    path.clear();
                }
                "B" | "B*" | "b" | "b*" => {
                    self.fill_path(&path, state.fill);
                    self.stroke_path(&path, state.stroke, true);
                    path.clear();
                }
                "S" => {
                    self.stroke_path(&path, state.stroke, false);
                    path.clear();
                }
                "s" => {
                    self.stroke_path(&path, state.stroke, true);
                    path.clear();
                }
                "n" => path.clear(),
                "Do" => {
                    let name = op
                        .operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .ok_or("Do without an XObject name")?;
                    self.draw_xobject(resources, name, state)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn fill_path(&mut self, path: &Path, color: Rgb<u8>) {
        for sub in &path.subpaths {
            if sub.len() < 3 {
                continue;
            }
            if let Some(rect) = axis_aligned_rect(sub) {
                draw_filled_rect_mut(self.canvas, rect, color);
                self.painted += 1;
                continue;
            }
            let mut points: Vec<Point<i32>> = sub
                .iter()
                .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32))
                .collect();
            points.dedup();
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            if points.len() >= 3 {
                draw_polygon_mut(self.canvas, &points, color);
                self.painted += 1;
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, color: Rgb<u8>, close: bool) {
        for sub in &path.subpaths {
            for pair in sub.windows(2) {
                draw_line_segment_mut(self.canvas, pair[0], pair[1], color);
            }
            if close && sub.len() > 2 {
                if let (Some(first), Some(last)) = (sub.first(), sub.last()) {
                    draw_line_segment_mut(self.canvas, *last, *first, color);
                }
            }
        }
    }

    fn draw_xobject(
        &mut self,
        resources: &Dictionary,
        name: &[u8],
        state: GraphicsState,
    ) -> std::result::Result<(), String> {
        let doc = self.doc;
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
        else {
            return Err(format!("XObject /{} used without resources", String::from_utf8_lossy(name)));
        };
        let id = xobjects
            .get(name)
            .and_then(Object::as_reference)
            .map_err(|_| format!("XObject /{} is missing", String::from_utf8_lossy(name)))?;
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|err| format!("XObject {id:?} unreadable: {err}"))?;

        let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).unwrap_or(b"");
        match subtype {
            b"Image" => self.draw_image(stream, state.ctm),
            b"Form" => self.draw_form(id, stream, resources, state),
            _ => Ok(()),
        }
    }

    fn draw_form(
        &mut self,
        id: ObjectId,
        stream: &Stream,
        parent_resources: &Dictionary,
        mut state: GraphicsState,
    ) -> std::result::Result<(), String> {
        if !self.visited_forms.insert(id) {
            return Ok(());
        }
        let bytes = stream
            .get_plain_content()
            .map_err(|err| format!("form XObject {id:?} cannot be decoded: {err}"))?;
        let content = Content::decode(&bytes).map_err(|err| format!("form XObject {id:?}: {err}"))?;
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(Matrix::from_object)
            .unwrap_or(Matrix::IDENTITY);
        state.ctm = form_matrix.then(state.ctm);

        let doc = self.doc;
        let resources = match stream.dict.get(b"Resources").ok().and_then(|obj| resolve_dict(doc, obj)) {
            Some(own) => own.clone(),
            None => parent_resources.clone(),
        };
        let result = self.run(&content.operations, &resources, state);
        self.visited_forms.remove(&id);
        result
    }

    fn draw_image(&mut self, stream: &Stream, ctm: Matrix) -> std::result::Result<(), String> {
        let Some((left, top, right, bottom)) = ctm.unit_square_bounds() else {
            // Rotated or skewed images are not drawn in thumbnails.
            return Ok(());
        };
        let (w, h) = (right - left, bottom - top);
        if w.round() < 1.0 || h.round() < 1.0 {
            return Ok(());
        }

        // Only the part that lands on the canvas is resampled.
        let (canvas_w, canvas_h) = self.canvas.dimensions();
        let visible_left = left.max(0.0);
        let visible_top = top.max(0.0);
        let visible_right = right.min(canvas_w as f32);
        let visible_bottom = bottom.min(canvas_h as f32);
        let (dst_w, dst_h) = (
            (visible_right - visible_left).round(),
            (visible_bottom - visible_top).round(),
        );
        if dst_w < 1.0 || dst_h < 1.0 {
            return Ok(());
        }

        let image = decode_image_xobject(self.doc, stream)?.to_rgb8();
        let (src_w, src_h) = image.dimensions();
        let span = |from: f32, to: f32, origin: f32, extent: f32, len: u32| {
            let start = ((from - origin) / extent * len as f32).floor().max(0.0) as u32;
            let start = start.min(len - 1);
            let end = (((to - origin) / extent * len as f32).ceil() as u32).clamp(start + 1, len);
            (start, end - start)
        };
        let (sx, sw) = span(visible_left, visible_right, left, w, src_w);
        let (sy, sh) = span(visible_top, visible_bottom, top, h, src_h);

        let visible = imageops::crop_imm(&image, sx, sy, sw, sh).to_image();
        let resized = imageops::resize(&visible, dst_w as u32, dst_h as u32, FilterType::Triangle);
        imageops::overlay(
            self.canvas,
            &resized,
            visible_left.round() as i64,
            visible_top.round() as i64,
        );
        self.painted += 1;
        Ok(())
    }
}

/// Bounding rect of a four-corner subpath whose edges are axis-aligned.
fn axis_aligned_rect(points: &[(f32, f32)]) -> Option<Rect> {
    let corners = match points {
        [a, b, c, d] => [*a, *b, *c, *d],
        [a, b, c, d, e] if (a.0 - e.0).abs() < 0.5 && (a.1 - e.1).abs() < 0.5 => [*a, *b, *c, *d],
        _ => return None,
    };
    let xs: HashSet<i32> = corners.iter().map(|p| p.0.round() as i32).collect();
    let ys: HashSet<i32> = corners.iter().map(|p| p.1.round() as i32).collect();
    if xs.len() > 2 || ys.len() > 2 {
        return None;
    }
    let left = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min).round() as i32;
    let right = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max).round() as i32;
    let top = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min).round() as i32;
    let bottom = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max).round() as i32;
    let (w, h) = ((right - left).max(1) as u32, (bottom - top).max(1) as u32);
    Some(Rect::at(left, top).of_size(w, h))
}

/// Decode an image XObject into pixels.
fn decode_image_xobject(doc: &Document, stream: &Stream) -> std::result::Result<DynamicImage, String> {
    let filters = stream.filters().unwrap_or_default();
    if filters.iter().any(|f| *f == b"DCTDecode") {
        return image::load_from_memory(&stream.content).map_err(|err| format!("embedded JPEG: {err}"));
    }

    let width = dimension(stream, b"Width")?;
    let height = dimension(stream, b"Height")?;
    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(number)
        .unwrap_or(8.0);
    if (bits - 8.0).abs() > f32::EPSILON {
        return Err(format!("{bits}-bit image samples are not supported"));
    }

    let channels = match stream.dict.get(b"ColorSpace").ok().map(|obj| resolve(doc, obj)) {
        Some(Some(Object::Name(name))) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => 1,
            b"DeviceRGB" | b"CalRGB" | b"RGB" => 3,
            b"DeviceCMYK" | b"CMYK" => 4,
            other => return Err(format!("colour space /{} not supported", String::from_utf8_lossy(other))),
        },
        // ICCBased and friends: go by the /N of the profile when present.
        Some(Some(Object::Array(arr))) => arr
            .get(1)
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|profile| profile.dict.get(b"N").ok().and_then(|n| n.as_i64().ok()))
            .filter(|n| matches!(n, 1 | 3 | 4))
            .ok_or("unsupported colour space array")? as usize,
        Some(_) => return Err("unsupported colour space".to_string()),
        None => 1,
    };

    let samples = stream
        .get_plain_content()
        .map_err(|err| format!("image samples cannot be decoded: {err}"))?;
    let expected = width as usize * height as usize * channels;
    if samples.len() < expected {
        return Err(format!("image has {} sample bytes, expected {expected}", samples.len()));
    }
    let samples = &samples[..expected];

    let image = match channels {
        1 => GrayImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, samples.to_vec()).map(DynamicImage::ImageRgb8),
        _ => {
            let rgb: Vec<u8> = samples
                .chunks_exact(4)
                .flat_map(|px| {
                    let [c, m, y, k] = [px[0], px[1], px[2], px[3]].map(|v| f32::from(v) / 255.0);
                    cmyk_to_rgb(c, m, y, k).0
                })
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };
    image.ok_or_else(|| "image buffer size mismatch".to_string())
}

fn dimension(stream: &Stream, key: &[u8]) -> std::result::Result<u32, String> {
    stream
        .dict
        .get(key)
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| format!("image /{} missing or invalid", String::from_utf8_lossy(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::compositor::PdfPageCompositor;
    use crate::pdf::loader::PdfDocumentLoader;
    use crate::render::PdfPageRenderer;
    use crate::test_support::{
        FixturePage, gradient_png, pdf_with_image_scaled_to, pdf_with_image_xobject, pdf_with_inherited_media_box,
        pdf_with_pages,
    };

    fn load(bytes: Vec<u8>) -> LoadedPdf {
        PdfDocumentLoader::new().load("raster.pdf", bytes).expect("load")
    }

    #[test]
    fn page_fill_is_painted() {
        let doc = load(pdf_with_pages(&[FixturePage::new(200, (1.0, 0.0, 0.0))]));
        let image = LopdfRasterizer.rasterize(&doc, 0, 0.5).expect("rasterize").to_rgb8();
        assert_eq!(image.dimensions(), (100, 50));
        assert_eq!(*image.get_pixel(50, 25), Rgb([255, 0, 0]));
    }

    #[test]
    fn inherited_media_box_sets_canvas_size() {
        let doc = load(pdf_with_inherited_media_box(1, 400, 600));
        let image = LopdfRasterizer.rasterize(&doc, 0, 0.25).expect("rasterize");
        assert_eq!((image.width(), image.height()), (100, 150));
    }

    #[test]
    fn raw_rgb_image_xobject_is_drawn() {
        let doc = load(pdf_with_image_xobject());
        let image = LopdfRasterizer.rasterize(&doc, 0, 1.0).expect("rasterize").to_rgb8();
        assert_eq!(image.dimensions(), (200, 100));
        // The 2x1 image covers the left half: green then blue, over a white page.
        assert_eq!(*image.get_pixel(20, 50), Rgb([0, 255, 0]));
        assert_eq!(*image.get_pixel(80, 50), Rgb([0, 0, 255]));
        assert_eq!(*image.get_pixel(150, 50), Rgb([255, 255, 255]));
    }

    #[test]
    fn oversized_image_is_clipped_to_the_canvas() {
        let doc = load(pdf_with_image_scaled_to(100_000));
        let image = LopdfRasterizer.rasterize(&doc, 0, 1.0).expect("rasterize").to_rgb8();
        assert_eq!(image.dimensions(), (200, 100));
        // Only the first (green) source column reaches the page.
        assert_eq!(*image.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*image.get_pixel(190, 90), Rgb([0, 255, 0]));

        let preview = PdfPageRenderer::default().render_page(&doc, 0).expect("render");
        assert!(!preview.is_placeholder);
        assert_eq!((preview.width, preview.height), (100, 50));
    }

    #[test]
    fn image_entirely_off_the_page_is_skipped() {
        let doc = load(pdf_with_image_scaled_to(-100));
        let image = LopdfRasterizer.rasterize(&doc, 0, 1.0).expect("rasterize").to_rgb8();
        assert!(image.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn composed_image_page_renders_at_letter_size() {
        let pdf = PdfPageCompositor::default()
            .image_to_single_page_pdf(&gradient_png(64, 64), "image/png")
            .expect("compose");
        let doc = load(pdf);
        let preview = PdfPageRenderer::default().render_page(&doc, 0).expect("render");
        assert_eq!((preview.width, preview.height), (306, 396));
    }

    #[test]
    fn matrices_compose_in_pdf_order() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::new(1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        // Scale first, then shift.
        assert_eq!(scale.then(shift).apply(1.0, 1.0), (12.0, 2.0));
        // Shift first, then scale.
        assert_eq!(shift.then(scale).apply(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn cmyk_black_is_black() {
        assert_eq!(cmyk_to_rgb(0.0, 0.0, 0.0, 1.0), Rgb([0, 0, 0]));
        assert_eq!(cmyk_to_rgb(0.0, 0.0, 0.0, 0.0), Rgb([255, 255, 255]));
    }
}
