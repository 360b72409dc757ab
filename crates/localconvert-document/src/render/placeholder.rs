// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Placeholder preview card — white page, red frame and cross, page number.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([220, 38, 38, 255]);
const INK: Rgba<u8> = Rgba([55, 65, 81, 255]);

/// 3x5 bitmap glyphs for the digits 0-9, one row per entry, MSB on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Draw the placeholder card for 1-based `page_number`.
pub fn placeholder_card(width: u32, height: u32, page_number: usize) -> DynamicImage {
    let width = width.max(1);
    let height = height.max(1);
    let mut card = RgbaImage::from_pixel(width, height, WHITE);

    let frame = (width.min(height) / 50).max(1);
    for inset in 0..frame {
        let (w, h) = (width.saturating_sub(2 * inset), height.saturating_sub(2 * inset));
        if w == 0 || h == 0 {
            break;
        }
        draw_hollow_rect_mut(
            &mut card,
            Rect::at(inset as i32, inset as i32).of_size(w, h),
            RED,
        );
    }

    let (right, bottom) = ((width - 1) as f32, (height - 1) as f32);
    draw_line_segment_mut(&mut card, (0.0, 0.0), (right, bottom), RED);
    draw_line_segment_mut(&mut card, (right, 0.0), (0.0, bottom), RED);

    draw_page_number(&mut card, page_number);
    DynamicImage::ImageRgba8(card)
}

fn draw_page_number(card: &mut RgbaImage, page_number: usize) {
    let digits: Vec<usize> = page_number
        .to_string()
        .bytes()
        .map(|b| usize::from(b - b'0'))
        .collect();

    // Glyph cell is 3x5 plus one column of spacing; the label spans ~1/3 of the width.
    let columns = digits.len() as u32 * 4 - 1;
    let cell = (card.width() / 3 / columns).min(card.height() / 4 / 5).max(1);
    let label_w = columns * cell;
    let label_h = 5 * cell;
    if label_w + 2 * cell > card.width() || label_h + 2 * cell > card.height() {
        return;
    }

    let x0 = ((card.width() - label_w) / 2) as i32;
    let y0 = ((card.height() - label_h) / 2) as i32;
    let pad = cell as i32;
    draw_filled_rect_mut(
        card,
        Rect::at(x0 - pad, y0 - pad).of_size(label_w + 2 * cell, label_h + 2 * cell),
        WHITE,
    );

    for (position, digit) in digits.iter().enumerate() {
        let glyph_x = x0 + (position as u32 * 4 * cell) as i32;
        for (row, bits) in DIGITS[*digit].iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                draw_filled_rect_mut(
                    card,
                    Rect::at(glyph_x + (col * cell) as i32, y0 + (row as u32 * cell) as i32)
                        .of_size(cell, cell),
                    INK,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_has_requested_size_and_red_frame() {
        let card = placeholder_card(120, 160, 7).to_rgba8();
        assert_eq!(card.dimensions(), (120, 160));
        assert_eq!(*card.get_pixel(60, 0), RED);
        assert_eq!(*card.get_pixel(0, 80), RED);
    }

    #[test]
    fn page_number_is_drawn_in_the_middle() {
        let card = placeholder_card(300, 400, 12).to_rgba8();
        let ink = card.pixels().filter(|p| **p == INK).count();
        assert!(ink > 0, "digits must be visible");
    }

    #[test]
    fn tiny_cards_do_not_panic() {
        let card = placeholder_card(1, 1, 3);
        assert_eq!((card.width(), card.height()), (1, 1));
        let zero = placeholder_card(0, 0, 100);
        assert_eq!((zero.width(), zero.height()), (1, 1));
    }
}
