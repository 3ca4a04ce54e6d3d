use crate::render::{
    luma_u8, rgb_at, text_frame_begin, text_frame_end, write_bg_rgb, write_fg_rgb, Frame, Renderer,
};
use std::io::Write;

/// 2×4 pixels per cell. Pixels brighter than the cell's mid luma become
/// raised dots in their average color; the rest set the background.
pub struct BrailleRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Braille dot bit for pixel `dy * 2 + dx` of a cell.
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

#[derive(Default)]
struct ColorSum {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl ColorSum {
    fn add(&mut self, (r, g, b): (u8, u8, u8)) {
        self.r += r as u32;
        self.g += g as u32;
        self.b += b as u32;
        self.n += 1;
    }

    fn mean(&self) -> Option<(u8, u8, u8)> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

/// Glyph, foreground and background for one 2×4 block.
pub(crate) fn encode_cell(rgb: &[(u8, u8, u8); 8]) -> (char, (u8, u8, u8), (u8, u8, u8)) {
    let lum = rgb.map(|(r, g, b)| luma_u8(r, g, b));
    let min_l = lum.iter().copied().min().unwrap_or(0);
    let max_l = lum.iter().copied().max().unwrap_or(0);
    let thr = ((min_l as u16 + max_l as u16) / 2) as u8;

    let mut bits = 0u8;
    let mut on = ColorSum::default();
    let mut off = ColorSum::default();
    for i in 0..8 {
        if lum[i] > thr {
            bits |= DOT_BITS[i];
            on.add(rgb[i]);
        } else {
            off.add(rgb[i]);
        }
    }

    let bg = off.mean().unwrap_or((0, 0, 0));
    if bits == 0 {
        return (' ', bg, bg);
    }
    let fg = on.mean().unwrap_or((0, 0, 0));
    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
    (ch, fg, off.mean().unwrap_or(fg))
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w, _h)) = text_frame_begin(frame, 2, 4, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        self.last_bg = None;

        let mut rgb = [(0u8, 0u8, 0u8); 8];
        let mut glyph = [0u8; 4];
        for row in 0..visual_rows {
            for col in 0..cols {
                for dy in 0..4usize {
                    for dx in 0..2usize {
                        rgb[dy * 2 + dx] = rgb_at(frame.pixels_rgba, w, col * 2 + dx, row * 4 + dy);
                    }
                }
                let (ch, fg, bg) = encode_cell(&rgb);

                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write_bg_rgb(out, bg.0, bg.1, bg.2)?;
                    self.last_bg = Some(bg);
                }
                out.write_all(ch.encode_utf8(&mut glyph).as_bytes())?;
            }
            out.write_all(b"\r\n")?;
        }

        text_frame_end(frame, cols, visual_rows, out)
    }
}
