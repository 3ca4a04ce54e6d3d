use crate::render::{luma_u8, rgb_at, text_frame_begin, text_frame_end, write_fg_rgb, Frame, Renderer};
use std::io::Write;

/// One pixel per cell: a luma ramp glyph tinted with the pixel color.
pub struct AsciiRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self { last_fg: None }
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Dark to bright.
const RAMP: &[u8] = b" .,:;irsXA253hMHGS#9B&@";

pub(crate) fn ramp_glyph(luma: u8) -> u8 {
    RAMP[luma as usize * (RAMP.len() - 1) / 255]
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w, _h)) = text_frame_begin(frame, 1, 1, out)? else {
            return Ok(());
        };
        self.last_fg = None;

        for y in 0..visual_rows {
            for x in 0..cols {
                let fg = rgb_at(frame.pixels_rgba, w, x, y);
                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                out.write_all(&[ramp_glyph(luma_u8(fg.0, fg.1, fg.2))])?;
            }
            out.write_all(b"\r\n")?;
        }

        text_frame_end(frame, cols, visual_rows, out)
    }
}
