//! Layout of the text panel drawn over the blank field.

use prefire_rendering::Overlay;

/// Font size of the first line of a panel.
pub const TITLE_FONT_SIZE: u16 = 44;
/// Font size of the remaining lines.
pub const BODY_FONT_SIZE: u16 = 28;
const LINE_GAP: f32 = 14.0;

/// A single positioned line of panel text.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    /// Text to draw.
    pub text: String,
    /// Left edge in screen pixels.
    pub x: f32,
    /// Baseline in screen pixels.
    pub baseline: f32,
    /// Font size in pixels.
    pub font_size: u16,
}

/// Centres the overlay lines on a `width` by `height` screen.
///
/// `measure` returns the rendered width of a string at a font size.
pub fn layout_overlay<M>(
    overlay: &Overlay,
    width: f32,
    height: f32,
    mut measure: M,
) -> Vec<PlacedLine>
where
    M: FnMut(&str, u16) -> f32,
{
    let lines = overlay.lines();
    if lines.is_empty() {
        return Vec::new();
    }

    let sizes: Vec<u16> = (0..lines.len())
        .map(|index| {
            if index == 0 {
                TITLE_FONT_SIZE
            } else {
                BODY_FONT_SIZE
            }
        })
        .collect();
    let block_height: f32 = sizes.iter().map(|&size| f32::from(size)).sum::<f32>()
        + LINE_GAP * (lines.len() - 1) as f32;

    let mut baseline = (height - block_height) / 2.0;
    lines
        .into_iter()
        .zip(sizes)
        .map(|(text, font_size)| {
            baseline += f32::from(font_size);
            let x = ((width - measure(&text, font_size)) / 2.0).max(0.0);
            let placed = PlacedLine {
                text,
                x,
                baseline,
                font_size,
            };
            baseline += LINE_GAP;
            placed
        })
        .collect()
}
