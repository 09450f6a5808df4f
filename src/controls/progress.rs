use super::duration;

/// Glyphs used to draw the progress bar.
#[derive(Debug, Clone, Copy)]
pub struct ProgressGlyphs {
    pub filled: &'static str,
    pub marker: &'static str,
    pub empty: &'static str,
    pub playing: &'static str,
    pub paused: &'static str,
}

pub const DEFAULT_GLYPHS: ProgressGlyphs = ProgressGlyphs {
    filled: "━",
    marker: "🔘",
    empty: "━",
    playing: "▶️",
    paused: "⏸️",
};

/// Spaces in an inline code span are much narrower than the bar glyphs, so
/// the gap between the two timestamps is stretched by this factor.
const READOUT_SPREAD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBar {
    /// Play/pause glyph, a space, then the bar.
    pub heading: String,
    /// Filled cells, marker, empty cells.
    pub bar: String,
    /// Elapsed and total time wrapped in an inline code span.
    pub readout: String,
}

/// Number of filled cells for `position_ms` out of `total_ms`, rounded half up.
pub fn filled_cells(position_ms: u64, total_ms: u64, width: usize) -> usize {
    if total_ms == 0 {
        return 0;
    }
    let width = width as u128;
    let position = position_ms as u128;
    let total = total_ms as u128;
    let filled = (2 * width * position + total) / (2 * total);
    filled.min(width) as usize
}

/// Draws the bar for the current track. Returns `None` for untimed content
/// (`total_ms == 0`), in which case the progress field is left out.
pub fn render(
    position_ms: u64,
    total_ms: u64,
    width: usize,
    is_playing: bool,
    glyphs: &ProgressGlyphs,
) -> Option<ProgressBar> {
    if total_ms == 0 {
        return None;
    }

    let filled = filled_cells(position_ms, total_ms, width);
    let bar = format!(
        "{}{}{}",
        glyphs.filled.repeat(filled),
        glyphs.marker,
        glyphs.empty.repeat(width - filled)
    );

    let state_glyph = if is_playing { glyphs.playing } else { glyphs.paused };
    let heading = format!("{} {}", state_glyph, bar);

    let elapsed = duration::format(position_ms.min(total_ms));
    let total = duration::format(total_ms);
    // Widths are counted in UTF-16 units, as the client lays out text.
    let gap = utf16_len(&heading).saturating_sub(utf16_len(&elapsed) + utf16_len(&total))
        * READOUT_SPREAD;
    let readout = format!("`{}{}{}`", elapsed, " ".repeat(gap.saturating_sub(2)), total);

    Some(ProgressBar {
        heading,
        bar,
        readout,
    })
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_position_rounds_up() {
        // 15 * 30000 / 120000 = 3.75
        assert_eq!(filled_cells(30_000, 120_000, 15), 4);

        let progress = render(30_000, 120_000, 15, true, &DEFAULT_GLYPHS).unwrap();
        assert_eq!(progress.bar, format!("{}🔘{}", "━".repeat(4), "━".repeat(10)));
        assert!(progress.heading.starts_with("▶️ "));
        assert!(progress.readout.starts_with("`00:30"));
        assert!(progress.readout.ends_with("02:00`"));
    }

    #[test]
    fn test_bar_is_width_plus_marker() {
        for (pos, total) in [(0, 1), (1, 3), (59_999, 60_000), (60_000, 60_000), (10, 7)] {
            let progress = render(pos, total, 15, false, &DEFAULT_GLYPHS).unwrap();
            assert_eq!(progress.bar.chars().count(), 16, "pos={} total={}", pos, total);
        }
    }

    #[test]
    fn test_untimed_track_has_no_bar() {
        assert!(render(12_000, 0, 15, true, &DEFAULT_GLYPHS).is_none());
    }

    #[test]
    fn test_overrun_is_clamped() {
        assert_eq!(filled_cells(200_000, 100_000, 15), 15);
        let progress = render(200_000, 100_000, 15, true, &DEFAULT_GLYPHS).unwrap();
        assert!(progress.bar.ends_with("🔘"));
        assert!(progress.readout.starts_with("`01:40"));
    }

    #[test]
    fn test_paused_glyph() {
        let progress = render(0, 60_000, 15, false, &DEFAULT_GLYPHS).unwrap();
        assert!(progress.heading.starts_with("⏸️ 🔘"));
    }

    #[test]
    fn test_readout_padding() {
        let progress = render(30_000, 120_000, 15, true, &DEFAULT_GLYPHS).unwrap();
        // heading: 2-unit glyph + space + 15 cells + 2-unit marker = 20 units
        assert_eq!(utf16_len(&progress.heading), 20);
        let expected_gap = (20 - 10) * READOUT_SPREAD - 2;
        assert_eq!(progress.readout.len(), 2 + 10 + expected_gap);
    }

    #[test]
    fn test_readout_counts_surrogate_pairs() {
        let progress = render(0, 60_000, 15, false, &DEFAULT_GLYPHS).unwrap();
        assert_eq!(progress.heading.chars().count(), 19);
        assert_eq!(utf16_len(&progress.heading), 20);
        assert_eq!(progress.readout, format!("`00:00{}01:00`", " ".repeat(28)));
    }
}
