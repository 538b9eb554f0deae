use console::measure_text_width;

/// Display width of `s` in terminal columns, ignoring ANSI escapes.
pub fn display_width(s: &str) -> usize {
    measure_text_width(s)
}

/// Wrap a single line into pieces no wider than `max_width` columns.
///
/// Breaks at the last space that fits, or mid-word when a word alone is too wide.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = Vec::new();
    let mut remaining = text;

    while display_width(remaining) > max_width {
        let mut break_pos = None;
        let mut char_end = 0;
        let mut width = 0;
        for (pos, ch) in remaining.char_indices() {
            let ch_width = display_width(ch.encode_utf8(&mut [0; 4]));
            if width + ch_width > max_width {
                break;
            }
            if ch == ' ' {
                break_pos = Some(pos);
            }
            width += ch_width;
            char_end = pos + ch.len_utf8();
        }

        match break_pos.filter(|&pos| pos > 0) {
            Some(pos) => {
                lines.push(remaining[..pos].to_string());
                remaining = remaining[pos + 1..].trim_start();
            }
            None => {
                // A single wide character can exceed a tiny width; always make progress.
                let end = if char_end == 0 {
                    remaining.chars().next().map_or(remaining.len(), char::len_utf8)
                } else {
                    char_end
                };
                lines.push(remaining[..end].to_string());
                remaining = &remaining[end..];
            }
        }
    }

    if !remaining.is_empty() || lines.is_empty() {
        lines.push(remaining.to_string());
    }
    lines
}
