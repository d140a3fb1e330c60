//! Vertical viewport over the document.

/// Where to place the cursor row when aligning the view (`z` menu).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct View {
    /// First visible document row.
    pub first_line: usize,
    /// Text rows available (excludes status and prompt rows).
    pub height: usize,
    /// Text columns available (excludes the gutter).
    pub width: usize,
    /// Rows kept between the cursor and the top/bottom edge.
    pub margin: usize,
}

impl View {
    pub fn new(height: usize, width: usize, margin: usize) -> Self {
        Self {
            first_line: 0,
            height,
            width,
            margin,
        }
    }

    /// Half-open `[start, end)` row range currently visible.
    pub fn visible_range(&self, line_count: usize) -> (usize, usize) {
        let start = self.first_line.min(line_count.saturating_sub(1));
        (start, (start + self.height).min(line_count))
    }

    /// Scroll so `cursor_row` sits inside the margin band. Returns true when
    /// `first_line` changed.
    pub fn auto_scroll(&mut self, cursor_row: usize) -> bool {
        match compute_scroll_intent(self.first_line, cursor_row, self.height, self.margin) {
            Some(first) => {
                self.first_line = first;
                true
            }
            None => false,
        }
    }

    /// Scroll by `delta` rows without moving the cursor; clamped to the document.
    pub fn scroll_by(&mut self, delta: isize, line_count: usize) {
        let max_first = line_count.saturating_sub(1);
        self.first_line = self
            .first_line
            .saturating_add_signed(delta)
            .min(max_first);
    }

    pub fn align(&mut self, cursor_row: usize, align: Align) {
        self.first_line = match align {
            Align::Top => cursor_row,
            Align::Center => cursor_row.saturating_sub(self.height / 2),
            Align::Bottom => (cursor_row + 1).saturating_sub(self.height),
        };
    }

    /// Document row shown at the given alignment of the window.
    pub fn window_row(&self, align: Align, line_count: usize) -> usize {
        let (start, end) = self.visible_range(line_count);
        let last = end.saturating_sub(1).max(start);
        match align {
            Align::Top => start,
            Align::Center => start + (last - start) / 2,
            Align::Bottom => last,
        }
    }
}

/// New first line keeping `cursor_line` within `[first + m, first + h - m)`,
/// where the margin `m` is clamped to half the height. `None` when no scroll
/// is needed.
pub fn compute_scroll_intent(
    first: usize,
    cursor_line: usize,
    text_height: usize,
    margin: usize,
) -> Option<usize> {
    if text_height == 0 {
        return None;
    }
    let m = margin.min(text_height / 2);
    let new_first = if cursor_line < first + m {
        cursor_line.saturating_sub(m)
    } else if cursor_line + m >= first + text_height {
        cursor_line + m + 1 - text_height
    } else {
        return None;
    };
    (new_first != first).then_some(new_first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolls_down_and_up() {
        let mut v = View::new(5, 80, 0);
        assert!(!v.auto_scroll(4));
        assert!(v.auto_scroll(5));
        assert_eq!(v.first_line, 1);
        assert!(v.auto_scroll(9));
        assert_eq!(v.first_line, 5);
        assert!(v.auto_scroll(3));
        assert_eq!(v.first_line, 3);
    }

    #[test]
    fn margin_scrolls_earlier_and_clamps() {
        let mut v = View::new(6, 80, 2);
        v.auto_scroll(4);
        assert_eq!(v.first_line, 1);
        let mut small = View::new(3, 80, 10);
        small.auto_scroll(2);
        assert_eq!(small.first_line, 1);
    }

    #[test]
    fn visible_range_is_clamped() {
        let v = View::new(10, 80, 0);
        assert_eq!(v.visible_range(4), (0, 4));
        let mut v = View::new(3, 80, 0);
        v.first_line = 2;
        assert_eq!(v.visible_range(10), (2, 5));
    }

    #[test]
    fn align_and_window_rows() {
        let mut v = View::new(10, 80, 0);
        v.align(50, Align::Center);
        assert_eq!(v.first_line, 45);
        assert_eq!(v.window_row(Align::Bottom, 100), 54);
        v.align(50, Align::Bottom);
        assert_eq!(v.first_line, 41);
        v.scroll_by(-100, 100);
        assert_eq!(v.first_line, 0);
    }
}
