//! Condition status colors, shared by tables and describe output

use comfy_table::Color as TableColor;

/// Colors keyed by condition status. Tables take the comfy-table color,
/// describe output the `colored` one.
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub ready: TableColor,
    pub failed: TableColor,
    pub pending: TableColor,
    pub other: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            ready: TableColor::Green,
            failed: TableColor::Red,
            pending: TableColor::Yellow,
            other: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    pub fn status_color(&self, status: &str) -> TableColor {
        match status {
            "True" => self.ready,
            "False" => self.failed,
            "Unknown" => self.pending,
            _ => self.other,
        }
    }

    pub fn status_text_color(&self, status: &str) -> colored::Color {
        match self.status_color(status) {
            TableColor::Green => colored::Color::Green,
            TableColor::Red => colored::Color::Red,
            TableColor::Yellow => colored::Color::Yellow,
            TableColor::DarkGrey => colored::Color::BrightBlack,
            _ => colored::Color::White,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.status_color("True"), TableColor::Green);
        assert_eq!(theme.status_color("False"), TableColor::Red);
        assert_eq!(theme.status_color("Unknown"), TableColor::Yellow);
        assert_eq!(theme.status_color("<unknown>"), TableColor::DarkGrey);
    }

    #[test]
    fn test_text_color_follows_table_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.status_text_color("True"), colored::Color::Green);
        assert_eq!(theme.status_text_color(""), colored::Color::BrightBlack);
    }
}
