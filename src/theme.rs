use serde::{Deserialize, Serialize};

const CLASSIC_PALETTE: [&str; 10] = [
    "#E4572E", "#17BEBB", "#FFC914", "#2E282A", "#76B041", "#5B5F97", "#F28F3B", "#C8553D",
    "#4F6D7A", "#A23B72",
];

const MODERN_PALETTE: [&str; 8] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#64748B",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    /// Colors indexed by group rank in the categorical strategy.
    pub palette: Vec<String>,
    /// Lowest hex digit used when drawing random word colors; keeps words
    /// readable on a light background.
    pub random_color_min_digit: u8,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Montserrat, sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
            palette: CLASSIC_PALETTE.iter().map(|c| c.to_string()).collect(),
            random_color_min_digit: 5,
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#F8FAFF".to_string(),
            palette: MODERN_PALETTE.iter().map(|c| c.to_string()).collect(),
            random_color_min_digit: 3,
        }
    }

    /// Palette entry for a group rank, wrapping around the palette.
    pub fn group_color(&self, group_rank: u32) -> &str {
        if self.palette.is_empty() {
            return "#333333";
        }
        let idx = group_rank as usize % self.palette.len();
        &self.palette[idx]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_color_wraps_around_palette() {
        let theme = Theme::classic();
        let len = theme.palette.len() as u32;
        assert_eq!(theme.group_color(1), theme.group_color(1 + len));
        assert_ne!(theme.group_color(1), theme.group_color(2));
    }

    #[test]
    fn empty_palette_falls_back() {
        let mut theme = Theme::modern();
        theme.palette.clear();
        assert_eq!(theme.group_color(4), "#333333");
    }
}
