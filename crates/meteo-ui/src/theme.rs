//! Light/dark theme classes and the root they are applied to.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeClass {
    #[default]
    Light,
    Dark,
}

impl ThemeClass {
    pub fn from_flag(dark_mode: bool) -> Self {
        if dark_mode {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                background: Color::Rgb(186, 230, 253),
                surface: Color::Rgb(240, 249, 255),
                text: Color::Rgb(31, 41, 55),
                muted: Color::Rgb(75, 85, 99),
                accent: Color::Rgb(2, 132, 199),
                error: Color::Rgb(220, 38, 38),
                footer_bg: Color::Rgb(31, 41, 55),
                footer_text: Color::White,
            },
            Self::Dark => Palette {
                background: Color::Rgb(17, 24, 39),
                surface: Color::Rgb(31, 41, 55),
                text: Color::White,
                muted: Color::Rgb(209, 213, 219),
                accent: Color::Rgb(56, 189, 248),
                error: Color::Rgb(248, 113, 113),
                footer_bg: Color::Rgb(3, 7, 18),
                footer_text: Color::White,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub error: Color,
    pub footer_bg: Color,
    pub footer_text: Color,
}

/// The root every frame is drawn under; holds the applied theme class.
#[derive(Debug, Clone, Default)]
pub struct ThemeRoot {
    class: ThemeClass,
}

impl ThemeRoot {
    pub fn apply(&mut self, class: ThemeClass) {
        if self.class != class {
            tracing::debug!(from = self.class.as_str(), to = class.as_str(), "Applying theme");
        }
        self.class = class;
    }

    pub fn class(&self) -> ThemeClass {
        self.class
    }

    pub fn palette(&self) -> Palette {
        self.class.palette()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flag() {
        assert_eq!(ThemeClass::from_flag(true), ThemeClass::Dark);
        assert_eq!(ThemeClass::from_flag(false), ThemeClass::Light);
    }

    #[test]
    fn test_root_tracks_applied_class() {
        let mut root = ThemeRoot::default();
        assert_eq!(root.class(), ThemeClass::Light);

        root.apply(ThemeClass::Dark);
        assert_eq!(root.class(), ThemeClass::Dark);
        assert_eq!(root.palette(), ThemeClass::Dark.palette());
    }

    #[test]
    fn test_palettes_differ() {
        assert_ne!(
            ThemeClass::Light.palette().background,
            ThemeClass::Dark.palette().background
        );
    }
}
