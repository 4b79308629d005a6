/// 16 basic colors - the commonly supported format in terminals.
///
/// Used as a fallback when the terminal supports neither 256 colors nor true color.
pub enum BasicColor {
    DarkYellow,
    Blue,
}

impl BasicColor {
    /// Create inquire compatible types
    ///
    /// "light" colors are prefixed
    pub fn to_inquire(&self) -> inquire::ui::Color {
        match self {
            BasicColor::DarkYellow => inquire::ui::Color::DarkYellow,
            BasicColor::Blue => inquire::ui::Color::LightBlue,
        }
    }
}

pub struct ShelfColor {
    ansi256: u8,
    rgb: (u8, u8, u8),
    basic: BasicColor,
}

impl ShelfColor {
    pub fn to_inquire(&self) -> Option<inquire::ui::Color> {
        match supports_color::on(supports_color::Stream::Stderr) {
            Some(supports_color::ColorLevel { has_16m: true, .. }) => {
                Some(inquire::ui::Color::Rgb {
                    r: self.rgb.0,
                    g: self.rgb.1,
                    b: self.rgb.2,
                })
            },
            Some(supports_color::ColorLevel { has_256: true, .. }) => {
                Some(inquire::ui::Color::AnsiValue(self.ansi256))
            },
            Some(supports_color::ColorLevel {
                has_basic: true, ..
            }) => Some(self.basic.to_inquire()),
            _ => None,
        }
    }
}

pub const AMBER_300: ShelfColor = ShelfColor {
    ansi256: 221,
    rgb: (255, 215, 95),
    basic: BasicColor::DarkYellow,
};

pub const SLATE_400: ShelfColor = ShelfColor {
    ansi256: 110,
    rgb: (135, 175, 215),
    basic: BasicColor::Blue,
};
