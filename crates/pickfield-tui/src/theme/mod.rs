use ratatui::style::Color;

pub struct NordTheme {
    // Polar Night
    pub nord0: Color, // #2E3440 - darkest background, status bar
    pub nord1: Color, // #3B4252 - highlighted result row
    pub nord2: Color, // #4C566A - borders
    pub nord3: Color, // #616E88 - muted text, placeholders

    // Snow Storm
    pub nord4: Color, // #D8DEE9 - body text
    pub nord5: Color, // #E5E9F0 - titles
    pub nord6: Color, // #ECEFF4

    // Frost
    pub nord7: Color,  // #8FBCBB - secondary labels
    pub nord8: Color,  // #88C0D0 - focused field
    pub nord9: Color,  // #81A1C1 - chips
    pub nord10: Color, // #5E81AC

    // Aurora
    pub nord11: Color, // #BF616A - remove, errors
    pub nord12: Color, // #D08770 - pending search
    pub nord13: Color, // #EBCB8B - key hints
    pub nord14: Color, // #A3BE8C - committed value
    pub nord15: Color, // #B48EAD - event log
}

impl Default for NordTheme {
    fn default() -> Self {
        Self {
            nord0: Color::Rgb(46, 52, 64),
            nord1: Color::Rgb(59, 66, 82),
            nord2: Color::Rgb(76, 86, 106),
            nord3: Color::Rgb(97, 110, 136),
            nord4: Color::Rgb(216, 222, 233),
            nord5: Color::Rgb(229, 233, 240),
            nord6: Color::Rgb(236, 239, 244),
            nord7: Color::Rgb(143, 188, 187),
            nord8: Color::Rgb(136, 192, 208),
            nord9: Color::Rgb(129, 161, 193),
            nord10: Color::Rgb(94, 129, 172),
            nord11: Color::Rgb(191, 97, 106),
            nord12: Color::Rgb(208, 135, 112),
            nord13: Color::Rgb(235, 203, 139),
            nord14: Color::Rgb(163, 190, 140),
            nord15: Color::Rgb(180, 142, 173),
        }
    }
}

impl NordTheme {
    // Semantic aliases
    pub fn bg(&self) -> Color {
        self.nord0
    }
    pub fn bg_secondary(&self) -> Color {
        self.nord1
    }
    pub fn border(&self) -> Color {
        self.nord2
    }
    pub fn muted(&self) -> Color {
        self.nord3
    }

    pub fn fg(&self) -> Color {
        self.nord4
    }
    pub fn fg_bright(&self) -> Color {
        self.nord5
    }

    pub fn frost_mint(&self) -> Color {
        self.nord7
    }
    pub fn frost_ice(&self) -> Color {
        self.nord8
    }
    pub fn frost_blue(&self) -> Color {
        self.nord9
    }

    pub fn red(&self) -> Color {
        self.nord11
    }
    pub fn orange(&self) -> Color {
        self.nord12
    }
    pub fn yellow(&self) -> Color {
        self.nord13
    }
    pub fn green(&self) -> Color {
        self.nord14
    }
    pub fn purple(&self) -> Color {
        self.nord15
    }

    // Logic aliases
    pub fn focused_field(&self) -> Color {
        self.frost_ice()
    }
    pub fn highlight_bg(&self) -> Color {
        self.bg_secondary()
    }
    pub fn chip_color(&self) -> Color {
        self.frost_blue()
    }
    pub fn secondary_label(&self) -> Color {
        self.frost_mint()
    }
    pub fn committed(&self) -> Color {
        self.green()
    }
    pub fn danger(&self) -> Color {
        self.red()
    }
    pub fn pending(&self) -> Color {
        self.orange()
    }
    pub fn hint(&self) -> Color {
        self.yellow()
    }
    pub fn event_color(&self) -> Color {
        self.purple()
    }
}
