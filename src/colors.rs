//! mIRC color codes.
//!
//! A color sequence is the control byte 0x03 followed by a two digit code.
//! Line wrapping uses this table to carry a leading color across wrapped
//! lines.

/// The mIRC color control character (^C).
pub const COLOR_TAG: char = '\x03';

/// mIRC palette entries addressable by a two digit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IrcColor {
    White,
    Black,
    Blue,
    Green,
    Red,
    Brown,
    Magenta,
    Orange,
    Yellow,
    LightGreen,
    Cyan,
    LightCyan,
    LightBlue,
    Pink,
    Grey,
    LightGrey,
    Default,
}

impl IrcColor {
    /// Two digit wire code.
    pub fn code(&self) -> &'static str {
        match self {
            IrcColor::White => "00",
            IrcColor::Black => "01",
            IrcColor::Blue => "02",
            IrcColor::Green => "03",
            IrcColor::Red => "04",
            IrcColor::Brown => "05",
            IrcColor::Magenta => "06",
            IrcColor::Orange => "07",
            IrcColor::Yellow => "08",
            IrcColor::LightGreen => "09",
            IrcColor::Cyan => "10",
            IrcColor::LightCyan => "11",
            IrcColor::LightBlue => "12",
            IrcColor::Pink => "13",
            IrcColor::Grey => "14",
            IrcColor::LightGrey => "15",
            IrcColor::Default => "99",
        }
    }

    /// Look up a two digit code.
    pub fn from_code(code: &str) -> Option<Self> {
        let color = match code {
            "00" => IrcColor::White,
            "01" => IrcColor::Black,
            "02" => IrcColor::Blue,
            "03" => IrcColor::Green,
            "04" => IrcColor::Red,
            "05" => IrcColor::Brown,
            "06" => IrcColor::Magenta,
            "07" => IrcColor::Orange,
            "08" => IrcColor::Yellow,
            "09" => IrcColor::LightGreen,
            "10" => IrcColor::Cyan,
            "11" => IrcColor::LightCyan,
            "12" => IrcColor::LightBlue,
            "13" => IrcColor::Pink,
            "14" => IrcColor::Grey,
            "15" => IrcColor::LightGrey,
            "99" => IrcColor::Default,
            _ => return None,
        };
        Some(color)
    }

    /// The full control sequence, e.g. `"\x0304"` for red.
    pub fn sequence(&self) -> String {
        let mut s = String::with_capacity(3);
        s.push(COLOR_TAG);
        s.push_str(self.code());
        s
    }
}

/// Color a line starts with, if it begins with ^C and a known two digit code.
pub fn leading_color(line: &str) -> Option<IrcColor> {
    let rest = line.strip_prefix(COLOR_TAG)?;
    IrcColor::from_code(rest.get(..2)?)
}
