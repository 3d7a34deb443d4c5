use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

pub fn format_gib(gib: f32) -> String {
    format!("{gib:.2} GB")
}

/// Uptime split into days, hours, minutes and seconds, plus total hours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub total_hours: u64,
}

impl Uptime {
    pub fn from_secs(secs: u64) -> Self {
        Uptime {
            days: secs / 86_400,
            hours: secs % 86_400 / 3_600,
            minutes: secs % 3_600 / 60,
            seconds: secs % 60,
            total_hours: secs / 3_600,
        }
    }
}

impl std::fmt::Display for Uptime {
    /// `D days HH:MM:SS (TH:MM:SS)`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} days {:02}:{:02}:{:02} ({:02}:{:02}:{:02})",
            self.days, self.hours, self.minutes, self.seconds, self.total_hours, self.minutes, self.seconds
        )
    }
}
