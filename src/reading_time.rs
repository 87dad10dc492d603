//! Estimates how long a body of text takes to read.

use serde::Serialize;

/// The reading speed used when none is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// The result of [`estimate`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReadingTime {
    /// The fractional number of minutes needed to read the text.
    pub minutes: f64,

    /// The number of whitespace-separated words in the text.
    pub words: usize,
}

impl ReadingTime {
    /// Rounds [`ReadingTime::minutes`] up to whole minutes. This is the value
    /// exposed on content records.
    pub fn whole_minutes(&self) -> u32 {
        self.minutes.ceil() as u32
    }
}

/// Counts the words in `text` and converts them into minutes at
/// `words_per_minute`. A zero speed is treated as the default rather than
/// dividing by zero.
pub fn estimate(text: &str, words_per_minute: u32) -> ReadingTime {
    let wpm = match words_per_minute {
        0 => DEFAULT_WORDS_PER_MINUTE,
        n => n,
    };
    let words = text.split_whitespace().count();
    ReadingTime {
        minutes: words as f64 / wpm as f64,
        words,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_estimate_empty() {
        let time = estimate("", DEFAULT_WORDS_PER_MINUTE);
        assert_eq!(0, time.words);
        assert_eq!(0, time.whole_minutes());
    }

    #[test]
    fn test_estimate_rounds_up() {
        let text = "word ".repeat(201);
        let time = estimate(&text, DEFAULT_WORDS_PER_MINUTE);
        assert_eq!(201, time.words);
        assert_eq!(2, time.whole_minutes());
    }

    #[test]
    fn test_estimate_exact_minute() {
        let text = "word\n".repeat(400);
        assert_eq!(2, estimate(&text, DEFAULT_WORDS_PER_MINUTE).whole_minutes());
    }

    #[test]
    fn test_estimate_zero_speed_uses_default() {
        let text = "word ".repeat(100);
        assert_eq!(0.5, estimate(&text, 0).minutes);
    }
}
