//! Number formats shared by leaderboards and rich presence

use std::fmt;

/// Frame rate assumed by [`Format::Frames`] unless configured
pub const DEFAULT_FPS: u32 = 60;

/// How a leaderboard or macro value is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Elapsed frames, shown as `mm:ss.cc`
    Frames,
    /// Elapsed seconds, shown as `mm:ss`
    Seconds,
    /// Elapsed centiseconds, shown as `mm:ss.cc`
    Centisecs,
    /// Zero-padded points
    Score,
    /// Plain signed number
    #[default]
    Value,
    /// Zero-padded number
    Other,
}

impl Format {
    /// Parse a format name; unknown names fall back to [`Format::Value`]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "TIME" | "FRAMES" => Self::Frames,
            "SECS" | "TIMESECS" => Self::Seconds,
            "MILLISECS" => Self::Centisecs,
            "SCORE" | "POINTS" => Self::Score,
            "OTHER" => Self::Other,
            _ => Self::Value,
        }
    }

    /// Display adapter for `value`
    pub fn display(self, value: u32, fps: u32) -> Formatted {
        Formatted {
            format: self,
            value,
            fps: fps.max(1),
        }
    }

    /// Render `value` to a new string
    pub fn format(self, value: u32, fps: u32) -> String {
        self.display(value, fps).to_string()
    }
}

/// A value paired with its format; writes without allocating
#[derive(Debug, Clone, Copy)]
pub struct Formatted {
    format: Format,
    value: u32,
    fps: u32,
}

impl fmt::Display for Formatted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.value;
        match self.format {
            Format::Frames => {
                let (v, fps) = (v as u64, self.fps as u64);
                let minutes = v / (fps * 60);
                let seconds = (v / fps) % 60;
                let hundredths = (v % fps) * 100 / fps;
                write!(f, "{minutes:02}:{seconds:02}.{hundredths:02}")
            }
            Format::Seconds => write!(f, "{:02}:{:02}", v / 60, v % 60),
            Format::Centisecs => {
                write!(f, "{:02}:{:02}.{:02}", v / 6000, (v / 100) % 60, v % 100)
            }
            Format::Score => write!(f, "{:06} Points", v as i32),
            Format::Value => write!(f, "{}", v as i32),
            Format::Other => write!(f, "{:06}", v as i32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(Format::parse("VALUE"), Format::Value);
        assert_eq!(Format::parse("secs"), Format::Seconds);
        assert_eq!(Format::parse("TIMESECS"), Format::Seconds);
        assert_eq!(Format::parse("TIME"), Format::Frames);
        assert_eq!(Format::parse("FRAMES"), Format::Frames);
        assert_eq!(Format::parse("SCORE"), Format::Score);
        assert_eq!(Format::parse("POINTS"), Format::Score);
        assert_eq!(Format::parse("MILLISECS"), Format::Centisecs);
        assert_eq!(Format::parse("OTHER"), Format::Other);
        assert_eq!(Format::parse("UNKNOWN"), Format::Value);
    }

    #[test]
    fn test_render() {
        let fps = DEFAULT_FPS;
        assert_eq!(Format::Value.format(12345, fps), "12345");
        assert_eq!(Format::Value.format(u32::MAX, fps), "-1");
        assert_eq!(Format::Other.format(345, fps), "000345");
        assert_eq!(Format::Score.format(12345, fps), "012345 Points");
        assert_eq!(Format::Seconds.format(345, fps), "05:45");
        assert_eq!(Format::Centisecs.format(12345, fps), "02:03.45");
        assert_eq!(Format::Frames.format(12345, fps), "03:25.75");
    }

    #[test]
    fn test_frames_at_other_rates() {
        assert_eq!(Format::Frames.format(150, 50), "00:03.00");
        assert_eq!(Format::Frames.format(75, 50), "00:01.50");
        assert_eq!(Format::Frames.format(10, 0), "00:10.00");
    }
}
