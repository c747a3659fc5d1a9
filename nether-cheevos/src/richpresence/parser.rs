//! Line-oriented rich presence script parser
//!
//! ```text
//! Format:Score
//! FormatType=SCORE
//!
//! Lookup:Stage
//! 0x00=Title Screen
//! 1,3=Odd Stage
//! 4-6=Late Stage
//! *=Somewhere
//!
//! Display:
//! ?0xH0000=0?In the menus
//! @Stage(0xH0001), @Score(0x 0002)
//! ```

use hashbrown::HashMap;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::options::ParseOptions;
use crate::state::Layout;
use crate::trigger::TriggerExpr;

use super::template::{Target, Template};
use super::{DisplayLine, Lookup, LookupEntry};

/// Everything a script declares, with macros already resolved
#[derive(Debug)]
pub(crate) struct Parsed {
    pub lookups: Vec<Lookup>,
    pub formats: HashMap<String, Format>,
    pub display: Vec<DisplayLine>,
}

pub(crate) fn parse(script: &str, layout: &mut Layout, options: &ParseOptions) -> Result<Parsed> {
    let lines: Vec<&str> = script
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut lookups: Vec<Lookup> = Vec::new();
    let mut formats = HashMap::new();
    let mut display = None;

    let mut i = 0;
    while i < lines.len() {
        let line = strip_comment(lines[i]);
        i += 1;

        if let Some(name) = line.strip_prefix("Format:") {
            let format = match lines.get(i).map(|next| strip_comment(next)) {
                Some(next) if next.starts_with("FormatType=") => {
                    i += 1;
                    Format::parse(&next["FormatType=".len()..])
                }
                _ => Format::Value,
            };
            formats.insert(name.trim().to_string(), format);
        } else if let Some(name) = line.strip_prefix("Lookup:") {
            let mut lookup = Lookup::new(name.trim());
            while let Some(entry) = lines.get(i).map(|next| strip_comment(next)) {
                if entry.trim().is_empty() || is_section(entry) {
                    break;
                }
                parse_lookup_entry(entry, &mut lookup)?;
                i += 1;
            }
            lookups.push(lookup);
        } else if line.starts_with("Display:") {
            let (lines_used, parsed) = parse_display(&lines[i..], layout, options)?;
            i += lines_used;
            display = Some(parsed);
        }
    }

    let mut display = display.ok_or(Error::MissingDisplayString)?;
    for line in &mut display {
        line.template.resolve(|name| {
            if let Some(index) = lookups.iter().position(|lookup| lookup.name() == name) {
                Target::Lookup(index)
            } else if let Some(&format) = formats.get(name) {
                Target::Format(format)
            } else {
                Target::Unknown
            }
        });
    }

    Ok(Parsed {
        lookups,
        formats,
        display,
    })
}

fn is_section(line: &str) -> bool {
    ["Format:", "Lookup:", "Display:"]
        .iter()
        .any(|section| line.starts_with(section))
}

/// Drop a trailing `//` comment outside display text
fn strip_comment(line: &str) -> &str {
    line.find("//").map_or(line, |at| &line[..at])
}

/// Conditional lines, then one unconditional line. Returns lines consumed.
fn parse_display(
    lines: &[&str],
    layout: &mut Layout,
    options: &ParseOptions,
) -> Result<(usize, Vec<DisplayLine>)> {
    let mut display = Vec::new();

    for (used, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        let Some(conditional) = line.strip_prefix('?') else {
            display.push(DisplayLine {
                condition: None,
                template: Template::parse(line, layout, options)?,
            });
            return Ok((used + 1, display));
        };

        let mut cur = Cursor::new(conditional);
        let condition = TriggerExpr::parse(&mut cur, layout, options)?;
        if !cur.eat(b'?') {
            return Err(Error::UnexpectedInput(cur.pos() + 1));
        }
        display.push(DisplayLine {
            condition: Some(condition),
            template: Template::parse(&conditional[cur.pos()..], layout, options)?,
        });
    }

    Err(Error::MissingDisplayString)
}

/// `key=text` where key is `*`, a number, a range `a-b` or a comma list
fn parse_lookup_entry(line: &str, lookup: &mut Lookup) -> Result<()> {
    let (keys, text) = line.split_once('=').ok_or(Error::InvalidLookupKey)?;

    for key in keys.split(',') {
        let key = key.trim();
        if key == "*" {
            lookup.set_default(text);
            continue;
        }

        let (first, last) = match key.split_once('-') {
            Some((first, last)) => (parse_key(first)?, parse_key(last)?),
            None => {
                let value = parse_key(key)?;
                (value, value)
            }
        };
        if first > last {
            return Err(Error::InvalidLookupKey);
        }
        lookup.push(LookupEntry {
            first,
            last,
            text: text.to_string(),
        });
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<u32> {
    let key = key.trim();
    let parsed = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => key.parse::<u32>(),
    };
    parsed.map_err(|_| Error::InvalidLookupKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_lookup(lines: &[&str]) -> Result<Lookup> {
        let mut lookup = Lookup::new("Test");
        for line in lines {
            parse_lookup_entry(line, &mut lookup)?;
        }
        Ok(lookup)
    }

    #[test]
    fn test_lookup_keys() {
        let lookup = parse_lookup(&["0=Zero", "0x01=One", "2,3=Few", "10-12=Teens", "*=Many"]).unwrap();
        assert_eq!(lookup.get(0), "Zero");
        assert_eq!(lookup.get(1), "One");
        assert_eq!(lookup.get(3), "Few");
        assert_eq!(lookup.get(11), "Teens");
        assert_eq!(lookup.get(12), "Teens");
        assert_eq!(lookup.get(13), "Many");
    }

    #[test]
    fn test_lookup_without_default_is_empty() {
        let lookup = parse_lookup(&["1=One"]).unwrap();
        assert_eq!(lookup.get(2), "");
    }

    #[test]
    fn test_lookup_text_may_contain_equals() {
        let lookup = parse_lookup(&["1=a=b"]).unwrap();
        assert_eq!(lookup.get(1), "a=b");
    }

    #[test]
    fn test_invalid_lookup_keys() {
        assert_eq!(parse_lookup(&["x=One"]).unwrap_err(), Error::InvalidLookupKey);
        assert_eq!(parse_lookup(&["One"]).unwrap_err(), Error::InvalidLookupKey);
        assert_eq!(parse_lookup(&["5-2=Back"]).unwrap_err(), Error::InvalidLookupKey);
        assert_eq!(parse_lookup(&["0xZZ=Hex"]).unwrap_err(), Error::InvalidLookupKey);
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("Lookup:Name // note"), "Lookup:Name ");
        assert_eq!(strip_comment("Lookup:Name"), "Lookup:Name");
    }

    #[test]
    fn test_display_requires_default_line() {
        let mut layout = Layout::new();
        let options = ParseOptions::default();
        let lines = ["?0xH00=0?Menu", ""];
        assert_eq!(
            parse_display(&lines, &mut layout, &options).unwrap_err(),
            Error::MissingDisplayString
        );
    }

    #[test]
    fn test_display_condition_must_close() {
        let mut layout = Layout::new();
        let options = ParseOptions::default();
        let lines = ["?0xH00=0 Menu", "Default"];
        assert_eq!(
            parse_display(&lines, &mut layout, &options).unwrap_err(),
            Error::UnexpectedInput(8)
        );
    }
}
