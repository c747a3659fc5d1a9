//! Rich presence: a status line built from game memory
//!
//! A script declares lookups (value to text tables), formats (value to
//! number rendering) and a display section. Each frame the first display
//! line whose condition holds is rendered, expanding `@Name(value)` macros.
//! Macro names are resolved once the whole script is read, so sections may
//! appear in any order.

mod parser;
mod template;


pub use template::Template;

use hashbrown::HashMap;

use crate::error::Result;
use crate::format::Format;
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{self, Definition, Handle, Layout, State};
use crate::trigger::TriggerExpr;

use template::TruncatingWriter;

/// Inclusive key range mapped to a text
#[derive(Debug, Clone)]
pub(crate) struct LookupEntry {
    pub first: u32,
    pub last: u32,
    pub text: String,
}

/// A named table from values to text
#[derive(Debug, Clone)]
pub struct Lookup {
    name: String,
    entries: Vec<LookupEntry>,
    default: Option<String>,
}

impl Lookup {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
            default: None,
        }
    }

    pub(crate) fn push(&mut self, entry: LookupEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn set_default(&mut self, text: &str) {
        self.default = Some(text.to_string());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text for `value`: a matching key, else the `*` entry, else empty
    pub fn get(&self, value: u32) -> &str {
        self.entries
            .iter()
            .find(|entry| (entry.first..=entry.last).contains(&value))
            .map(|entry| entry.text.as_str())
            .or(self.default.as_deref())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One line of the display section
#[derive(Debug, Clone)]
pub(crate) struct DisplayLine {
    pub condition: Option<TriggerExpr>,
    pub template: Template,
}

/// Parsed rich presence script
#[derive(Debug)]
pub struct RichPresenceDef {
    lookups: Vec<Lookup>,
    formats: HashMap<String, Format>,
    display: Vec<DisplayLine>,
    fps: u32,
    len: usize,
}

impl RichPresenceDef {
    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    pub fn lookup(&self, name: &str) -> Option<&Lookup> {
        self.lookups.iter().find(|lookup| lookup.name() == name)
    }

    pub fn format(&self, name: &str) -> Option<Format> {
        self.formats.get(name).copied()
    }

    /// Number of display lines, the unconditional one included
    pub fn display_len(&self) -> usize {
        self.display.len()
    }

    fn render<P: Peek + ?Sized, W: std::fmt::Write>(
        &self,
        state: &mut State<'_>,
        peek: &mut P,
        out: &mut W,
    ) -> std::fmt::Result {
        for line in &self.display {
            let selected = match &line.condition {
                Some(condition) => condition.evaluate(state, peek),
                None => true,
            };
            if selected {
                return line
                    .template
                    .render(state, peek, &self.lookups, self.fps, out);
            }
        }
        Ok(())
    }
}

impl Definition for RichPresenceDef {
    const MAGIC: [u8; 4] = *b"RPRS";

    fn parse_with(script: &str, options: &ParseOptions) -> Result<Self> {
        let mut layout = Layout::new();
        let parsed = parser::parse(script, &mut layout, options)?;

        for line in &parsed.display {
            for name in line.template.unknown_macros() {
                tracing::debug!(name, "unknown rich presence macro");
            }
        }

        Ok(Self {
            lookups: parsed.lookups,
            formats: parsed.formats,
            display: parsed.display,
            fps: options.fps.max(1),
            len: layout.len(),
        })
    }

    fn state_len(&self) -> usize {
        self.len
    }
}

/// A rich presence script bound to its state buffer
pub type RichPresence<B = Vec<u8>> = Handle<RichPresenceDef, B>;

impl<B: AsRef<[u8]> + AsMut<[u8]>> Handle<RichPresenceDef, B> {
    /// Evaluate one frame and render the selected display line
    pub fn render<P: Peek + ?Sized>(&mut self, peek: &mut P) -> String {
        let mut out = String::new();
        let (def, mut state) = self.split();
        // writing to a String cannot fail
        let _ = def.render(&mut state, peek, &mut out);
        out
    }

    /// Evaluate one frame and render into `out`, truncating at a character
    /// boundary. Returns the number of bytes written.
    pub fn render_into<P: Peek + ?Sized>(&mut self, out: &mut [u8], peek: &mut P) -> usize {
        let mut writer = TruncatingWriter::new(out);
        let (def, mut state) = self.split();
        let _ = def.render(&mut state, peek, &mut writer);
        writer.len()
    }

    /// Zero the hit counts of every display condition
    pub fn reset(&mut self) {
        let (def, mut state) = self.split();
        for condition in def.display.iter().filter_map(|line| line.condition.as_ref()) {
            condition.reset(&mut state);
        }
    }
}

/// Bytes of state needed to run `script`
pub fn size(script: &str) -> Result<usize> {
    size_with(script, &ParseOptions::default())
}

pub fn size_with(script: &str, options: &ParseOptions) -> Result<usize> {
    state::size::<RichPresenceDef>(script, options)
}

/// Parse `script` into `buffer`
pub fn parse<B: AsRef<[u8]> + AsMut<[u8]>>(buffer: B, script: &str) -> Result<RichPresence<B>> {
    parse_with(buffer, script, &ParseOptions::default())
}

pub fn parse_with<B: AsRef<[u8]> + AsMut<[u8]>>(
    buffer: B,
    script: &str,
    options: &ParseOptions,
) -> Result<RichPresence<B>> {
    state::parse::<RichPresenceDef, B>(buffer, script, options)
}
