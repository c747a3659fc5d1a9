//! Parse-time options

use std::fmt;
use std::sync::Arc;

use crate::custom::CustomOperandEvaluator;
use crate::format::DEFAULT_FPS;

/// Options applied while parsing a script.
///
/// Both the size pass and the parse pass must see the same options: a
/// script with `@name` operands only sizes successfully when the evaluator
/// that knows `name` is present.
#[derive(Clone)]
pub struct ParseOptions {
    /// Evaluator for `@name` operands
    pub custom: Option<Arc<dyn CustomOperandEvaluator>>,
    /// Frame rate used by the `FRAMES` format in rich presence
    pub fps: u32,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_evaluator(mut self, evaluator: Arc<dyn CustomOperandEvaluator>) -> Self {
        self.custom = Some(evaluator);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            custom: None,
            fps: DEFAULT_FPS,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("custom", &self.custom.is_some())
            .field("fps", &self.fps)
            .finish()
    }
}
