//! Triggers: a requirement set plus alternative sets
//!
//! ```text
//! 0xH0001=18(2)_0xH0002=52_R:0xL0004=4     requirement only
//! 0xH0001=16S0xH0002=52S0xL0004=6          requirement AND (alt1 OR alt2)
//! S0xH0002=52S0xL0004=6                    empty requirement
//! ```
//!
//! Every set is evaluated every frame. A ResetIf that holds in any set
//! zeroes the hit counts of the whole trigger and forces the frame false.


use smallvec::SmallVec;

use crate::condition::ConditionFlag;
use crate::condset::{ConditionSet, Frame};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{self, Definition, Flag, Handle, Layout, State, Word};

/// Slots holding the last measured progress
#[derive(Debug, Clone, Copy)]
struct MeasuredSlots {
    current: Word,
    target: Word,
}

/// A parsed trigger, embeddable in leaderboards and rich presence
#[derive(Debug, Clone)]
pub struct TriggerExpr {
    requirement: ConditionSet,
    alternatives: SmallVec<[ConditionSet; 2]>,
    measured: Option<MeasuredSlots>,
    has_trigger_flag: bool,
    primed: Flag,
}

impl TriggerExpr {
    pub(crate) fn parse(
        cur: &mut Cursor<'_>,
        layout: &mut Layout,
        options: &ParseOptions,
    ) -> Result<Self> {
        let requirement = match cur.peek_lower() {
            None => return Err(Error::UnexpectedEnd),
            Some(b's') => ConditionSet::empty(layout),
            Some(_) => ConditionSet::parse(cur, layout, options)?,
        };

        let mut alternatives = SmallVec::new();
        while cur.eat_ignore_case(b's') {
            alternatives.push(ConditionSet::parse(cur, layout, options)?);
        }

        let measured_count = std::iter::once(&requirement)
            .chain(&alternatives)
            .flat_map(|set| set.conditions())
            .filter(|condition| condition.flag == ConditionFlag::Measured)
            .count();
        if measured_count > 1 {
            return Err(Error::MultipleMeasured);
        }

        let measured = (measured_count == 1).then(|| MeasuredSlots {
            current: layout.word(),
            target: layout.word(),
        });
        let has_trigger_flag = std::iter::once(&requirement)
            .chain(&alternatives)
            .any(|set| set.has_flag(ConditionFlag::Trigger));

        Ok(Self {
            requirement,
            alternatives,
            measured,
            has_trigger_flag,
            primed: layout.flag(),
        })
    }

    pub fn requirement(&self) -> &ConditionSet {
        &self.requirement
    }

    pub fn alternatives(&self) -> &[ConditionSet] {
        &self.alternatives
    }

    /// Requirement at index 0, alternatives after it
    pub fn condition_set(&self, index: usize) -> Option<&ConditionSet> {
        match index {
            0 => Some(&self.requirement),
            n => self.alternatives.get(n - 1),
        }
    }

    fn sets(&self) -> impl Iterator<Item = &ConditionSet> {
        std::iter::once(&self.requirement).chain(&self.alternatives)
    }

    pub(crate) fn evaluate<P: Peek + ?Sized>(&self, state: &mut State<'_>, peek: &mut P) -> bool {
        let mut frame = Frame::default();
        let requirement = self.requirement.evaluate(state, peek, &mut frame);

        let mut any_valid = false;
        let mut any_primed = false;
        for alternative in &self.alternatives {
            let outcome = alternative.evaluate(state, peek, &mut frame);
            any_valid |= outcome.valid;
            any_primed |= outcome.primed;
        }

        if let (Some(slots), Some((current, target))) = (self.measured, frame.measured) {
            state.set(slots.current, current);
            state.set(slots.target, target);
        }

        if frame.reset {
            self.reset_hits(state);
            state.set_flag(self.primed, false);
            return false;
        }

        let (valid, primed) = if self.alternatives.is_empty() {
            (requirement.valid, requirement.primed)
        } else {
            (
                requirement.valid && any_valid,
                requirement.primed && any_primed,
            )
        };
        state.set_flag(self.primed, self.has_trigger_flag && primed);
        valid
    }

    /// Zero hit counts only; used by ResetIf
    fn reset_hits(&self, state: &mut State<'_>) {
        for set in self.sets() {
            for condition in set.conditions() {
                state.set(condition.hits, 0);
            }
        }
    }

    /// Zero hits, pause flags, measured progress and the primed flag
    pub(crate) fn reset(&self, state: &mut State<'_>) {
        for set in self.sets() {
            set.reset(state);
        }
        if let Some(slots) = self.measured {
            state.set(slots.current, 0);
            state.set(slots.target, 0);
        }
        state.set_flag(self.primed, false);
    }

    pub(crate) fn reset_condition_set(&self, state: &mut State<'_>, index: usize) -> bool {
        match self.condition_set(index) {
            Some(set) => {
                set.reset(state);
                true
            }
            None => false,
        }
    }

    pub(crate) fn hits(&self, bytes: &[u8], set: usize, condition: usize) -> Option<u32> {
        self.condition_set(set)?.hits(bytes, condition)
    }

    pub(crate) fn is_paused(&self, bytes: &[u8], set: usize) -> bool {
        self.condition_set(set)
            .is_some_and(|set| set.is_paused(bytes))
    }

    pub(crate) fn measured(&self, bytes: &[u8]) -> Option<(u32, u32)> {
        self.measured.map(|slots| {
            (
                state::read_word(bytes, slots.current),
                state::read_word(bytes, slots.target),
            )
        })
    }

    pub(crate) fn is_primed(&self, bytes: &[u8]) -> bool {
        state::read_flag(bytes, self.primed)
    }
}

/// Standalone trigger definition
#[derive(Debug)]
pub struct TriggerDef {
    expr: TriggerExpr,
    len: usize,
}

impl TriggerDef {
    pub fn expr(&self) -> &TriggerExpr {
        &self.expr
    }
}

impl Definition for TriggerDef {
    const MAGIC: [u8; 4] = *b"TRIG";

    fn parse_with(script: &str, options: &ParseOptions) -> Result<Self> {
        let mut layout = Layout::new();
        let mut cur = Cursor::new(script);
        let expr = TriggerExpr::parse(&mut cur, &mut layout, options)?;
        cur.expect_eof()?;
        Ok(Self {
            expr,
            len: layout.len(),
        })
    }

    fn state_len(&self) -> usize {
        self.len
    }
}

/// A trigger bound to its state buffer
pub type Trigger<B = Vec<u8>> = Handle<TriggerDef, B>;

impl<B: AsRef<[u8]> + AsMut<[u8]>> Handle<TriggerDef, B> {
    /// Run one frame; true when the trigger fires
    pub fn evaluate<P: Peek + ?Sized>(&mut self, peek: &mut P) -> bool {
        let (def, mut state) = self.split();
        def.expr.evaluate(&mut state, peek)
    }

    /// Zero every hit count, pause flag and measured value.
    /// Delta and prior caches are kept; use [`Handle::clear`] to drop them.
    pub fn reset(&mut self) {
        let (def, mut state) = self.split();
        def.expr.reset(&mut state);
    }

    /// Reset a single set: 0 is the requirement, alternatives follow.
    /// Returns false when `index` is out of range.
    pub fn reset_condition_set(&mut self, index: usize) -> bool {
        let (def, mut state) = self.split();
        def.expr.reset_condition_set(&mut state, index)
    }

    /// Hit count of `condition` in `set`
    pub fn hits(&self, set: usize, condition: usize) -> Option<u32> {
        self.with_state(|def, bytes| def.expr.hits(bytes, set, condition))
    }

    /// Whether `set` was paused on the last frame
    pub fn is_paused(&self, set: usize) -> bool {
        self.with_state(|def, bytes| def.expr.is_paused(bytes, set))
    }

    /// Last measured `(current, target)`, if the trigger has a Measured condition
    pub fn measured(&self) -> Option<(u32, u32)> {
        self.with_state(|def, bytes| def.expr.measured(bytes))
    }

    /// Every condition except Trigger-flag ones held on the last frame
    pub fn is_primed(&self) -> bool {
        self.with_state(|def, bytes| def.expr.is_primed(bytes))
    }
}

/// Bytes of state needed to run `script`
pub fn size(script: &str) -> Result<usize> {
    size_with(script, &ParseOptions::default())
}

pub fn size_with(script: &str, options: &ParseOptions) -> Result<usize> {
    state::size::<TriggerDef>(script, options)
}

/// Parse `script` into `buffer`
pub fn parse<B: AsRef<[u8]> + AsMut<[u8]>>(buffer: B, script: &str) -> Result<Trigger<B>> {
    parse_with(buffer, script, &ParseOptions::default())
}

pub fn parse_with<B: AsRef<[u8]> + AsMut<[u8]>>(
    buffer: B,
    script: &str,
    options: &ParseOptions,
) -> Result<Trigger<B>> {
    state::parse::<TriggerDef, B>(buffer, script, options)
}
