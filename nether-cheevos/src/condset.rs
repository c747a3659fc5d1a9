//! Condition sets and per-frame evaluation
//!
//! A set is evaluated in two passes. The pause pass runs only the PauseIf
//! conditions and the chaining conditions feeding them, and stops at the
//! first PauseIf that holds. A paused set evaluates nothing else this frame.
//! The main pass then runs every remaining condition in source order.
//!
//! Within a pass, conditions fold left to right over a small accumulator:
//!
//! ```text
//! A:/B:   add/subtract operand1 into `source`, consumed by the next comparison
//! C:      add this condition's hits into `hits`, consumed by the next target
//! N:/O:   AND/OR this comparison into the next one
//! ```

use smallvec::SmallVec;

use crate::condition::{Condition, ConditionFlag};
use crate::cursor::Cursor;
use crate::error::Result;
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{self, Flag, Layout, State};

/// Side effects of one frame that escape a single set
#[derive(Debug, Default)]
pub(crate) struct Frame {
    /// A ResetIf held somewhere in the trigger
    pub reset: bool,
    /// Progress reported by the Measured condition
    pub measured: Option<(u32, u32)>,
}

/// Result of evaluating a set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub valid: bool,
    /// Valid when Trigger-flag conditions are ignored
    pub primed: bool,
}

impl Outcome {
    const FALSE: Self = Self {
        valid: false,
        primed: false,
    };
}

#[derive(Debug, Clone, Copy)]
enum Logic {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Pause,
    Main,
}

/// Accumulators carried from one condition to the next
#[derive(Debug, Default)]
struct Chain {
    source: u32,
    hits: u32,
    pending: Option<(bool, Logic)>,
}

/// An ordered list of conditions that are true together
#[derive(Debug, Clone)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
    /// Per condition: part of a PauseIf chain
    pause_chain: SmallVec<[bool; 16]>,
    has_pause: bool,
    paused: Flag,
}

impl ConditionSet {
    pub(crate) fn parse(
        cur: &mut Cursor<'_>,
        layout: &mut Layout,
        options: &ParseOptions,
    ) -> Result<Self> {
        let mut conditions = vec![Condition::parse(cur, layout, options)?];
        while cur.eat(b'_') {
            conditions.push(Condition::parse(cur, layout, options)?);
        }
        Ok(Self::from_conditions(conditions, layout))
    }

    /// A set with no conditions; always true
    pub(crate) fn empty(layout: &mut Layout) -> Self {
        Self::from_conditions(Vec::new(), layout)
    }

    fn from_conditions(conditions: Vec<Condition>, layout: &mut Layout) -> Self {
        let mut pause_chain: SmallVec<[bool; 16]> = SmallVec::from_elem(false, conditions.len());
        let mut in_chain = false;
        for (index, condition) in conditions.iter().enumerate().rev() {
            in_chain = match condition.flag {
                ConditionFlag::PauseIf => true,
                flag if flag.is_chaining() => in_chain,
                _ => false,
            };
            pause_chain[index] = in_chain;
        }

        Self {
            has_pause: conditions
                .iter()
                .any(|condition| condition.flag == ConditionFlag::PauseIf),
            conditions,
            pause_chain,
            paused: layout.flag(),
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub(crate) fn evaluate<P: Peek + ?Sized>(
        &self,
        state: &mut State<'_>,
        peek: &mut P,
        frame: &mut Frame,
    ) -> Outcome {
        if self.has_pause {
            let paused = !self.run(Pass::Pause, state, peek, frame).valid;
            state.set_flag(self.paused, paused);
            if paused {
                return Outcome::FALSE;
            }
        }
        self.run(Pass::Main, state, peek, frame)
    }

    /// Run one pass. In the pause pass `valid == false` means paused.
    fn run<P: Peek + ?Sized>(
        &self,
        pass: Pass,
        state: &mut State<'_>,
        peek: &mut P,
        frame: &mut Frame,
    ) -> Outcome {
        let mut chain = Chain::default();
        let mut outcome = Outcome {
            valid: true,
            primed: true,
        };

        for (condition, &in_pause_chain) in self.conditions.iter().zip(&self.pause_chain) {
            if in_pause_chain != (pass == Pass::Pause) {
                continue;
            }

            let left = condition.operand1.evaluate(state, peek);
            match condition.flag {
                ConditionFlag::AddSource => {
                    chain.source = chain.source.wrapping_add(left);
                    continue;
                }
                ConditionFlag::SubSource => {
                    chain.source = chain.source.wrapping_sub(left);
                    continue;
                }
                _ => {}
            }

            let left = left.wrapping_add(std::mem::take(&mut chain.source));
            let right = condition.operand2.evaluate(state, peek);
            let mut raw = condition.comparator.compare(left, right);
            if let Some((previous, logic)) = chain.pending.take() {
                raw = match logic {
                    Logic::And => previous && raw,
                    Logic::Or => previous || raw,
                };
            }

            let required = condition.required_hits;
            match condition.flag {
                ConditionFlag::AndNext => {
                    chain.pending = Some((raw, Logic::And));
                    continue;
                }
                ConditionFlag::OrNext => {
                    chain.pending = Some((raw, Logic::Or));
                    continue;
                }
                ConditionFlag::AddHits => {
                    let mut hits = state.get(condition.hits);
                    if raw && (required == 0 || hits < required) {
                        hits = hits.saturating_add(1);
                        state.set(condition.hits, hits);
                    }
                    chain.hits = chain.hits.saturating_add(hits);
                    continue;
                }
                _ => {}
            }

            let add_hits = std::mem::take(&mut chain.hits);
            let hits = state.get(condition.hits);
            let (valid, hits) = if required != 0 && hits.saturating_add(add_hits) >= required {
                (true, hits)
            } else if raw {
                let hits = hits.saturating_add(1);
                state.set(condition.hits, hits);
                (required == 0 || hits.saturating_add(add_hits) >= required, hits)
            } else {
                (false, hits)
            };

            match condition.flag {
                ConditionFlag::PauseIf => {
                    if valid {
                        return Outcome::FALSE;
                    }
                    if required == 0 {
                        state.set(condition.hits, 0);
                    }
                }
                ConditionFlag::ResetIf => {
                    if valid {
                        frame.reset = true;
                        return Outcome::FALSE;
                    }
                }
                flag if flag.is_required() => {
                    if flag == ConditionFlag::Measured {
                        frame.measured = Some(if required > 0 {
                            (hits.saturating_add(add_hits).min(required), required)
                        } else {
                            (left, right)
                        });
                    }
                    outcome.valid &= valid;
                    if flag != ConditionFlag::Trigger {
                        outcome.primed &= valid;
                    }
                }
                // chaining flags continued above
                _ => {}
            }
        }

        outcome
    }

    /// Zero every hit count and the pause flag
    pub(crate) fn reset(&self, state: &mut State<'_>) {
        for condition in &self.conditions {
            state.set(condition.hits, 0);
        }
        state.set_flag(self.paused, false);
    }

    /// Hit count of the condition at `index`
    pub(crate) fn hits(&self, bytes: &[u8], index: usize) -> Option<u32> {
        self.conditions
            .get(index)
            .map(|condition| state::read_word(bytes, condition.hits))
    }

    pub(crate) fn is_paused(&self, bytes: &[u8]) -> bool {
        state::read_flag(bytes, self.paused)
    }

    /// Whether any condition carries `flag`
    pub(crate) fn has_flag(&self, flag: ConditionFlag) -> bool {
        self.conditions.iter().any(|condition| condition.flag == flag)
    }
}
