//! Leaderboards
//!
//! ```text
//! STA:<trigger>::CAN:<trigger>::SUB:<trigger>::VAL:<value>[::PRO:<value>]
//! ```
//!
//! Fields may appear in any order and are matched case-insensitively. Each
//! frame all three triggers run, then the state machine advances:
//!
//! ```text
//!              start && !cancel            submit
//! Inactive ------------------------> Active -------> Triggered --+
//!    ^                                  |   cancel                |
//!    |                                  +--------> Canceled ------+
//!    |          start seen false (latch released)                 |
//!    +------------------------------------------------------------+
//! ```
//!
//! Submit and cancel are checked on the start frame too, so a leaderboard
//! whose submit already holds when it starts reports `Triggered` at once.


use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{self, Definition, Flag, Handle, Layout, State};
use crate::trigger::TriggerExpr;
use crate::value::ValueExpr;

/// Result of one leaderboard frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardState {
    /// Not running
    Inactive,
    /// Running, no transition this frame
    Active,
    /// Started this frame
    Started,
    /// Canceled this frame
    Canceled,
    /// Submitted this frame
    Triggered,
}

/// Parsed leaderboard definition
#[derive(Debug)]
pub struct LeaderboardDef {
    start: TriggerExpr,
    cancel: TriggerExpr,
    submit: TriggerExpr,
    value: ValueExpr,
    progress: Option<ValueExpr>,
    active: Flag,
    submitted: Flag,
    len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    Cancel,
    Submit,
    Value,
    Progress,
}

impl Field {
    fn parse(cur: &mut Cursor<'_>) -> Result<Self> {
        const FIELDS: [(&str, Field); 5] = [
            ("STA:", Field::Start),
            ("CAN:", Field::Cancel),
            ("SUB:", Field::Submit),
            ("VAL:", Field::Value),
            ("PRO:", Field::Progress),
        ];
        FIELDS
            .iter()
            .find(|(tag, _)| cur.eat_str_ignore_case(tag))
            .map(|&(_, field)| field)
            .ok_or(Error::InvalidLboardField)
    }

    fn duplicated(self) -> Error {
        match self {
            Self::Start => Error::DuplicatedStart,
            Self::Cancel => Error::DuplicatedCancel,
            Self::Submit => Error::DuplicatedSubmit,
            Self::Value => Error::DuplicatedValue,
            Self::Progress => Error::DuplicatedProgress,
        }
    }
}

impl LeaderboardDef {
    pub fn start(&self) -> &TriggerExpr {
        &self.start
    }

    pub fn cancel(&self) -> &TriggerExpr {
        &self.cancel
    }

    pub fn submit(&self) -> &TriggerExpr {
        &self.submit
    }

    pub fn value(&self) -> &ValueExpr {
        &self.value
    }

    pub fn progress(&self) -> Option<&ValueExpr> {
        self.progress.as_ref()
    }

    fn evaluate<P: Peek + ?Sized>(&self, state: &mut State<'_>, peek: &mut P) -> (LeaderboardState, u32) {
        let start = self.start.evaluate(state, peek);
        let cancel = self.cancel.evaluate(state, peek);
        let submit = self.submit.evaluate(state, peek);

        let value = self.value.evaluate(state, peek);
        let progress = self
            .progress
            .as_ref()
            .map_or(value, |progress| progress.evaluate(state, peek));

        let mut started = false;
        if state.flag(self.submitted) {
            if !start {
                state.set_flag(self.submitted, false);
            }
        } else if !state.flag(self.active) && start && !cancel {
            state.set_flag(self.active, true);
            started = true;
        }

        // a start frame still sees submit and cancel
        let next = if !state.flag(self.active) {
            LeaderboardState::Inactive
        } else if submit {
            state.set_flag(self.active, false);
            state.set_flag(self.submitted, true);
            LeaderboardState::Triggered
        } else if cancel {
            state.set_flag(self.active, false);
            state.set_flag(self.submitted, true);
            LeaderboardState::Canceled
        } else if started {
            LeaderboardState::Started
        } else {
            LeaderboardState::Active
        };

        if next != LeaderboardState::Active && next != LeaderboardState::Inactive {
            tracing::debug!(state = ?next, value, "leaderboard transition");
        }

        let reported = match next {
            LeaderboardState::Started | LeaderboardState::Active => progress,
            LeaderboardState::Triggered => value,
            LeaderboardState::Inactive | LeaderboardState::Canceled => 0,
        };
        (next, reported)
    }

    fn reset(&self, state: &mut State<'_>) {
        self.start.reset(state);
        self.cancel.reset(state);
        self.submit.reset(state);
        state.set_flag(self.active, false);
        state.set_flag(self.submitted, false);
    }
}

impl Definition for LeaderboardDef {
    const MAGIC: [u8; 4] = *b"LBRD";

    fn parse_with(script: &str, options: &ParseOptions) -> Result<Self> {
        let mut layout = Layout::new();
        let mut cur = Cursor::new(script);

        let mut start = None;
        let mut cancel = None;
        let mut submit = None;
        let mut value = None;
        let mut progress = None;

        loop {
            let field = Field::parse(&mut cur)?;
            let taken = match field {
                Field::Start => start.is_some(),
                Field::Cancel => cancel.is_some(),
                Field::Submit => submit.is_some(),
                Field::Value => value.is_some(),
                Field::Progress => progress.is_some(),
            };
            if taken {
                return Err(field.duplicated());
            }

            match field {
                Field::Start => start = Some(TriggerExpr::parse(&mut cur, &mut layout, options)?),
                Field::Cancel => cancel = Some(TriggerExpr::parse(&mut cur, &mut layout, options)?),
                Field::Submit => submit = Some(TriggerExpr::parse(&mut cur, &mut layout, options)?),
                Field::Value => value = Some(ValueExpr::parse(&mut cur, &mut layout, options)?),
                Field::Progress => {
                    progress = Some(ValueExpr::parse(&mut cur, &mut layout, options)?)
                }
            }

            if cur.is_eof() {
                break;
            }
            if !cur.eat_str_ignore_case("::") {
                return Err(Error::InvalidLboardField);
            }
        }

        let start = start.ok_or(Error::MissingStart)?;
        let cancel = cancel.ok_or(Error::MissingCancel)?;
        let submit = submit.ok_or(Error::MissingSubmit)?;
        let value = value.ok_or(Error::MissingValue)?;

        Ok(Self {
            start,
            cancel,
            submit,
            value,
            progress,
            active: layout.flag(),
            submitted: layout.flag(),
            len: layout.len(),
        })
    }

    fn state_len(&self) -> usize {
        self.len
    }
}

/// A leaderboard bound to its state buffer
pub type Leaderboard<B = Vec<u8>> = Handle<LeaderboardDef, B>;

impl<B: AsRef<[u8]> + AsMut<[u8]>> Handle<LeaderboardDef, B> {
    /// Run one frame; returns the state and the value to display or submit
    pub fn evaluate<P: Peek + ?Sized>(&mut self, peek: &mut P) -> (LeaderboardState, u32) {
        let (def, mut state) = self.split();
        def.evaluate(&mut state, peek)
    }

    /// Deactivate and zero every hit count
    pub fn reset(&mut self) {
        let (def, mut state) = self.split();
        def.reset(&mut state);
    }

    /// Reset without reporting; an attempt that was running keeps start
    /// latched, so start must go false before it can begin again
    pub fn suspend(&mut self) {
        let (def, mut state) = self.split();
        let was_active = state.flag(def.active);
        def.reset(&mut state);
        state.set_flag(def.submitted, was_active);
    }

    pub fn is_active(&self) -> bool {
        self.with_state(|def, bytes| state::read_flag(bytes, def.active))
    }
}

/// Bytes of state needed to run `script`
pub fn size(script: &str) -> Result<usize> {
    size_with(script, &ParseOptions::default())
}

pub fn size_with(script: &str, options: &ParseOptions) -> Result<usize> {
    state::size::<LeaderboardDef>(script, options)
}

/// Parse `script` into `buffer`
pub fn parse<B: AsRef<[u8]> + AsMut<[u8]>>(buffer: B, script: &str) -> Result<Leaderboard<B>> {
    parse_with(buffer, script, &ParseOptions::default())
}

pub fn parse_with<B: AsRef<[u8]> + AsMut<[u8]>>(
    buffer: B,
    script: &str,
    options: &ParseOptions,
) -> Result<Leaderboard<B>> {
    state::parse::<LeaderboardDef, B>(buffer, script, options)
}
