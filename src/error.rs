/*!

  Error types for the compilation pipeline.

  A rule set either compiles end-to-end or fails with a single
  `CompileError` naming the offending rule. `SyntaxError` covers malformed
  patterns and carries the byte offset at which the problem was detected.
  `InvariantError` covers internal consistency failures and indicates a bug
  rather than malformed input.

*/

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::alphabet::Sym;
use crate::limits::MAX_STATES;
use crate::{Index32, StateId32};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SyntaxError {
  TrailingEscape(Index32),       //< pattern ends in an unfinished `\`
  UnmatchedLBracket(Index32),    //< `[` without a closing `]`
  UnmatchedRBracket(Index32),    //< `]` without an opening `[`
  EmptyClass(Index32),           //< class `[]` or `[^]` has no members
  RangeOutsideAlphabet(Index32), //< class range endpoint outside Σ
  InvalidRange(Index32),         //< class range with lo > hi, e.g. `[z-a]`
  MismatchedParens(Index32),
  MissingOperand(Index32),       //< operator where an operand is required
  MissingOperator(Index32),      //< operand where an operator is required
  StrayRangeOperator(Index32),   //< `]`, `^`, or `-` outside a class
  EmptyPattern,                  //< regex rules must be non-empty
}

impl SyntaxError {

  /// The byte offset at which the error was detected.
  pub fn idx(&self) -> Index32 {
    *match self {
      | SyntaxError::TrailingEscape(loc)
      | SyntaxError::UnmatchedLBracket(loc)
      | SyntaxError::UnmatchedRBracket(loc)
      | SyntaxError::EmptyClass(loc)
      | SyntaxError::RangeOutsideAlphabet(loc)
      | SyntaxError::InvalidRange(loc)
      | SyntaxError::MismatchedParens(loc)
      | SyntaxError::MissingOperand(loc)
      | SyntaxError::MissingOperator(loc)
      | SyntaxError::StrayRangeOperator(loc) => loc,

      SyntaxError::EmptyPattern => &0,
    }
  }

}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      SyntaxError::TrailingEscape(loc) => {
        write!(f, "trailing escape at byte {}", loc)
      }
      SyntaxError::UnmatchedLBracket(loc) => {
        write!(f, "unmatched '[' at byte {}", loc)
      }
      SyntaxError::UnmatchedRBracket(loc) => {
        write!(f, "unmatched ']' at byte {}", loc)
      }
      SyntaxError::EmptyClass(loc) => {
        write!(f, "empty character class at byte {}", loc)
      }
      SyntaxError::RangeOutsideAlphabet(loc) => {
        write!(f, "class range endpoint outside the alphabet at byte {}", loc)
      }
      SyntaxError::InvalidRange(loc) => {
        write!(f, "invalid class range at byte {}", loc)
      }
      SyntaxError::MismatchedParens(loc) => {
        write!(f, "mismatched parentheses at byte {}", loc)
      }
      SyntaxError::MissingOperand(loc) => {
        write!(f, "operator is missing an operand at byte {}", loc)
      }
      SyntaxError::MissingOperator(loc) => {
        write!(f, "adjacent operands without an operator at byte {}", loc)
      }
      SyntaxError::StrayRangeOperator(loc) => {
        write!(f, "class operator outside a character class at byte {}", loc)
      }
      SyntaxError::EmptyPattern => {
        write!(f, "empty regex pattern")
      }
    }
  }
}

impl Error for SyntaxError {}


/// Internal consistency failure. Any of these surfacing means the compiler
/// itself is broken, not the rule set.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InvariantError {
  UnpatchedHole { state: StateId32, symbol: Sym },      //< a concluded fragment kept a pending transition
  MistaggedState { state: StateId32 },                  //< tag/accept-set disagreement in a built NFA
  MissingTransition { state: StateId32, symbol: Sym },  //< DFA row not total over Σ
  UnexpectedOpcode { byte: u8 },                        //< postfix stream held a byte no pass should emit
  PartitionInconsistency { state: StateId32 },          //< refinement merged states disagreeing on δ
}

impl Display for InvariantError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      InvariantError::UnpatchedHole { state, symbol } => {
        write!(f, "unpatched hole out of state {} on '{}'", state, symbol)
      }
      InvariantError::MistaggedState { state } => {
        write!(f, "state {} disagrees with the accept set about its case tag", state)
      }
      InvariantError::MissingTransition { state, symbol } => {
        write!(f, "state {} has no transition on '{}'", state, symbol)
      }
      InvariantError::UnexpectedOpcode { byte } => {
        write!(f, "unexpected opcode byte 0x{:02x} in a postfix stream", byte)
      }
      InvariantError::PartitionInconsistency { state } => {
        write!(f, "partition refinement produced an inconsistent block for state {}", state)
      }
    }
  }
}

impl Error for InvariantError {}


/// Top-level pipeline error, attributed to the rule that caused it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompileError {
  Syntax { rule: usize, error: SyntaxError },
  LimitExceeded { rule: usize, states: usize },
  Invariant { rule: usize, error: InvariantError },
}

impl Display for CompileError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      CompileError::Syntax { rule, error } => {
        write!(f, "rule {}: {}", rule, error)
      }
      CompileError::LimitExceeded { rule, states } => {
        write!(f, "rule {}: state limit exceeded ({} states, max {})", rule, states, MAX_STATES)
      }
      CompileError::Invariant { rule, error } => {
        write!(f, "rule {}: internal invariant violated: {}", rule, error)
      }
    }
  }
}

impl Error for CompileError {}
