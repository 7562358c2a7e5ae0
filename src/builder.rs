/*!

  Thompson-style NFA construction over fragments with explicit holes.

  A [`Fragment`] is a value: the index of its entry state plus the list of
  prepared transitions whose destinations are not yet known. No combinator
  holds references into the state vector, so fragments move freely; patching
  a hole appends the completed transition to its source state.

  Concatenation patches the left fragment's holes to the right fragment's
  start. Concluding a rule patches every remaining hole into a fresh accept
  state tagged with the rule's index.

*/

use std::collections::BTreeSet;

use smallvec::{smallvec, SmallVec};

use crate::alphabet::{ALPHABET, Sym, EPSILON};
use crate::error::{CompileError, InvariantError, SyntaxError};
use crate::flat::{self, FlatExpr, Symbol};
use crate::limits::{MAX_STATES, NO_CASE_TAG};
use crate::nfa::{Nfa, State, Transition};
use crate::preprocessor;
use crate::rule::{PatternKind, Rule};
use crate::{CaseId32, StateId32};

type Holes = SmallVec<[Hole; 4]>;

/// A prepared transition whose destination is not yet known.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Hole {
  pub state  : StateId32, //< state waiting for a destination
  pub symbol : Sym,       //< transition label out of `state`
}

/// A partial automaton: an entry state plus its pending transitions.
#[derive(Clone, Debug)]
pub struct Fragment {
  pub start : StateId32,
  pub holes : Holes,
}

pub struct NfaBuilder {
  states  : Vec<State>,
  accept  : BTreeSet<StateId32>,
  rule_no : usize, //< rule currently being built, for error attribution
}

impl NfaBuilder {

  /// Builds a single NFA covering the whole rule set: one shared start
  /// state with an empty-symbol edge to each rule's sub-automaton, and one
  /// tagged accept state per rule.
  pub fn build(mut rules: Vec<Rule>) -> Result<Nfa, CompileError> {
    let mut builder = NfaBuilder::new();
    let num_cases = rules.len();
    let start = builder.new_state(NO_CASE_TAG)?;

    for (rule_no, rule) in rules.iter_mut().enumerate() {
      builder.rule_no = rule_no;
      preprocessor::preprocess(rule)
        .map_err(|error| CompileError::Syntax { rule: rule_no, error })?;

      let expr = match rule.kind {
        PatternKind::Regex => flat::from_postfix(&rule.pattern)
          .map_err(|error| CompileError::Invariant { rule: rule_no, error })?,

        PatternKind::Str => vec![Symbol::Literal(rule.pattern.clone())],

        // Signal rules get a tagged accept state but no transitions; only
        // scanner-level signals can reach them.
        PatternKind::None | PatternKind::Eof => {
          let accept_state = builder.new_state(rule_no as CaseId32)?;
          builder.accept.insert(accept_state);
          continue;
        }
      };

      let fragment = builder.build_fragment(&expr)?;
      let entry = builder.conclude_case(rule_no as CaseId32, fragment)?;
      builder.states[start as usize]
        .transitions
        .push(Transition { symbol: EPSILON, to: entry });
    }

    log::debug!(
      "nfa assembled: {} states, {} accept, {} cases",
      builder.states.len(),
      builder.accept.len(),
      num_cases
    );

    builder.finish(start, num_cases)
  }


  /// Builds an NFA from flat expressions that bypass the preprocessor, one
  /// expression per rule.
  pub fn build_from_exprs(exprs: &[FlatExpr]) -> Result<Nfa, CompileError> {
    let mut builder = NfaBuilder::new();
    let start = builder.new_state(NO_CASE_TAG)?;

    for (rule_no, expr) in exprs.iter().enumerate() {
      builder.rule_no = rule_no;
      let fragment = builder.build_fragment(expr)?;
      let entry = builder.conclude_case(rule_no as CaseId32, fragment)?;
      builder.states[start as usize]
        .transitions
        .push(Transition { symbol: EPSILON, to: entry });
    }

    builder.finish(start, exprs.len())
  }


  fn new() -> NfaBuilder {
    NfaBuilder {
      states: Vec::new(),
      accept: BTreeSet::new(),
      rule_no: 0,
    }
  }


  fn finish(self, start: StateId32, num_cases: usize) -> Result<Nfa, CompileError> {
    let nfa = Nfa {
      start,
      accept: self.accept,
      states: self.states,
      num_cases,
    };
    check_invariants(&nfa).map_err(|error| CompileError::Invariant { rule: self.rule_no, error })?;
    Ok(nfa)
  }


  fn syntax(&self, error: SyntaxError) -> CompileError {
    CompileError::Syntax { rule: self.rule_no, error }
  }


  fn new_state(&mut self, case_tag: CaseId32) -> Result<StateId32, CompileError> {
    if self.states.len() >= MAX_STATES {
      return Err(CompileError::LimitExceeded { rule: self.rule_no, states: self.states.len() });
    }
    let index = self.states.len() as StateId32;
    self.states.push(State { index, case_tag, transitions: Vec::new() });
    Ok(index)
  }


  fn patch_holes(&mut self, holes: &[Hole], to: StateId32) {
    for hole in holes {
      self.states[hole.state as usize]
        .transitions
        .push(Transition { symbol: hole.symbol, to });
    }
  }


  // region Fragment combinators

  /// One state, one pending transition on `c`. With `c == EPSILON` this is
  /// the empty-string fragment.
  pub fn make_char(&mut self, c: Sym) -> Result<Fragment, CompileError> {
    let q = self.new_state(NO_CASE_TAG)?;
    Ok(Fragment { start: q, holes: smallvec![Hole { state: q, symbol: c }] })
  }


  /// The concatenation of a non-empty string of bytes.
  pub fn make_literal(&mut self, s: &[u8]) -> Result<Fragment, CompileError> {
    if s.is_empty() {
      return Err(self.syntax(SyntaxError::EmptyPattern));
    }
    let mut fragment = self.make_char(Sym(s[0]))?;
    for &b in &s[1..] {
      let right = self.make_char(Sym(b))?;
      fragment = self.apply_cat(fragment, right);
    }
    Ok(fragment)
  }


  /// One state with a pending transition per member of the range, or per
  /// member of Σ outside the range when `inverted`.
  pub fn make_charset(&mut self, lo: u8, hi: u8, inverted: bool) -> Result<Fragment, CompileError> {
    if !ALPHABET.contains(lo) || !ALPHABET.contains(hi) {
      return Err(self.syntax(SyntaxError::RangeOutsideAlphabet(0)));
    }
    if lo > hi {
      return Err(self.syntax(SyntaxError::InvalidRange(0)));
    }

    let q = self.new_state(NO_CASE_TAG)?;
    let mut holes = Holes::new();
    match inverted {
      false => {
        for c in lo..=hi {
          holes.push(Hole { state: q, symbol: Sym(c) });
        }
      }

      true => {
        for c in ALPHABET.iter() {
          if c < lo || c > hi {
            holes.push(Hole { state: q, symbol: Sym(c) });
          }
        }
      }
    }
    Ok(Fragment { start: q, holes })
  }


  /// Patches the left fragment's holes to the right fragment's start; the
  /// pending transitions of the result are the right's.
  pub fn apply_cat(&mut self, left: Fragment, right: Fragment) -> Fragment {
    self.patch_holes(&left.holes, right.start);
    Fragment { start: left.start, holes: right.holes }
  }


  /// A new entry state branching on the empty symbol to either operand; the
  /// result keeps both operands' holes.
  pub fn apply_union(&mut self, left: Fragment, right: Fragment) -> Result<Fragment, CompileError> {
    let q = self.new_state(NO_CASE_TAG)?;
    self.states[q as usize].transitions.push(Transition { symbol: EPSILON, to: left.start });
    self.states[q as usize].transitions.push(Transition { symbol: EPSILON, to: right.start });

    let mut holes = left.holes;
    holes.extend_from_slice(&right.holes);
    Ok(Fragment { start: q, holes })
  }


  /// The skip-or-loop construction: a new entry state with an empty edge
  /// into the operand, the operand's holes looped back to the entry, and a
  /// single pending empty edge out of the operand's old start.
  pub fn apply_star(&mut self, inner: Fragment) -> Result<Fragment, CompileError> {
    let q = self.new_state(NO_CASE_TAG)?;
    self.states[q as usize].transitions.push(Transition { symbol: EPSILON, to: inner.start });
    self.patch_holes(&inner.holes, q);
    Ok(Fragment {
      start: q,
      holes: smallvec![Hole { state: inner.start, symbol: EPSILON }],
    })
  }


  /// Seals a rule: allocates its tagged accept state, patches every
  /// remaining hole into it, and returns the fragment's entry state.
  pub fn conclude_case(&mut self, case: CaseId32, fragment: Fragment) -> Result<StateId32, CompileError> {
    let accept_state = self.new_state(case)?;
    self.patch_holes(&fragment.holes, accept_state);
    self.accept.insert(accept_state);
    Ok(fragment.start)
  }

  // endregion


  /// Folds a postfix symbol stream into one fragment with a stack machine.
  fn build_fragment(&mut self, expr: &[Symbol]) -> Result<Fragment, CompileError> {
    let mut stack: Vec<Fragment> = Vec::new();

    for symbol in expr {
      let fragment = match symbol {
        Symbol::Char(c) => self.make_char(*c)?,

        Symbol::Literal(s) => self.make_literal(s)?,

        Symbol::Charset { lo, hi, inverted } => self.make_charset(*lo, *hi, *inverted)?,

        Symbol::Union => {
          let right = self.pop_operand(&mut stack)?;
          let left = self.pop_operand(&mut stack)?;
          self.apply_union(left, right)?
        }

        Symbol::Concat => {
          let right = self.pop_operand(&mut stack)?;
          let left = self.pop_operand(&mut stack)?;
          self.apply_cat(left, right)
        }

        Symbol::KleeneStar => {
          let inner = self.pop_operand(&mut stack)?;
          self.apply_star(inner)?
        }
      };
      stack.push(fragment);
    }

    match stack.pop() {
      Some(fragment) if stack.is_empty() => Ok(fragment),
      Some(_) => Err(self.syntax(SyntaxError::MissingOperator(0))),
      None => Err(self.syntax(SyntaxError::EmptyPattern)),
    }
  }


  fn pop_operand(&self, stack: &mut Vec<Fragment>) -> Result<Fragment, CompileError> {
    stack.pop().ok_or(self.syntax(SyntaxError::MissingOperand(0)))
  }

}


/// Structural checks over a finished NFA: positional indices, in-range
/// transition targets, and tag/accept-set agreement. A failure here is a
/// builder bug surfacing, not bad input.
fn check_invariants(nfa: &Nfa) -> Result<(), InvariantError> {
  let len = nfa.states().len() as StateId32;

  for state in nfa.states() {
    let tagged = state.case_tag != NO_CASE_TAG;
    if tagged != nfa.is_accept(state.index) {
      return Err(InvariantError::MistaggedState { state: state.index });
    }
    for t in &state.transitions {
      if t.to >= len {
        return Err(InvariantError::UnpatchedHole { state: state.index, symbol: t.symbol });
      }
    }
  }
  Ok(())
}
