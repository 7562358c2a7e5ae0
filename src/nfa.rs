/*!

  The NFA data model: a state vector, a shared start state, and the set of
  tagged accept states. Built once by [`crate::builder::NfaBuilder`], then
  frozen; downstream stages only read it.

*/

use std::collections::BTreeSet;

use crate::alphabet::Sym;
use crate::limits::NO_CASE_TAG;
use crate::{CaseId32, StateId32};

/// A transition from one state to another.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition {
  pub symbol : Sym,       //< the input symbol, possibly `EPSILON`
  pub to     : StateId32, //< index of the result state
}

/// A state in the NFA. Nondeterminism shows up as multiple outgoing
/// transitions on the same symbol.
#[derive(Clone, Debug)]
pub struct State {
  pub index       : StateId32,       //< position of this state in the state vector
  pub case_tag    : CaseId32,        //< accepted rule, or `NO_CASE_TAG`
  pub transitions : Vec<Transition>, //< outgoing transitions
}

#[derive(Clone, Debug)]
pub struct Nfa {
  pub(crate) start     : StateId32,
  pub(crate) accept    : BTreeSet<StateId32>,
  pub(crate) states    : Vec<State>,
  pub(crate) num_cases : usize,
}

impl Nfa {

  pub fn start(&self) -> StateId32 {
    self.start
  }


  pub fn accept(&self) -> &BTreeSet<StateId32> {
    &self.accept
  }


  pub fn states(&self) -> &[State] {
    &self.states
  }


  pub fn num_cases(&self) -> usize {
    self.num_cases
  }


  pub fn is_accept(&self, state: StateId32) -> bool {
    self.accept.contains(&state)
  }


  /// Count of epsilon transitions, mostly interesting in logs and tests.
  pub fn epsilon_count(&self) -> usize {
    self.states
      .iter()
      .flat_map(|s| s.transitions.iter())
      .filter(|t| t.symbol.is_epsilon())
      .count()
  }

}


impl State {

  pub fn is_tagged(&self) -> bool {
    self.case_tag != NO_CASE_TAG
  }

}
