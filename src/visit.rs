/*!

  Read-only enumeration of automata for external consumers: DOT renderers,
  table emitters, test assertions. The core never renders or serialises
  anything itself; this interface is all it publishes.

*/

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::alphabet::Sym;
use crate::{CaseId32, StateId32};

/// Callbacks driven once per state and once per transition, in
/// deterministic order.
pub trait StateVisitor {
  fn enter_state(&mut self, index: StateId32, case_tag: CaseId32);
  fn visit_transition(&mut self, from: StateId32, symbol: Sym, to: StateId32);
}

/// An automaton that can be walked read-only.
pub trait Visitable {
  fn start(&self) -> StateId32;

  /// The rejection sink; `None` for automata without one.
  fn dead(&self) -> Option<StateId32>;

  fn state_count(&self) -> usize;

  /// Drives the visitor over every state in index order, entering each
  /// state before its outgoing transitions.
  fn walk(&self, visitor: &mut dyn StateVisitor);
}


impl Visitable for Nfa {

  fn start(&self) -> StateId32 {
    Nfa::start(self)
  }


  fn dead(&self) -> Option<StateId32> {
    None
  }


  fn state_count(&self) -> usize {
    self.states().len()
  }


  fn walk(&self, visitor: &mut dyn StateVisitor) {
    for state in self.states() {
      visitor.enter_state(state.index, state.case_tag);
      for t in &state.transitions {
        visitor.visit_transition(state.index, t.symbol, t.to);
      }
    }
  }

}


impl Visitable for Dfa {

  fn start(&self) -> StateId32 {
    Dfa::start(self)
  }


  fn dead(&self) -> Option<StateId32> {
    Some(Dfa::dead(self))
  }


  fn state_count(&self) -> usize {
    self.states().len()
  }


  fn walk(&self, visitor: &mut dyn StateVisitor) {
    for state in self.states() {
      visitor.enter_state(state.index, state.case_tag);
      for (symbol, to) in state.transitions() {
        visitor.visit_transition(state.index, symbol, to);
      }
    }
  }

}
