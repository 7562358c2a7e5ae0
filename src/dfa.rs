/*!

  Subset construction: the DFA whose states are the reachable sets of NFA
  states, interned by their bitset representation.

  Epsilon closures are precomputed per NFA state, so closing a whole set is
  a union of cached bitsets. The empty set is materialised as an explicit
  dead state whose transition row self-loops over all of Σ, which keeps the
  automaton total.

*/

use std::collections::{BTreeMap, HashMap};

use crate::alphabet::{ALPHABET, Sym};
use crate::limits::NO_CASE_TAG;
use crate::nfa::Nfa;
use crate::stateset::StateSet;
use crate::{CaseId32, StateId32};

/// A DFA state. The transition row is total over Σ.
#[derive(Clone, Debug)]
pub struct State {
  pub index    : StateId32,
  pub case_tag : CaseId32,
  pub(crate) transitions: BTreeMap<Sym, StateId32>,
}

impl State {

  pub fn transition(&self, symbol: Sym) -> Option<StateId32> {
    self.transitions.get(&symbol).copied()
  }


  /// Outgoing transitions in symbol order.
  pub fn transitions(&self) -> impl Iterator<Item = (Sym, StateId32)> + '_ {
    self.transitions.iter().map(|(&s, &t)| (s, t))
  }

}

#[derive(Clone, Debug)]
pub struct Dfa {
  pub(crate) start     : StateId32,
  pub(crate) dead      : StateId32,
  pub(crate) num_cases : usize,
  pub(crate) states    : Vec<State>,
}

impl Dfa {

  pub fn from_nfa(nfa: &Nfa) -> Dfa {
    powerset(nfa)
  }


  pub fn start(&self) -> StateId32 {
    self.start
  }


  pub fn dead(&self) -> StateId32 {
    self.dead
  }


  pub fn states(&self) -> &[State] {
    &self.states
  }


  pub fn num_cases(&self) -> usize {
    self.num_cases
  }


  /// Runs the automaton over a whole input and returns the case tag of the
  /// final state. Bytes outside Σ reject.
  pub fn case_tag_of(&self, input: &[u8]) -> CaseId32 {
    let mut state = self.start;
    for &b in input {
      match self.states[state as usize].transition(Sym(b)) {
        Some(next) => state = next,
        None => return NO_CASE_TAG,
      }
    }
    self.states[state as usize].case_tag
  }

}


/// Precomputes, for every NFA state, the set of states reachable through
/// empty-symbol transitions, including the state itself.
fn epsilon_closures(nfa: &Nfa) -> Vec<StateSet> {
  let n = nfa.states().len();
  let mut cache = Vec::with_capacity(n);

  for index in 0..n {
    let mut closed = StateSet::new(n);
    closed.insert(index);
    let mut fringe = vec![index];

    while let Some(i) = fringe.pop() {
      for t in &nfa.states()[i].transitions {
        if t.symbol.is_epsilon() && !closed.contains(t.to as usize) {
          closed.insert(t.to as usize);
          fringe.push(t.to as usize);
        }
      }
    }

    cache.push(closed);
  }

  cache
}


/// Extends `set` with the cached closure of each of its members. The cache
/// is transitively closed, so one sweep over the original members suffices.
fn close(cache: &[StateSet], set: &mut StateSet) {
  let members: Vec<usize> = set.iter().collect();
  for i in members {
    *set |= &cache[i];
  }
}


/// The set of states reachable from `set` by consuming `symbol`.
fn move_set(nfa: &Nfa, symbol: Sym, set: &StateSet) -> StateSet {
  let mut result = StateSet::new(set.universe());
  for i in set.iter() {
    for t in &nfa.states()[i].transitions {
      if t.symbol == symbol {
        result.insert(t.to as usize);
      }
    }
  }
  result
}


/// Allocates the DFA state for `set` and interns the mapping. The case tag
/// is the minimum tag over the set's accepting members, so the
/// earliest-declared rule wins on overlap.
fn new_state(
  nfa: &Nfa,
  nfa_accept: &StateSet,
  set: &StateSet,
  states: &mut Vec<State>,
  mapping: &mut HashMap<StateSet, StateId32>,
) -> StateId32 {
  let mut accepted = set.clone();
  accepted &= nfa_accept;

  let mut case_tag = NO_CASE_TAG;
  for i in accepted.iter() {
    case_tag = case_tag.min(nfa.states()[i].case_tag);
  }

  let index = states.len() as StateId32;
  states.push(State { index, case_tag, transitions: BTreeMap::new() });
  mapping.insert(set.clone(), index);
  index
}


fn powerset(nfa: &Nfa) -> Dfa {
  let n = nfa.states().len();
  let cache = epsilon_closures(nfa);

  let mut nfa_accept = StateSet::new(n);
  for &a in nfa.accept() {
    nfa_accept.insert(a as usize);
  }

  // Heuristic guess at the DFA's size.
  let mut states: Vec<State> = Vec::with_capacity(n / 2 + 2);
  let mut mapping: HashMap<StateSet, StateId32> = HashMap::new();
  let mut fringe: Vec<StateSet> = Vec::new();

  let mut start_set = StateSet::new(n);
  start_set.insert(nfa.start() as usize);
  close(&cache, &mut start_set);
  let start = new_state(nfa, &nfa_accept, &start_set, &mut states, &mut mapping);
  fringe.push(start_set);

  // The dead state is registered for the empty set but never explored.
  let dead_set = StateSet::new(n);
  let dead = new_state(nfa, &nfa_accept, &dead_set, &mut states, &mut mapping);

  while let Some(set) = fringe.pop() {
    let from = mapping[&set];

    for byte in ALPHABET.iter() {
      let symbol = Sym(byte);
      let mut target = move_set(nfa, symbol, &set);
      close(&cache, &mut target);

      let to = match mapping.get(&target) {
        Some(&existing) => existing,
        None => {
          let created = new_state(nfa, &nfa_accept, &target, &mut states, &mut mapping);
          fringe.push(target);
          created
        }
      };
      states[from as usize].transitions.insert(symbol, to);
    }
  }

  // Total over Σ: the dead state loops on every symbol.
  for byte in ALPHABET.iter() {
    states[dead as usize].transitions.insert(Sym(byte), dead);
  }

  log::debug!("powerset: {} nfa states -> {} dfa states", n, states.len());

  Dfa { start, dead, num_cases: nfa.num_cases(), states }
}
