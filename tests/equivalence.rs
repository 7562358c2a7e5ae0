//! Property tests: the three automata agree on every input, and
//! minimisation is a shrinking fixed point.

use std::collections::BTreeSet;

use proptest::prelude::*;

use taglex::opcode::Op;
use taglex::{minimize, CaseId32, Compiler, Nfa, Rule, Sym, EPSILON, NO_CASE_TAG};

/// A reference NFA simulation over the public state model, independent of
/// the subset construction under test.
fn nfa_case_tag(nfa: &Nfa, input: &[u8]) -> CaseId32 {
  fn close(nfa: &Nfa, set: &mut BTreeSet<u32>) {
    let mut stack: Vec<u32> = set.iter().copied().collect();
    while let Some(s) = stack.pop() {
      for t in &nfa.states()[s as usize].transitions {
        if t.symbol == EPSILON && set.insert(t.to) {
          stack.push(t.to);
        }
      }
    }
  }

  let mut current = BTreeSet::from([nfa.start()]);
  close(nfa, &mut current);

  for &b in input {
    let mut next = BTreeSet::new();
    for &s in &current {
      for t in &nfa.states()[s as usize].transitions {
        if t.symbol == Sym(b) {
          next.insert(t.to);
        }
      }
    }
    close(nfa, &mut next);
    current = next;
    if current.is_empty() {
      return NO_CASE_TAG;
    }
  }

  current
    .iter()
    .filter(|&&s| nfa.is_accept(s))
    .map(|&s| nfa.states()[s as usize].case_tag)
    .min()
    .unwrap_or(NO_CASE_TAG)
}

#[derive(Clone, Debug)]
enum Ast {
  Lit(u8),
  Class { lo: u8, hi: u8, inverted: bool },
  Cat(Box<Ast>, Box<Ast>),
  Alt(Box<Ast>, Box<Ast>),
  Star(Box<Ast>),
  Plus(Box<Ast>),
  Opt(Box<Ast>),
}

fn render(ast: &Ast, out: &mut Vec<u8>) {
  match ast {
    Ast::Lit(c) => {
      if Op::from_surface(*c).is_some() || *c == b'\\' {
        out.push(b'\\');
      }
      out.push(*c);
    }
    Ast::Class { lo, hi, inverted } => {
      out.push(b'[');
      if *inverted {
        out.push(b'^');
      }
      out.push(*lo);
      out.push(b'-');
      out.push(*hi);
      out.push(b']');
    }
    Ast::Cat(a, b) => {
      out.push(b'(');
      render(a, out);
      out.push(b')');
      out.push(b'(');
      render(b, out);
      out.push(b')');
    }
    Ast::Alt(a, b) => {
      out.push(b'(');
      render(a, out);
      out.push(b'|');
      render(b, out);
      out.push(b')');
    }
    Ast::Star(a) => {
      out.push(b'(');
      render(a, out);
      out.push(b')');
      out.push(b'*');
    }
    Ast::Plus(a) => {
      out.push(b'(');
      render(a, out);
      out.push(b')');
      out.push(b'+');
    }
    Ast::Opt(a) => {
      out.push(b'(');
      render(a, out);
      out.push(b')');
      out.push(b'?');
    }
  }
}

fn pattern_of(ast: &Ast) -> Vec<u8> {
  let mut out = Vec::new();
  render(ast, &mut out);
  out
}

fn ast() -> impl Strategy<Value = Ast> {
  let leaf = prop_oneof![
    // Literals include operator characters to exercise escaping.
    prop_oneof![
      Just(b'a'),
      Just(b'b'),
      Just(b'c'),
      Just(b' '),
      Just(b'|'),
      Just(b'*'),
    ]
    .prop_map(Ast::Lit),
    (0u8..4, 0u8..4, any::<bool>()).prop_map(|(x, y, inverted)| Ast::Class {
      lo: b'a' + x.min(y),
      hi: b'a' + x.max(y),
      inverted,
    }),
  ];

  leaf.prop_recursive(3, 12, 2, |inner| {
    prop_oneof![
      (inner.clone(), inner.clone()).prop_map(|(a, b)| Ast::Cat(a.into(), b.into())),
      (inner.clone(), inner.clone()).prop_map(|(a, b)| Ast::Alt(a.into(), b.into())),
      inner.clone().prop_map(|a| Ast::Star(a.into())),
      inner.clone().prop_map(|a| Ast::Plus(a.into())),
      inner.prop_map(|a| Ast::Opt(a.into())),
    ]
  })
}

fn inputs() -> impl Strategy<Value = Vec<Vec<u8>>> {
  let byte = prop_oneof![
    Just(b'a'),
    Just(b'b'),
    Just(b'c'),
    Just(b'd'),
    Just(b' '),
    Just(b'|'),
    Just(b'*'),
  ];
  prop::collection::vec(prop::collection::vec(byte, 0..6), 0..8)
}

proptest! {
  #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

  #[test]
  fn all_three_automata_agree(asts in prop::collection::vec(ast(), 1..3), inputs in inputs()) {
    let rules: Vec<Rule> = asts.iter().map(|a| Rule::regex(pattern_of(a))).collect();
    let artifacts = Compiler::new().compile(rules).unwrap();
    let min = artifacts.min_dfa.as_ref().unwrap();

    for input in inputs.iter().map(|v| v.as_slice()).chain([&b""[..]]) {
      let reference = nfa_case_tag(&artifacts.nfa, input);
      prop_assert_eq!(reference, artifacts.dfa.case_tag_of(input));
      prop_assert_eq!(reference, min.case_tag_of(input));
    }
  }

  #[test]
  fn minimisation_shrinks_to_a_fixed_point(asts in prop::collection::vec(ast(), 1..3)) {
    let rules: Vec<Rule> = asts.iter().map(|a| Rule::regex(pattern_of(a))).collect();
    let artifacts = Compiler::new().compile(rules).unwrap();
    let min = artifacts.min_dfa.as_ref().unwrap();

    prop_assert!(min.states().len() <= artifacts.dfa.states().len());

    let again = minimize(min).unwrap();
    prop_assert_eq!(again.states().len(), min.states().len());
    prop_assert_eq!(again.num_cases(), min.num_cases());
  }
}
