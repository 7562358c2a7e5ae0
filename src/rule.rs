/*!

  The user-facing rule model: a pattern, how to interpret it, and opaque
  consumer metadata carried through the pipeline unchanged.

*/

/// How a rule's pattern bytes are interpreted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PatternKind {
  /// A regular expression, preprocessed before NFA construction.
  Regex,
  /// A literal string, matched byte for byte.
  Str,
  /// A no-match rule: its case exists but only scanner-level signals reach it.
  None,
  /// An end-of-file rule, likewise reachable only by scanner-level signals.
  Eof,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rule {
  pub pattern : Vec<u8>,     //< pattern bytes; rewritten in place by the preprocessor
  pub kind    : PatternKind, //< how `pattern` is interpreted
  pub alias   : Vec<u8>,     //< opaque consumer payload, carried through verbatim
  pub action  : Vec<u8>,     //< opaque consumer payload, carried through verbatim
}

impl Rule {

  pub fn regex(pattern: impl Into<Vec<u8>>) -> Rule {
    Rule {
      pattern: pattern.into(),
      kind: PatternKind::Regex,
      alias: Vec::new(),
      action: Vec::new(),
    }
  }


  pub fn string(pattern: impl Into<Vec<u8>>) -> Rule {
    Rule {
      pattern: pattern.into(),
      kind: PatternKind::Str,
      alias: Vec::new(),
      action: Vec::new(),
    }
  }


  pub fn none() -> Rule {
    Rule {
      pattern: Vec::new(),
      kind: PatternKind::None,
      alias: Vec::new(),
      action: Vec::new(),
    }
  }


  pub fn eof() -> Rule {
    Rule {
      pattern: Vec::new(),
      kind: PatternKind::Eof,
      alias: Vec::new(),
      action: Vec::new(),
    }
  }


  pub fn with_alias(mut self, alias: impl Into<Vec<u8>>) -> Rule {
    self.alias = alias.into();
    self
  }


  pub fn with_action(mut self, action: impl Into<Vec<u8>>) -> Rule {
    self.action = action.into();
    self
  }

}
