/*!

  Rewrites a rule's user-facing pattern into the flat postfix form the NFA
  builder consumes. Five passes, each a whole-pattern rewrite:

  1. `encode` moves operator characters out-of-band (see [`crate::opcode`]);
     a backslash escapes the next byte and forces it literal.
  2. `unify_ranges` desugars `[...]` classes, including `^` inversion and
     `a-b` ranges, into parenthesised unions of their members.
  3. `desugar` rewrites `X+` as `X X *` and `X?` as `( X | ε )`.
  4. `insert_concats` makes implicit concatenation explicit.
  5. `make_rpn` converts the encoded infix stream to postfix by
     shunting-yard.

  Only `Regex` rules are transformed. `Str` rules pass through untouched and
  `None`/`Eof` rules come out with an empty pattern.

*/

use crate::alphabet::{ALPHABET, ByteSet, EPSILON};
use crate::error::{CompileError, SyntaxError};
use crate::opcode::{self, kind_of, CharKind, Op};
use crate::rule::{PatternKind, Rule};
use crate::Index32;

/// Preprocesses one rule in place.
pub fn preprocess(rule: &mut Rule) -> Result<(), SyntaxError> {
  match rule.kind {
    PatternKind::Str => Ok(()),

    PatternKind::None | PatternKind::Eof => {
      rule.pattern.clear();
      Ok(())
    }

    PatternKind::Regex => {
      if rule.pattern.is_empty() {
        return Err(SyntaxError::EmptyPattern);
      }

      encode(&mut rule.pattern)?;
      log::trace!("encoded:  {}", opcode::decoded_string(&rule.pattern));

      unify_ranges(&mut rule.pattern)?;
      log::trace!("ranges:   {}", opcode::decoded_string(&rule.pattern));

      desugar(&mut rule.pattern)?;
      log::trace!("desugar:  {}", opcode::decoded_string(&rule.pattern));

      insert_concats(&mut rule.pattern);
      log::trace!("concats:  {}", opcode::decoded_string(&rule.pattern));

      make_rpn(&mut rule.pattern)?;
      log::trace!("postfix:  {}", opcode::decoded_string(&rule.pattern));

      Ok(())
    }
  }
}


/// Preprocesses a whole rule set, attributing the first failure to its rule.
pub fn preprocess_all(rules: &mut [Rule]) -> Result<(), CompileError> {
  for (rule_no, rule) in rules.iter_mut().enumerate() {
    preprocess(rule).map_err(|error| CompileError::Syntax { rule: rule_no, error })?;
  }
  Ok(())
}


/**
  Pass 1: remap operator characters to their out-of-band bytes. A `\`
  escapes the following byte, which is emitted as a literal with its
  encoding skipped. Running this pass over already-encoded input is a no-op,
  since encoded bytes are not surface operator characters.
*/
fn encode(pattern: &mut Vec<u8>) -> Result<(), SyntaxError> {
  let mut out = Vec::with_capacity(pattern.len());

  let mut i = 0;
  while i < pattern.len() {
    let c = pattern[i];
    if c == b'\\' {
      i += 1;
      if i >= pattern.len() {
        return Err(SyntaxError::TrailingEscape((i - 1) as Index32));
      }
      out.push(pattern[i]);
    } else {
      match Op::from_surface(c) {
        Some(op) => out.push(op.encoded()),
        None => out.push(c),
      }
    }
    i += 1;
  }

  *pattern = out;
  Ok(())
}


fn find_byte(pattern: &[u8], wanted: u8, from: usize) -> Option<usize> {
  pattern[from.min(pattern.len())..]
    .iter()
    .position(|&b| b == wanted)
    .map(|offset| from + offset)
}


/**
  Pass 2: desugar character classes.

  Each `[` ... `]` body is parsed as a sequence of atoms, where an atom is a
  single byte or a closed range `a-b`. Members are decoded, so operator
  characters are literal inside a class. A leading `^` selects Σ minus the
  members instead. The class is replaced by a parenthesised union of the
  selected bytes in ascending order.
*/
fn unify_ranges(pattern: &mut Vec<u8>) -> Result<(), SyntaxError> {
  let lbracket = Op::LBracket.encoded();
  let rbracket = Op::RBracket.encoded();

  let mut out: Vec<u8> = Vec::with_capacity(pattern.len());
  let mut end = 0usize;

  loop {
    let start = find_byte(pattern, lbracket, end);

    // Everything before the class opens passes through.
    out.extend_from_slice(&pattern[end..start.unwrap_or(pattern.len())]);

    let close = find_byte(pattern, rbracket, start.unwrap_or(end));
    let (start, close) = match (start, close) {
      (None, Some(r)) => return Err(SyntaxError::UnmatchedRBracket(r as Index32)),
      (None, None) => break,
      (Some(l), None) => return Err(SyntaxError::UnmatchedLBracket(l as Index32)),
      (Some(l), Some(r)) => (l, r),
    };

    let mut body_start = start + 1;
    let inverted = pattern.get(body_start) == Some(&Op::Invert.encoded());
    if inverted {
      body_start += 1;
    }
    if body_start >= close {
      return Err(SyntaxError::EmptyClass(start as Index32));
    }

    let body = &pattern[body_start..close];
    let mut members = ByteSet::new();

    let mut i = 0;
    while i < body.len() {
      if i + 2 < body.len() && body[i + 1] == Op::RangeMid.encoded() {
        let lo = opcode::decode(body[i]);
        let hi = opcode::decode(body[i + 2]);
        if !ALPHABET.contains(lo) || !ALPHABET.contains(hi) {
          return Err(SyntaxError::RangeOutsideAlphabet((body_start + i) as Index32));
        }
        if lo > hi {
          return Err(SyntaxError::InvalidRange((body_start + i) as Index32));
        }
        members.insert_range(lo, hi);
        i += 3;
      } else {
        members.insert(opcode::decode(body[i]));
        i += 1;
      }
    }

    let selected = match inverted {
      true  => ALPHABET - members,
      false => members,
    };

    out.push(Op::LParen.encoded());
    for (n, member) in selected.iter().enumerate() {
      if n > 0 {
        out.push(Op::Union.encoded());
      }
      out.push(member);
    }
    out.push(Op::RParen.encoded());

    end = close + 1;
  }

  *pattern = out;
  Ok(())
}


/**
  Finds the start of the operand unit ending at the tail of `out`: the unit
  is a single literal byte or a balanced paren group, together with any
  quantifiers already applied to it.
*/
fn operand_start(out: &[u8], err_idx: Index32) -> Result<usize, SyntaxError> {
  let mut i = out.len();
  while i > 0 && kind_of(out[i - 1]) == CharKind::UnaryOp {
    i -= 1;
  }
  if i == 0 {
    return Err(SyntaxError::MissingOperand(err_idx));
  }

  if out[i - 1] == Op::RParen.encoded() {
    let mut depth = 0usize;
    while i > 0 {
      i -= 1;
      if out[i] == Op::RParen.encoded() {
        depth += 1;
      } else if out[i] == Op::LParen.encoded() {
        depth -= 1;
        if depth == 0 {
          return Ok(i);
        }
      }
    }
    Err(SyntaxError::MismatchedParens(err_idx))
  } else if kind_of(out[i - 1]) == CharKind::Literal {
    Ok(i - 1)
  } else {
    Err(SyntaxError::MissingOperand(err_idx))
  }
}


/**
  Pass 3: rewrite the `+` and `?` sugar in terms of the core operators.
  `X+` becomes `X X *` by duplicating the operand span; `X?` becomes
  `( X | ε )`, unioning with the epsilon literal byte. The rewrite works on
  the output buffer, so nested sugar composes left to right.
*/
fn desugar(pattern: &mut Vec<u8>) -> Result<(), SyntaxError> {
  let plus = Op::Plus.encoded();
  let question = Op::Question.encoded();
  if !pattern.iter().any(|&b| b == plus || b == question) {
    return Ok(());
  }

  let mut out: Vec<u8> = Vec::with_capacity(pattern.len() * 2);
  for (i, &c) in pattern.iter().enumerate() {
    if c == plus {
      let start = operand_start(&out, i as Index32)?;
      let span = out[start..].to_vec();
      out.extend_from_slice(&span);
      out.push(Op::Star.encoded());
    } else if c == question {
      let start = operand_start(&out, i as Index32)?;
      out.insert(start, Op::LParen.encoded());
      out.push(Op::Union.encoded());
      out.push(EPSILON.0);
      out.push(Op::RParen.encoded());
    } else {
      out.push(c);
    }
  }

  *pattern = out;
  Ok(())
}


/// Pass 4: insert an explicit concat operator between every adjacent pair
/// (x, y) where x ends an operand and y begins one.
fn insert_concats(pattern: &mut Vec<u8>) {
  if pattern.is_empty() {
    return;
  }

  let mut out = Vec::with_capacity(pattern.len() * 2);
  out.push(pattern[0]);
  for i in 1..pattern.len() {
    let left = kind_of(pattern[i - 1]);
    let right = kind_of(pattern[i]);
    if matches!(left, CharKind::Literal | CharKind::UnaryOp | CharKind::RParen)
      && matches!(right, CharKind::Literal | CharKind::LParen)
    {
      out.push(Op::Concat.encoded());
    }
    out.push(pattern[i]);
  }

  *pattern = out;
}


/**
  Pass 5: classical shunting-yard conversion to postfix. Precedence is
  union < concat < star, binary operators are left-associative, and the
  operand/operator protocol is enforced as the stream is consumed.
*/
fn make_rpn(pattern: &mut Vec<u8>) -> Result<(), SyntaxError> {
  let mut expect_operand = true;
  let mut op_stack: Vec<Op> = Vec::new();
  let mut out = Vec::with_capacity(pattern.len());

  for (i, &c) in pattern.iter().enumerate() {
    let idx = i as Index32;
    match Op::from_encoded(c) {
      None => {
        if !expect_operand {
          return Err(SyntaxError::MissingOperator(idx));
        }
        out.push(c);
        expect_operand = false;
      }

      Some(Op::LParen) => {
        op_stack.push(Op::LParen);
        expect_operand = true;
      }

      Some(Op::RParen) => {
        if expect_operand {
          return Err(SyntaxError::MissingOperand(idx));
        }
        loop {
          match op_stack.pop() {
            None => return Err(SyntaxError::MismatchedParens(idx)),
            Some(Op::LParen) => break,
            Some(op) => out.push(op.encoded()),
          }
        }
        expect_operand = false;
      }

      Some(op) if op.kind() == CharKind::RangeOp => {
        return Err(SyntaxError::StrayRangeOperator(idx));
      }

      Some(op) => {
        if expect_operand {
          return Err(SyntaxError::MissingOperand(idx));
        }
        while let Some(&top) = op_stack.last() {
          let pops = top != Op::LParen
            && (top.priority() > op.priority()
              || (top.priority() == op.priority() && op.is_binary()));
          if !pops {
            break;
          }
          op_stack.pop();
          out.push(top.encoded());
        }
        op_stack.push(op);
        expect_operand = op.is_binary();
      }
    }
  }

  if expect_operand {
    return Err(SyntaxError::MissingOperand(pattern.len() as Index32));
  }

  while let Some(op) = op_stack.pop() {
    if op == Op::LParen {
      return Err(SyntaxError::MismatchedParens(pattern.len() as Index32));
    }
    out.push(op.encoded());
  }

  *pattern = out;
  Ok(())
}


#[cfg(test)]
mod test {
  use super::*;

  fn encoded(surface: &str) -> Vec<u8> {
    let mut pattern = surface.as_bytes().to_vec();
    encode(&mut pattern).unwrap();
    pattern
  }

  fn postfix(surface: &str) -> Vec<u8> {
    let mut rule = Rule::regex(surface);
    preprocess(&mut rule).unwrap();
    rule.pattern
  }

  fn postfix_err(surface: &str) -> SyntaxError {
    let mut rule = Rule::regex(surface);
    preprocess(&mut rule).unwrap_err()
  }

  #[test]
  fn encode_moves_operators_out_of_band() {
    assert_eq!(encoded("a|b"), vec![b'a', 0x01, b'b']);
    assert_eq!(encoded("(ab)*"), vec![0x06, b'a', b'b', 0x07, 0x03]);
  }

  #[test]
  fn encode_escapes_force_literals() {
    assert_eq!(encoded(r"\|"), vec![b'|']);
    assert_eq!(encoded(r"a\*b"), vec![b'a', b'*', b'b']);
  }

  #[test]
  fn encode_rejects_trailing_escape() {
    let mut pattern = br"ab\".to_vec();
    assert_eq!(encode(&mut pattern), Err(SyntaxError::TrailingEscape(2)));
  }

  #[test]
  fn encode_is_idempotent() {
    let mut pattern = b"a|b*[x-z]".to_vec();
    encode(&mut pattern).unwrap();
    let once = pattern.clone();
    encode(&mut pattern).unwrap();
    assert_eq!(pattern, once);
  }

  #[test]
  fn ranges_expand_to_unions() {
    let mut pattern = encoded("[a-c]");
    unify_ranges(&mut pattern).unwrap();
    assert_eq!(pattern, vec![0x06, b'a', 0x01, b'b', 0x01, b'c', 0x07]);
  }

  #[test]
  fn ranges_decode_operator_members() {
    // Operator characters are literal members inside a class.
    let mut pattern = encoded("[|(]");
    unify_ranges(&mut pattern).unwrap();
    assert_eq!(pattern, vec![0x06, b'(', 0x01, b'|', 0x07]);
  }

  #[test]
  fn inverted_ranges_select_the_complement() {
    let mut pattern = encoded("[^0-9]");
    unify_ranges(&mut pattern).unwrap();
    // ( tab | newline | ... ) with every digit absent
    assert_eq!(pattern[0], 0x06);
    assert_eq!(*pattern.last().unwrap(), 0x07);
    assert!(!pattern.contains(&b'5'));
    assert!(pattern.contains(&b'a'));
    assert!(pattern.contains(&b'\t'));
    // 97 alphabet members minus 10 digits, union-separated
    assert_eq!(pattern.len(), 2 + 87 * 2 - 1);
  }

  #[test]
  fn range_errors() {
    assert_eq!(postfix_err("[abc"), SyntaxError::UnmatchedLBracket(0));
    assert_eq!(postfix_err("abc]"), SyntaxError::UnmatchedRBracket(3));
    assert_eq!(postfix_err("a[]"), SyntaxError::EmptyClass(1));
    assert_eq!(postfix_err("[^]"), SyntaxError::EmptyClass(0));
    assert_eq!(postfix_err("[z-a]"), SyntaxError::InvalidRange(1));
  }

  #[test]
  fn trailing_dash_is_a_literal_member() {
    let mut pattern = encoded("[a-]");
    unify_ranges(&mut pattern).unwrap();
    assert_eq!(pattern, vec![0x06, b'-', 0x01, b'a', 0x07]);
  }

  #[test]
  fn plus_duplicates_its_operand() {
    let mut pattern = encoded("a+");
    desugar(&mut pattern).unwrap();
    assert_eq!(pattern, vec![b'a', b'a', 0x03]);

    let mut pattern = encoded("(ab)+");
    desugar(&mut pattern).unwrap();
    assert_eq!(
      pattern,
      vec![0x06, b'a', b'b', 0x07, 0x06, b'a', b'b', 0x07, 0x03]
    );
  }

  #[test]
  fn question_unions_with_epsilon() {
    let mut pattern = encoded("a?");
    desugar(&mut pattern).unwrap();
    assert_eq!(pattern, vec![0x06, b'a', 0x01, 0x00, 0x07]);
  }

  #[test]
  fn nested_sugar_composes() {
    // (a+)?: the inner rewrite happens first, then the outer wraps it.
    let mut pattern = encoded("(a+)?");
    desugar(&mut pattern).unwrap();
    assert_eq!(
      pattern,
      vec![0x06, 0x06, b'a', b'a', 0x03, 0x07, 0x01, 0x00, 0x07]
    );
  }

  #[test]
  fn sugar_with_no_operand_fails() {
    assert_eq!(postfix_err("+a"), SyntaxError::MissingOperand(0));
    assert_eq!(postfix_err("?"), SyntaxError::MissingOperand(0));
  }

  #[test]
  fn concat_insertion() {
    let mut pattern = encoded("ab");
    insert_concats(&mut pattern);
    assert_eq!(pattern, vec![b'a', 0x02, b'b']);

    let mut pattern = encoded("a*b");
    insert_concats(&mut pattern);
    assert_eq!(pattern, vec![b'a', 0x03, 0x02, b'b']);

    let mut pattern = encoded("(a)(b)");
    insert_concats(&mut pattern);
    assert_eq!(pattern, vec![0x06, b'a', 0x07, 0x02, 0x06, b'b', 0x07]);
  }

  #[test]
  fn rpn_orders_by_precedence() {
    // a|bc => a b c . |
    assert_eq!(postfix("a|bc"), vec![b'a', b'b', b'c', 0x02, 0x01]);
    // ab* => a b * .
    assert_eq!(postfix("ab*"), vec![b'a', b'b', 0x03, 0x02]);
    // (a|b)c => a b | c .
    assert_eq!(postfix("(a|b)c"), vec![b'a', b'b', 0x01, b'c', 0x02]);
  }

  #[test]
  fn rpn_binary_operators_are_left_associative() {
    // a|b|c => a b | c |
    assert_eq!(postfix("a|b|c"), vec![b'a', b'b', 0x01, b'c', 0x01]);
  }

  #[test]
  fn rpn_errors() {
    assert_eq!(postfix_err("(a"), SyntaxError::MismatchedParens(2));
    assert_eq!(postfix_err("a)"), SyntaxError::MismatchedParens(1));
    assert_eq!(postfix_err("a|"), SyntaxError::MissingOperand(2));
    assert_eq!(postfix_err("a||b"), SyntaxError::MissingOperand(2));
    assert_eq!(postfix_err("*a"), SyntaxError::MissingOperand(0));
    assert_eq!(postfix_err("a-b"), SyntaxError::StrayRangeOperator(1));
  }

  #[test]
  fn empty_regex_is_rejected() {
    assert_eq!(postfix_err(""), SyntaxError::EmptyPattern);
  }

  #[test]
  fn string_rules_pass_through() {
    let mut rule = Rule::string("a|b");
    preprocess(&mut rule).unwrap();
    assert_eq!(rule.pattern, b"a|b");
  }

  #[test]
  fn signal_rules_come_out_empty() {
    let mut rule = Rule::none();
    rule.pattern = b"ignored".to_vec();
    preprocess(&mut rule).unwrap();
    assert!(rule.pattern.is_empty());
  }

  #[test]
  fn preprocess_all_attributes_the_failing_rule() {
    let mut rules = vec![Rule::regex("ab"), Rule::regex("[")];
    let err = preprocess_all(&mut rules).unwrap_err();
    assert_eq!(
      err,
      CompileError::Syntax { rule: 1, error: SyntaxError::UnmatchedLBracket(0) }
    );
  }
}
