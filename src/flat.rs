/*!

  The flat regex representation: a postorder symbol stream consumable by a
  single left-to-right stack machine, avoiding a recursive AST. Operands
  precede their operators.

*/

use crate::alphabet::Sym;
use crate::error::InvariantError;
use crate::opcode::Op;

/// One symbol of a flattened regex.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Symbol {
  /// A single transition symbol; `Char(EPSILON)` is the empty-string atom.
  Char(Sym),
  /// A non-empty string, the concatenation of its bytes.
  Literal(Vec<u8>),
  /// A closed byte range; when `inverted`, denotes Σ minus the range.
  Charset { lo: u8, hi: u8, inverted: bool },
  Union,
  Concat,
  KleeneStar,
}

impl Symbol {

  /// How many operands the symbol consumes from the fragment stack.
  pub fn arity(&self) -> usize {
    match self {
      Symbol::Union | Symbol::Concat => 2,
      Symbol::KleeneStar => 1,
      _ => 0,
    }
  }

}

/// A flattened regex in postfix order.
pub type FlatExpr = Vec<Symbol>;

/// Decodes a preprocessed (postfix, operator-encoded) pattern into symbols.
/// Only union, concat, and star survive preprocessing; any other operator
/// byte in the stream is a pipeline bug.
pub fn from_postfix(pattern: &[u8]) -> Result<FlatExpr, InvariantError> {
  let mut expr = Vec::with_capacity(pattern.len());
  for &b in pattern {
    let symbol = match Op::from_encoded(b) {
      Some(Op::Union) => Symbol::Union,
      Some(Op::Concat) => Symbol::Concat,
      Some(Op::Star) => Symbol::KleeneStar,
      Some(_) => return Err(InvariantError::UnexpectedOpcode { byte: b }),
      None => Symbol::Char(Sym(b)),
    };
    expr.push(symbol);
  }
  Ok(expr)
}
