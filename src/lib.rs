/*!

`taglex` compiles an ordered collection of tagged lexer rules into finite
automata suitable for driving a scanner:

 1. each rule's pattern is preprocessed into a flat postfix token stream
    (operators encoded out-of-band, character classes desugared into unions,
    implicit concatenation made explicit);
 2. the streams are folded into a single NFA with one shared start state and
    one tagged accept state per rule;
 3. the NFA is determinized by subset construction over dense bitsets, with
    an explicit dead state;
 4. optionally, the DFA is minimized by partition refinement.

The crate performs no I/O. Renderers and table emitters consume the automata
through the read-only interfaces in [`visit`].

*/

pub mod alphabet;
pub mod builder;
pub mod compiler;
pub mod dfa;
pub mod error;
pub mod flat;
pub mod limits;
pub mod minimize;
pub mod nfa;
pub mod opcode;
pub mod preprocessor;
pub mod rule;
pub mod stateset;
pub mod visit;

pub use alphabet::{Sym, EPSILON};
pub use builder::NfaBuilder;
pub use compiler::{Artifacts, Compiler, Timings};
pub use dfa::Dfa;
pub use error::{CompileError, InvariantError, SyntaxError};
pub use flat::{FlatExpr, Symbol};
pub use limits::{INVALID_STATE, MAX_STATES, NO_CASE_TAG};
pub use minimize::minimize;
pub use nfa::Nfa;
pub use rule::{PatternKind, Rule};
pub use visit::{StateVisitor, Visitable};

// We alias types to enforce size restrictions on their values.
pub type StateId32 = u32; //< Index of a state in an automaton's state vector
pub type CaseId32  = u32; //< Index of a rule (case) in the compiled rule set
pub type Index32   = u32; //< An index into a rule's pattern bytes
