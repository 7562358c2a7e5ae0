/*!

  The end-to-end driver: preprocess and build the NFA, determinize, and
  optionally minimize, timing each stage. A rule set either compiles
  cleanly into a full set of artefacts or fails with the first error.

*/

use std::time::Duration;

use quanta::Clock;

use crate::builder::NfaBuilder;
use crate::dfa::Dfa;
use crate::error::CompileError;
use crate::minimize::minimize;
use crate::nfa::Nfa;
use crate::rule::Rule;

/// Wall-clock cost of each pipeline stage.
#[derive(Copy, Clone, Debug, Default)]
pub struct Timings {
  pub nfa      : Duration, //< preprocessing + NFA assembly
  pub dfa      : Duration, //< subset construction
  pub minimize : Duration, //< partition refinement; zero when skipped
}

/// Everything a compilation produces.
#[derive(Clone, Debug)]
pub struct Artifacts {
  pub nfa     : Nfa,
  pub dfa     : Dfa,
  pub min_dfa : Option<Dfa>,
  pub timings : Timings,
}

pub struct Compiler {
  minimize: bool,
}

impl Compiler {

  pub fn new() -> Compiler {
    Compiler { minimize: true }
  }


  /// Toggles the minimisation stage.
  pub fn minimize(mut self, enabled: bool) -> Compiler {
    self.minimize = enabled;
    self
  }


  pub fn compile(&self, rules: Vec<Rule>) -> Result<Artifacts, CompileError> {
    let clock = Clock::new();
    let mut timings = Timings::default();

    let t0 = clock.raw();
    let nfa = NfaBuilder::build(rules)?;
    let t1 = clock.raw();
    timings.nfa = clock.delta(t0, t1);
    log::debug!(
      "nfa: {} states, {} cases in {:?}",
      nfa.states().len(),
      nfa.num_cases(),
      timings.nfa
    );

    let dfa = Dfa::from_nfa(&nfa);
    let t2 = clock.raw();
    timings.dfa = clock.delta(t1, t2);
    log::debug!("dfa: {} states in {:?}", dfa.states().len(), timings.dfa);

    let min_dfa = match self.minimize {
      true => {
        let minimized = minimize(&dfa)?;
        let t3 = clock.raw();
        timings.minimize = clock.delta(t2, t3);
        log::debug!(
          "minimize: {} -> {} states in {:?}",
          dfa.states().len(),
          minimized.states().len(),
          timings.minimize
        );
        Some(minimized)
      }

      false => None,
    };

    Ok(Artifacts { nfa, dfa, min_dfa, timings })
  }

}

impl Default for Compiler {
  fn default() -> Self {
    Compiler::new()
  }
}
