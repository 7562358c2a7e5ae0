/*!

  Constants specifying limits and sentinel values.

*/

use crate::{CaseId32, StateId32};

/// Max number of NFA states a single build may allocate. Exceeding this fails
/// the build with `CompileError::LimitExceeded`.
pub const MAX_STATES: usize = 500_000;

/// Case tag of a state that accepts no rule.
pub const NO_CASE_TAG: CaseId32 = u32::MAX;

/// Unreachable state index, used as a placeholder where no state applies.
pub const INVALID_STATE: StateId32 = u32::MAX;
