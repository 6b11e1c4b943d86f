//! Overload resolution for one call site.
//!
//! Candidates are tried in stored order; the first one that accepts every
//! argument and the argument count wins. When none does, the caller reports
//! the mismatch list of the candidate with the fewest mismatches (the earlier
//! candidate on ties).

use crate::typesys::is_assignable;
use crate::types::{Function, TypeInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// An actual typed `unknown` matches any parameter.
    pub allow_unknown_actuals: bool,
}

/// Mismatches of `func` against the actual argument types. Empty means match.
pub fn mismatches(func: &Function, actuals: &[TypeInfo], options: ResolveOptions) -> Vec<String> {
    let mut details = Vec::new();

    for (i, actual) in actuals.iter().enumerate() {
        let Some(expected) = func.params.get(i) else {
            details.push(format!("Argument {}: unexpected", i + 1));
            continue;
        };

        // Unanalyzed expressions are typed `any` and fit everywhere.
        if actual.is_any() || (actual.is_null() && expected.optional) {
            continue;
        }
        if options.allow_unknown_actuals && actual.name == "unknown" {
            continue;
        }
        if !is_assignable(actual, &expected.ty) {
            details.push(format!(
                "Argument {} ('{}'): expected {}, got {}",
                i + 1,
                expected.name,
                expected.ty,
                actual
            ));
        }
    }

    let required = func.required_count();
    let total = func.params.len();
    if actuals.len() < required || actuals.len() > total {
        details.push(format!(
            "Incorrect number of arguments: expected {required}-{total}, got {}",
            actuals.len()
        ));
    }

    details
}

/// `Ok` when some candidate matches, otherwise the best candidate's mismatches.
pub fn resolve<'f>(
    candidates: impl IntoIterator<Item = &'f Function>,
    actuals: &[TypeInfo],
    options: ResolveOptions,
) -> Result<(), Vec<String>> {
    let mut best: Option<Vec<String>> = None;
    for func in candidates {
        let details = mismatches(func, actuals, options);
        if details.is_empty() {
            return Ok(());
        }
        if best.as_ref().map_or(true, |b| details.len() < b.len()) {
            best = Some(details);
        }
    }
    Err(best.unwrap_or_default())
}
