//! Lockstep pairing of two ordered sequences.
//!
//! Stored rows and submitted rows are both brought into the same key order
//! and then consumed side by side: the n-th stored row is paired with the
//! n-th submitted row, whatever is left over on either side is a delete or
//! an insert. Rows are correlated by position after sorting, never by a
//! stored identifier, so a client never has to echo row ids back.

use std::cmp::Ordering;

/// One step of a lockstep merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merge<S, T> {
    /// A stored row and the submitted row it is paired with.
    Paired(S, T),
    /// A stored row with no submitted counterpart left.
    StoredOnly(S),
    /// A submitted row with no stored counterpart left.
    SubmittedOnly(T),
}

/// Pair `stored` with `submitted` position by position.
///
/// Both sequences must already be in the same order.
pub fn lockstep<S, T>(
    stored: impl IntoIterator<Item = S>,
    submitted: impl IntoIterator<Item = T>,
) -> Vec<Merge<S, T>> {
    let mut stored = stored.into_iter();
    let mut submitted = submitted.into_iter();
    let mut steps = Vec::new();

    loop {
        match (stored.next(), submitted.next()) {
            (Some(s), Some(t)) => steps.push(Merge::Paired(s, t)),
            (Some(s), None) => steps.push(Merge::StoredOnly(s)),
            (None, Some(t)) => steps.push(Merge::SubmittedOnly(t)),
            (None, None) => break,
        }
    }

    steps
}

/// Sort both sides (stably) with their comparators, then pair them with
/// [`lockstep`].
pub fn lockstep_sorted<S, T, FS, FT>(
    mut stored: Vec<S>,
    mut submitted: Vec<T>,
    compare_stored: FS,
    compare_submitted: FT,
) -> Vec<Merge<S, T>>
where
    FS: FnMut(&S, &S) -> Ordering,
    FT: FnMut(&T, &T) -> Ordering,
{
    stored.sort_by(compare_stored);
    submitted.sort_by(compare_submitted);
    lockstep(stored, submitted)
}
