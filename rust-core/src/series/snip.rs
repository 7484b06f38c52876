//! Align paired sequences to a common length
//!
//! Writers append timestamps and values from another thread, so two
//! sequences read independently may differ in length by a few elements.
//! Snipping keeps the trailing (most recent) elements of both.

/// Truncate two slices to their common length, keeping the trailing elements
///
/// # Returns
/// Sub-slices of length `min(a.len(), b.len())` ending at the end of each input
pub fn snip<'a, A, B>(a: &'a [A], b: &'a [B]) -> (&'a [A], &'a [B]) {
    let len = a.len().min(b.len());
    (&a[a.len() - len..], &b[b.len() - len..])
}

/// Owned variant of [`snip`]: drains the stale leading elements in place
pub fn snip_vecs<A, B>(mut a: Vec<A>, mut b: Vec<B>) -> (Vec<A>, Vec<B>) {
    let len = a.len().min(b.len());
    a.drain(..a.len() - len);
    b.drain(..b.len() - len);
    (a, b)
}
