/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Returns the index of the maximum value in an iterator, or [`None`] if the
/// iterator is empty.
///
/// If the maximum appears several times, this methods returns the position of
/// the first instance.
///
/// # Panics
///
/// If a comparison returns [`None`].
///
/// # Examples
/// ```
/// # use pagerank_rt::utils::argmax;
/// let v = vec![0.1, 0.2, 0.5, 0.2, 0.5];
/// assert_eq!(argmax(&v), Some(2));
/// assert_eq!(argmax(Vec::<f64>::new()), None);
/// ```
pub fn argmax<I: IntoIterator>(iter: I) -> Option<usize>
where
    I::Item: PartialOrd + Copy,
{
    iter.into_iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap())
        .map(|(idx, _)| idx)
}
