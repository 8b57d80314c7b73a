//! Scalar summaries over normalized values.

use crate::models::Summary;

/// Summarize a collection of normalized values.
///
/// Absent and non-finite entries are dropped first. Returns `None` when nothing is
/// left; a summary is never zero-filled.
pub fn summarize<I>(values: I) -> Option<Summary>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut kept: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();

    if kept.is_empty() {
        return None;
    }

    kept.sort_by(f64::total_cmp);

    let n = kept.len();
    let median_nm = if n % 2 == 1 {
        kept[n / 2]
    } else {
        (kept[n / 2 - 1] + kept[n / 2]) / 2.0
    };

    Some(Summary {
        n,
        median_nm,
        min_nm: kept[0],
        max_nm: kept[n - 1],
    })
}

impl Summary {
    /// Fold another source's values into this summary.
    ///
    /// The existing summary contributes only its median, min and max as three
    /// representative values; the result is re-summarized over those plus the
    /// new values. This is not a pooled recomputation and `n` reflects the
    /// representative count, not the union of underlying measurements.
    pub fn merge_with<I>(&self, values: I) -> Summary
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let representatives = [Some(self.median_nm), Some(self.min_nm), Some(self.max_nm)];

        summarize(representatives.into_iter().chain(values)).unwrap_or(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(Vec::<Option<f64>>::new()), None);
        assert_eq!(summarize(vec![None, None]), None);
        assert_eq!(summarize(vec![Some(f64::NAN), None]), None);
    }

    #[test]
    fn test_summarize_odd() {
        let s = summarize(vec![Some(25.0), Some(5.0), Some(15.0)]).unwrap();
        assert_eq!(s.n, 3);
        assert_eq!(s.median_nm, 15.0);
        assert_eq!(s.min_nm, 5.0);
        assert_eq!(s.max_nm, 25.0);
    }

    #[test]
    fn test_summarize_even_averages_middle() {
        let s = summarize(vec![Some(1.0), Some(4.0), Some(2.0), Some(10.0)]).unwrap();
        assert_eq!(s.n, 4);
        assert_eq!(s.median_nm, 3.0);
    }

    #[test]
    fn test_summarize_skips_absent_and_nan() {
        let s = summarize(vec![None, Some(8.0), Some(f64::NAN), Some(2.0)]).unwrap();
        assert_eq!(s.n, 2);
        assert_eq!(s.median_nm, 5.0);
    }

    #[test]
    fn test_summarize_skips_infinite() {
        let s = summarize(vec![Some(f64::INFINITY), Some(6.0), Some(f64::NEG_INFINITY)]).unwrap();
        assert_eq!(s.n, 1);
        assert_eq!(s.max_nm, 6.0);
        assert_eq!(summarize(vec![Some(f64::INFINITY)]), None);
    }

    #[test]
    fn test_merge_uses_representative_scalars() {
        let chembl = summarize(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)])
            .unwrap();
        assert_eq!(chembl.n, 5);

        let merged = chembl.merge_with(vec![Some(50.0), None]);

        // {median 3, min 1, max 100} + {50}
        assert_eq!(merged.n, 4);
        assert_eq!(merged.min_nm, 1.0);
        assert_eq!(merged.max_nm, 100.0);
        assert_eq!(merged.median_nm, 26.5);
    }

    #[test]
    fn test_merge_with_nothing_new() {
        let s = summarize(vec![Some(10.0), Some(20.0)]).unwrap();
        let merged = s.merge_with(Vec::<Option<f64>>::new());
        assert_eq!(merged.n, 3);
        assert_eq!(merged.median_nm, 15.0);
    }

    proptest! {
        #[test]
        fn summary_is_ordered(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..50)) {
            let s = summarize(values.iter().copied().map(Some)).unwrap();
            prop_assert_eq!(s.n, values.len());
            prop_assert!(s.min_nm <= s.median_nm);
            prop_assert!(s.median_nm <= s.max_nm);
        }
    }
}
