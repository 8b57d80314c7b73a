//! Measurement aggregation and cross-source merging.
//!
//! This module groups normalized measurements by affinity type, builds
//! per-source summary maps and folds several sources into one combined map.

use super::numfmt::sig3;
use super::stats::summarize;
use super::units::normalize;
use crate::models::{AffinityType, Measurement, Source, SummaryMap};
use std::collections::BTreeMap;
use tracing::debug;

/// Group normalized values by affinity type, keeping absent entries.
pub fn group_by_type(measurements: &[Measurement]) -> BTreeMap<AffinityType, Vec<Option<f64>>> {
    let mut grouped: BTreeMap<AffinityType, Vec<Option<f64>>> = BTreeMap::new();

    for m in measurements {
        grouped
            .entry(m.affinity_type)
            .or_default()
            .push(normalize(m));
    }

    grouped
}

/// Summarize one source's measurements per affinity type.
///
/// Types whose values are all unparseable are left out of the map.
pub fn summarize_by_type(measurements: &[Measurement]) -> SummaryMap {
    group_by_type(measurements)
        .into_iter()
        .filter_map(|(t, values)| summarize(values).map(|s| (t, s)))
        .collect()
}

/// Fold one source's values for a type into a running summaries map.
///
/// Nothing happens when the new values summarize to nothing. Otherwise the
/// type is inserted, or merged by [`crate::models::Summary::merge_with`] if
/// an earlier source already produced it.
pub fn fold_into(summaries: &mut SummaryMap, affinity_type: AffinityType, values: &[Option<f64>]) {
    let Some(fresh) = summarize(values.iter().copied()) else {
        return;
    };

    let merged = match summaries.get(&affinity_type) {
        Some(existing) => existing.merge_with(values.iter().copied()),
        None => fresh,
    };

    summaries.insert(affinity_type, merged);
}

/// Build the combined summaries map across sources.
///
/// Sources are folded in the order given; only those listed in `include`
/// take part.
pub fn combine_sources(groups: &[(Source, &[Measurement])], include: &[Source]) -> SummaryMap {
    let mut summaries = SummaryMap::new();

    for (source, measurements) in groups {
        if !include.contains(source) {
            debug!("Skipping {} in combined summary", source);
            continue;
        }

        for (affinity_type, values) in group_by_type(measurements) {
            fold_into(&mut summaries, affinity_type, &values);
        }
    }

    summaries
}

/// Count measurements per affinity type.
pub fn type_distribution(measurements: &[Measurement]) -> BTreeMap<AffinityType, usize> {
    let mut dist: BTreeMap<AffinityType, usize> = BTreeMap::new();

    for m in measurements {
        *dist.entry(m.affinity_type).or_default() += 1;
    }

    dist
}

/// One-line console digest of a summaries map.
pub fn generate_summary_text(summaries: &SummaryMap) -> String {
    if summaries.is_empty() {
        return "No quantitative values parsed (try other names/SMILES or check UniProt mapping)."
            .to_string();
    }

    summaries
        .iter()
        .map(|(t, s)| {
            format!(
                "{}: n={} med={} best={} nM",
                t,
                s.n,
                sig3(s.median_nm),
                sig3(s.min_nm)
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawValue;

    fn create_measurement(source: Source, t: AffinityType, value: &str, unit: &str) -> Measurement {
        Measurement::new(
            source,
            t,
            Some(RawValue::Text(value.to_string())),
            Some(unit.to_string()),
        )
    }

    #[test]
    fn test_summarize_by_type() {
        let measurements = vec![
            create_measurement(Source::Chembl, AffinityType::Ki, "5", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ki, "0.5", "uM"),
            create_measurement(Source::Chembl, AffinityType::Ki, "25", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ic50, "NA", "nM"),
        ];

        let summaries = summarize_by_type(&measurements);

        assert_eq!(summaries.len(), 1);
        let ki = summaries[&AffinityType::Ki];
        assert_eq!(ki.n, 3);
        assert_eq!(ki.median_nm, 25.0);
        assert_eq!(ki.min_nm, 5.0);
        assert_eq!(ki.max_nm, 500.0);
    }

    #[test]
    fn test_combine_merges_shared_types() {
        let chembl = vec![
            create_measurement(Source::Chembl, AffinityType::Ic50, "1", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ic50, "3", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ic50, "100", "nM"),
        ];
        let pubchem = vec![
            create_measurement(Source::Pubchem, AffinityType::Ic50, "50", "nM"),
            create_measurement(Source::Pubchem, AffinityType::Ec50, "7", "nM"),
        ];

        let combined = combine_sources(
            &[(Source::Chembl, chembl.as_slice()), (Source::Pubchem, pubchem.as_slice())],
            &[Source::Chembl, Source::Pubchem],
        );

        // {median 3, min 1, max 100} + {50}
        let ic50 = combined[&AffinityType::Ic50];
        assert_eq!(ic50.n, 4);
        assert_eq!(ic50.median_nm, 26.5);
        assert_eq!(combined[&AffinityType::Ec50].n, 1);
    }

    #[test]
    fn test_combine_respects_include_list() {
        let chembl = vec![create_measurement(Source::Chembl, AffinityType::Kd, "2", "nM")];
        let iuphar = vec![create_measurement(Source::Iuphar, AffinityType::Kd, "900", "nM")];

        let combined = combine_sources(
            &[(Source::Chembl, chembl.as_slice()), (Source::Iuphar, iuphar.as_slice())],
            &[Source::Chembl, Source::Pubchem],
        );

        assert_eq!(combined[&AffinityType::Kd].n, 1);
        assert_eq!(combined[&AffinityType::Kd].max_nm, 2.0);
    }

    #[test]
    fn test_fold_ignores_unparseable_source() {
        let mut summaries = SummaryMap::new();
        fold_into(&mut summaries, AffinityType::Ki, &[Some(4.0)]);
        fold_into(&mut summaries, AffinityType::Ki, &[None, Some(f64::NAN)]);

        assert_eq!(summaries[&AffinityType::Ki].n, 1);
    }

    #[test]
    fn test_type_distribution() {
        let measurements = vec![
            create_measurement(Source::Chembl, AffinityType::Ki, "1", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ki, "x", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ec50, "1", "nM"),
        ];

        let dist = type_distribution(&measurements);
        assert_eq!(dist.get(&AffinityType::Ki), Some(&2));
        assert_eq!(dist.get(&AffinityType::Ec50), Some(&1));
    }

    #[test]
    fn test_generate_summary_text() {
        let measurements = vec![
            create_measurement(Source::Chembl, AffinityType::Ki, "5000", "nM"),
            create_measurement(Source::Chembl, AffinityType::Ic50, "2", "nM"),
        ];
        let text = generate_summary_text(&summarize_by_type(&measurements));
        assert_eq!(text, "Ki: n=1 med=5e+03 best=5e+03 nM | IC50: n=1 med=2 best=2 nM");

        assert!(generate_summary_text(&SummaryMap::new()).starts_with("No quantitative"));
    }
}
