//! Plain-language interpretation of affinity summaries.
//!
//! Picks the primary metric, then derives potency, variability, evidence and
//! practical-take sentences from fixed threshold ladders. Output depends only
//! on the summaries passed in.

use super::numfmt::sig3;
use super::rubric::{classify, PotencyBucket};
use crate::models::{AffinityType, Summary, SummaryMap};
use serde::Serialize;

/// Lower bound applied to `min_nM` when computing the spread ratio.
pub const SPAN_EPSILON: f64 = 1e-12;

/// Spread ladder: first threshold the span reaches wins.
pub const VARIABILITY_LADDER: [(f64, Variability); 3] = [
    (1e5, Variability::FiveOrders),
    (1e3, Variability::ThreeOrders),
    (1e2, Variability::TwoOrders),
];

/// Evidence ladder on measurement count: first threshold reached wins.
pub const EVIDENCE_LADDER: [(usize, EvidenceStrength); 4] = [
    (1000, EvidenceStrength::VeryStrong),
    (200, EvidenceStrength::Strong),
    (50, EvidenceStrength::Moderate),
    (10, EvidenceStrength::Limited),
];

/// Whether sentences describe a single database or a merged aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Source,
    Aggregate,
}

impl Scope {
    fn phrase(&self) -> &'static str {
        match self {
            Scope::Source => "this source",
            Scope::Aggregate => "this aggregate",
        }
    }

    /// Terminal statement when no affinity type is present.
    pub fn no_data_sentence(&self) -> &'static str {
        match self {
            Scope::Source => "No quantitative values parsed for this source; consider alternative names/SMILES or different target identifiers.",
            Scope::Aggregate => "No quantitative values parsed; try other names/SMILES or check UniProt mapping in the FASTA header.",
        }
    }
}

/// How widely the measurements spread, as max/min ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variability {
    FiveOrders,
    ThreeOrders,
    TwoOrders,
    Modest,
}

impl Variability {
    pub fn from_span(span: f64) -> Self {
        VARIABILITY_LADDER
            .iter()
            .find(|(threshold, _)| span >= *threshold)
            .map(|(_, v)| *v)
            .unwrap_or(Variability::Modest)
    }

    pub fn sentence(&self) -> &'static str {
        match self {
            Variability::FiveOrders => "Assay results vary **over ≥5 orders of magnitude**, indicating strong context dependence (assay types, cell systems, readouts).",
            Variability::ThreeOrders => "Assay results vary **over ≥3 orders of magnitude**, suggesting meaningful context or protocol effects.",
            Variability::TwoOrders => "Assay results vary **over ~2 orders of magnitude**, typical across heterogeneous literature assays.",
            Variability::Modest => "Assay spread is **modest**, suggesting reasonably consistent results across experiments.",
        }
    }
}

/// Strength of the evidence base, by measurement count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EvidenceStrength {
    VeryStrong,
    Strong,
    Moderate,
    Limited,
    Sparse,
}

impl EvidenceStrength {
    pub fn from_count(n: usize) -> Self {
        EVIDENCE_LADDER
            .iter()
            .find(|(threshold, _)| n >= *threshold)
            .map(|(_, e)| *e)
            .unwrap_or(EvidenceStrength::Sparse)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvidenceStrength::VeryStrong => "very strong",
            EvidenceStrength::Strong => "strong",
            EvidenceStrength::Moderate => "moderate",
            EvidenceStrength::Limited => "limited",
            EvidenceStrength::Sparse => "sparse",
        }
    }

    pub fn sentence(&self, n: usize) -> String {
        match self {
            EvidenceStrength::VeryStrong => {
                format!("Evidence base is **{}** (n={} measurements).", self.label(), n)
            }
            _ => format!("Evidence base is **{}** (n={}).", self.label(), n),
        }
    }
}

/// Overall practical reading of the median potency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PracticalTake {
    DrugLike,
    ContextDependent,
    Weak,
}

impl PracticalTake {
    pub fn from_bucket(median: PotencyBucket) -> Self {
        match median {
            PotencyBucket::VeryHigh | PotencyBucket::High | PotencyBucket::Strong => {
                PracticalTake::DrugLike
            }
            PotencyBucket::Moderate => PracticalTake::ContextDependent,
            _ => PracticalTake::Weak,
        }
    }

    pub fn sentence(&self, scope: Scope) -> String {
        match self {
            PracticalTake::DrugLike => "Overall activity profile is **compatible with drug-like potency**; multiple assays support pharmacological relevance.".to_string(),
            PracticalTake::ContextDependent => "Overall activity is **moderate**; potency may be context-dependent or require optimization/dose selection.".to_string(),
            PracticalTake::Weak => format!(
                "Overall activity appears **weak** in {}; consider orthogonal evidence or alternative targets/chemotypes.",
                scope.phrase()
            ),
        }
    }
}

/// Interpretation of the primary metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryReading {
    pub metric: AffinityType,
    pub summary: Summary,
    pub median_bucket: PotencyBucket,
    pub best_bucket: PotencyBucket,
    pub span: f64,
    pub variability: Variability,
    pub evidence: EvidenceStrength,
    pub practical: PracticalTake,
    pub potency_sentence: String,
    pub variability_sentence: String,
    pub evidence_sentence: String,
    pub practical_sentence: String,
}

/// Result of synthesizing a summaries map.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    NoData { sentence: String },
    Primary(Box<PrimaryReading>),
}

/// Highest-priority affinity type present.
pub fn primary_metric(summaries: &SummaryMap) -> Option<AffinityType> {
    AffinityType::ALL
        .into_iter()
        .find(|t| summaries.contains_key(t))
}

/// Spread ratio `max / max(min, epsilon)`.
pub fn span(summary: &Summary) -> f64 {
    summary.max_nm / summary.min_nm.max(SPAN_EPSILON)
}

pub fn potency_sentence(summary: &Summary) -> String {
    format!(
        "Median potency is **{}** (median {} nM); best reported case is **{}** (min {} nM).",
        classify(summary.median_nm).sentence_label(),
        sig3(summary.median_nm),
        classify(summary.min_nm).sentence_label(),
        sig3(summary.min_nm),
    )
}

/// Synthesize the interpretation for a summaries map.
pub fn synthesize(summaries: &SummaryMap, scope: Scope) -> Interpretation {
    let (metric, summary) = match primary_metric(summaries)
        .and_then(|metric| summaries.get(&metric).map(|s| (metric, *s)))
    {
        Some(found) => found,
        None => {
            return Interpretation::NoData {
                sentence: scope.no_data_sentence().to_string(),
            }
        }
    };

    let median_bucket = classify(summary.median_nm);
    let best_bucket = classify(summary.min_nm);
    let span = span(&summary);
    let variability = Variability::from_span(span);
    let evidence = EvidenceStrength::from_count(summary.n);
    let practical = PracticalTake::from_bucket(median_bucket);

    Interpretation::Primary(Box::new(PrimaryReading {
        metric,
        summary,
        median_bucket,
        best_bucket,
        span,
        variability,
        evidence,
        practical,
        potency_sentence: potency_sentence(&summary),
        variability_sentence: variability.sentence().to_string(),
        evidence_sentence: evidence.sentence(summary.n),
        practical_sentence: practical.sentence(scope),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary(n: usize, median: f64, min: f64, max: f64) -> Summary {
        Summary {
            n,
            median_nm: median,
            min_nm: min,
            max_nm: max,
        }
    }

    #[test]
    fn test_primary_metric_priority() {
        let mut map = SummaryMap::new();
        assert_eq!(primary_metric(&map), None);

        map.insert(AffinityType::Ec50, summary(1, 1.0, 1.0, 1.0));
        assert_eq!(primary_metric(&map), Some(AffinityType::Ec50));

        map.insert(AffinityType::Ic50, summary(1, 1.0, 1.0, 1.0));
        assert_eq!(primary_metric(&map), Some(AffinityType::Ic50));

        map.insert(AffinityType::Kd, summary(1, 1.0, 1.0, 1.0));
        assert_eq!(primary_metric(&map), Some(AffinityType::Kd));

        map.insert(AffinityType::Ki, summary(1, 1.0, 1.0, 1.0));
        assert_eq!(primary_metric(&map), Some(AffinityType::Ki));
    }

    #[test]
    fn test_no_data_is_terminal() {
        let map = SummaryMap::new();
        match synthesize(&map, Scope::Source) {
            Interpretation::NoData { sentence } => {
                assert!(sentence.starts_with("No quantitative values parsed"));
            }
            other => panic!("expected no-data branch, got {:?}", other),
        }
    }

    #[test]
    fn test_variability_ladder() {
        assert_eq!(Variability::from_span(1e5), Variability::FiveOrders);
        assert_eq!(Variability::from_span(99_999.0), Variability::ThreeOrders);
        assert_eq!(Variability::from_span(1e3), Variability::ThreeOrders);
        assert_eq!(Variability::from_span(100.0), Variability::TwoOrders);
        assert_eq!(Variability::from_span(99.0), Variability::Modest);
        assert_eq!(Variability::from_span(1.0), Variability::Modest);
    }

    #[test]
    fn test_span_guards_zero_minimum() {
        let s = summary(2, 5.0, 0.0, 10.0);
        assert_eq!(span(&s), 10.0 / SPAN_EPSILON);
        assert_eq!(Variability::from_span(span(&s)), Variability::FiveOrders);
    }

    #[test]
    fn test_evidence_ladder() {
        assert_eq!(EvidenceStrength::from_count(1000), EvidenceStrength::VeryStrong);
        assert_eq!(EvidenceStrength::from_count(999), EvidenceStrength::Strong);
        assert_eq!(EvidenceStrength::from_count(200), EvidenceStrength::Strong);
        assert_eq!(EvidenceStrength::from_count(199), EvidenceStrength::Moderate);
        assert_eq!(EvidenceStrength::from_count(50), EvidenceStrength::Moderate);
        assert_eq!(EvidenceStrength::from_count(10), EvidenceStrength::Limited);
        assert_eq!(EvidenceStrength::from_count(9), EvidenceStrength::Sparse);
        assert_eq!(EvidenceStrength::from_count(1), EvidenceStrength::Sparse);
    }

    #[test]
    fn test_evidence_sentence_text() {
        assert_eq!(
            EvidenceStrength::VeryStrong.sentence(1200),
            "Evidence base is **very strong** (n=1200 measurements)."
        );
        assert_eq!(
            EvidenceStrength::Limited.sentence(12),
            "Evidence base is **limited** (n=12)."
        );
    }

    #[test]
    fn test_practical_take_buckets() {
        assert_eq!(PracticalTake::from_bucket(PotencyBucket::VeryHigh), PracticalTake::DrugLike);
        assert_eq!(PracticalTake::from_bucket(PotencyBucket::Strong), PracticalTake::DrugLike);
        assert_eq!(
            PracticalTake::from_bucket(PotencyBucket::Moderate),
            PracticalTake::ContextDependent
        );
        assert_eq!(PracticalTake::from_bucket(PotencyBucket::Weak), PracticalTake::Weak);
        assert_eq!(
            PracticalTake::from_bucket(PotencyBucket::VeryWeakOrNone),
            PracticalTake::Weak
        );
        assert_eq!(PracticalTake::from_bucket(PotencyBucket::Unknown), PracticalTake::Weak);
    }

    #[test]
    fn test_weak_take_mentions_scope() {
        assert!(PracticalTake::Weak.sentence(Scope::Source).contains("in this source"));
        assert!(PracticalTake::Weak
            .sentence(Scope::Aggregate)
            .contains("in this aggregate"));
    }

    #[test]
    fn test_end_to_end_ki_scenario() {
        let mut map = SummaryMap::new();
        map.insert(AffinityType::Ki, summary(12, 50.0, 5.0, 5000.0));
        map.insert(AffinityType::Ic50, summary(400, 2.0, 0.1, 9.0));

        let reading = match synthesize(&map, Scope::Source) {
            Interpretation::Primary(reading) => reading,
            other => panic!("expected primary reading, got {:?}", other),
        };

        assert_eq!(reading.metric, AffinityType::Ki);
        assert_eq!(reading.median_bucket, PotencyBucket::Strong);
        assert_eq!(reading.best_bucket, PotencyBucket::High);
        assert_eq!(reading.span, 1000.0);
        assert_eq!(reading.variability, Variability::ThreeOrders);
        assert_eq!(reading.evidence, EvidenceStrength::Limited);
        assert_eq!(reading.practical, PracticalTake::DrugLike);
        assert_eq!(
            reading.potency_sentence,
            "Median potency is **strong** (median 50 nM); best reported case is **high** (min 5 nM)."
        );
        assert!(reading.variability_sentence.contains("≥3 orders of magnitude"));
        assert!(reading
            .practical_sentence
            .contains("compatible with drug-like potency"));
    }

    proptest! {
        #[test]
        fn synthesis_is_deterministic(
            n in 1usize..5000,
            min in 0.0f64..1.0e6,
            extra in 0.0f64..1.0e6,
        ) {
            let mut map = SummaryMap::new();
            map.insert(AffinityType::Kd, summary(n, min + extra / 2.0, min, min + extra));
            prop_assert_eq!(synthesize(&map, Scope::Aggregate), synthesize(&map, Scope::Aggregate));
        }
    }
}
