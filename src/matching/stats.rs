use crate::model::{MatchRecord, MatchReport, Statistics};

/// Confidence above which a record counts as fully matched.
pub const MATCHED_CONFIDENCE: f64 = 0.5;

pub fn compute_statistics(records: &[MatchRecord]) -> Statistics {
    let mut statistics = Statistics {
        total_entities: records.len(),
        ..Statistics::default()
    };

    for record in records {
        if record.confidence > MATCHED_CONFIDENCE {
            statistics.matched += 1;
        } else if record.confidence > 0.0 {
            statistics.partial_matched += 1;
        } else {
            statistics.unmatched += 1;
        }

        *statistics
            .strategies_used
            .entry(record.match_strategy.as_str().to_string())
            .or_insert(0) += 1;
    }

    statistics
}

pub fn build_report(records: Vec<MatchRecord>) -> MatchReport {
    let statistics = compute_statistics(&records);
    MatchReport {
        matched_entities: records,
        statistics,
    }
}
