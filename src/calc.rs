//! Derived-marks arithmetic shared by the API layer and the tests.
//!
//! Nothing here is stored: totals, averages, and letter grades are always
//! recomputed from the raw per-subject scores.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreState {
    /// No mark has ever been recorded for the subject.
    Absent,
    /// A recorded mark. A recorded 0 counts toward the average denominator.
    Recorded(f64),
}

impl From<Option<f64>> for ScoreState {
    fn from(v: Option<f64>) -> Self {
        match v {
            None => ScoreState::Absent,
            Some(x) => ScoreState::Recorded(x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarksSummary {
    pub total: f64,
    pub average: f64,
    pub recorded_count: usize,
}

pub fn marks_summary<I>(scores: I) -> MarksSummary
where
    I: IntoIterator<Item = ScoreState>,
{
    let mut total: f64 = 0.0;
    let mut recorded_count: usize = 0;

    for s in scores {
        if let ScoreState::Recorded(v) = s {
            total += v;
            recorded_count += 1;
        }
    }

    let average = if recorded_count > 0 {
        total / (recorded_count as f64)
    } else {
        0.0
    };

    MarksSummary {
        total,
        average,
        recorded_count,
    }
}

/// Letter grade for an average. `"-"` when no score has been recorded at
/// all; a recorded average of 0 is a real (failing) result.
pub fn letter_grade(average: f64, recorded_count: usize) -> &'static str {
    if recorded_count == 0 {
        return "-";
    }
    if average >= 90.0 {
        "A+"
    } else if average >= 80.0 {
        "A"
    } else if average >= 70.0 {
        "B"
    } else if average >= 60.0 {
        "C"
    } else if average >= 50.0 {
        "D"
    } else {
        "F"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_of(scores: [Option<f64>; 3]) -> MarksSummary {
        marks_summary(scores.into_iter().map(ScoreState::from))
    }

    #[test]
    fn average_skips_absent_scores() {
        let s = summary_of([Some(80.0), Some(90.0), None]);
        assert_eq!(s.total, 170.0);
        assert_eq!(s.average, 85.0);
        assert_eq!(s.recorded_count, 2);
    }

    #[test]
    fn no_recorded_scores_average_is_zero() {
        let s = summary_of([None, None, None]);
        assert_eq!(s.total, 0.0);
        assert_eq!(s.average, 0.0);
        assert_eq!(s.recorded_count, 0);
    }

    #[test]
    fn recorded_zero_counts_in_denominator() {
        // A recorded 0 drags the average down; it is not "no mark".
        let s = summary_of([Some(0.0), Some(100.0), None]);
        assert_eq!(s.recorded_count, 2);
        assert_eq!(s.average, 50.0);
    }

    #[test]
    fn letter_grade_boundaries() {
        assert_eq!(letter_grade(90.0, 3), "A+");
        assert_eq!(letter_grade(89.99, 3), "A");
        assert_eq!(letter_grade(80.0, 3), "A");
        assert_eq!(letter_grade(75.0, 2), "B");
        assert_eq!(letter_grade(60.0, 1), "C");
        assert_eq!(letter_grade(50.0, 1), "D");
        assert_eq!(letter_grade(49.9, 1), "F");
        assert_eq!(letter_grade(0.0, 1), "F");
        assert_eq!(letter_grade(0.0, 0), "-");
    }
}
