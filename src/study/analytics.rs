// src/study/analytics.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{activity::Activity, exam_record::ExamRecord};

const STREAK_WINDOW_DAYS: i64 = 30;
const CONSISTENCY_WINDOW_DAYS: i64 = 7;
const TREND_WINDOW: usize = 10;
const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject: String,
    pub average: f64,
    pub exams: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMetrics {
    pub streak_days: u32,
    /// Share of the last 7 days (today included) with any activity, in 0..=1.
    pub consistency: f64,
    pub activities_this_week: usize,
    pub total_activities: usize,
    pub exams_taken: usize,
    pub average_score: Option<f64>,
    pub trend: Trend,
    pub weakest_subject: Option<SubjectAverage>,
    pub advice: Vec<String>,
}

/// Aggregates the activity log and exam history as of `now`.
pub fn analyze<'a, I>(activity: I, history: &[ExamRecord], now: DateTime<Utc>) -> StudyMetrics
where
    I: IntoIterator<Item = &'a Activity>,
{
    let days: Vec<NaiveDate> = activity
        .into_iter()
        .map(|a| a.timestamp.date_naive())
        .collect();
    let today = now.date_naive();

    let streak_days = streak(&days, today);
    let active_this_week = (0..CONSISTENCY_WINDOW_DAYS)
        .filter(|&offset| days.contains(&(today - Duration::days(offset))))
        .count();
    let consistency = active_this_week as f64 / CONSISTENCY_WINDOW_DAYS as f64;

    let week_start = today - Duration::days(CONSISTENCY_WINDOW_DAYS - 1);
    let activities_this_week = days
        .iter()
        .filter(|&&d| d >= week_start && d <= today)
        .count();

    let average_score = mean(history.iter().map(|r| r.score as f64));
    let trend = trend(history);
    let weakest_subject = weakest_subject(history);

    let mut metrics = StudyMetrics {
        streak_days,
        consistency,
        activities_this_week,
        total_activities: days.len(),
        exams_taken: history.len(),
        average_score,
        trend,
        weakest_subject,
        advice: Vec::new(),
    };
    metrics.advice = advice(&metrics);
    metrics
}

/// Consecutive active days counted backwards from `today`.
///
/// An empty `today` does not break the streak; any other empty day does.
pub fn streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut count = 0;
    for offset in 0..STREAK_WINDOW_DAYS {
        let day = today - Duration::days(offset);
        if days.contains(&day) {
            count += 1;
        } else if offset > 0 {
            break;
        }
    }
    count
}

/// Compares the two halves of the most recent exams by completion time.
pub fn trend(history: &[ExamRecord]) -> Trend {
    let mut sorted: Vec<&ExamRecord> = history.iter().collect();
    sorted.sort_by_key(|r| r.completed_at);
    let recent = &sorted[sorted.len().saturating_sub(TREND_WINDOW)..];

    if recent.len() < 2 {
        return Trend::Stable;
    }

    let (first, second) = recent.split_at(recent.len() / 2);
    let first = mean(first.iter().map(|r| r.score as f64)).unwrap_or_default();
    let second = mean(second.iter().map(|r| r.score as f64)).unwrap_or_default();

    if second - first > TREND_THRESHOLD {
        Trend::Improving
    } else if first - second > TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Subject with the lowest mean `score`; the first subject seen wins ties.
pub fn weakest_subject(history: &[ExamRecord]) -> Option<SubjectAverage> {
    let mut subjects: Vec<(String, f64, usize)> = Vec::new();
    for record in history {
        match subjects.iter_mut().find(|(s, _, _)| *s == record.subject) {
            Some((_, total, n)) => {
                *total += record.score as f64;
                *n += 1;
            }
            None => subjects.push((record.subject.clone(), record.score as f64, 1)),
        }
    }

    subjects
        .into_iter()
        .map(|(subject, total, exams)| SubjectAverage {
            subject,
            average: total / exams as f64,
            exams,
        })
        .fold(None, |lowest: Option<SubjectAverage>, candidate| match lowest {
            Some(current) if current.average <= candidate.average => Some(current),
            _ => Some(candidate),
        })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Templated study advice for the dashboard.
pub fn advice(metrics: &StudyMetrics) -> Vec<String> {
    let mut out = Vec::new();

    match metrics.streak_days {
        0 => out.push("Start a study streak today: even ten minutes of review counts.".to_string()),
        1..=2 => out.push(format!(
            "You're on a {}-day streak. Study again tomorrow to keep it going!",
            metrics.streak_days
        )),
        n => out.push(format!("Impressive {}-day streak! Consistency is paying off.", n)),
    }

    if metrics.consistency < 0.5 {
        out.push("Try to study on at least four days each week; short regular sessions beat cramming.".to_string());
    }

    match metrics.trend {
        Trend::Improving => out.push("Your exam scores are improving. Keep using the same study routine.".to_string()),
        Trend::Declining => out.push("Your recent exam scores have dipped. Revisit your flashcards before the next exam.".to_string()),
        Trend::Stable => {}
    }

    if let Some(weakest) = &metrics.weakest_subject {
        if weakest.average < 70.0 {
            out.push(format!(
                "Focus on {}: your average there is {:.0}%.",
                weakest.subject, weakest.average
            ));
        }
    }

    if metrics.exams_taken == 0 {
        out.push("Create a mock exam to test what you've learned so far.".to_string());
    }

    out
}

/// Dashboard to-do items derived from the metrics and collection sizes.
pub fn todo_list(metrics: &StudyMetrics, flashcard_count: usize, exam_count: usize) -> Vec<String> {
    let mut items = Vec::new();

    if let Some(weakest) = &metrics.weakest_subject {
        items.push(format!(
            "Review {} (average {:.0}%)",
            weakest.subject, weakest.average
        ));
    }
    if flashcard_count == 0 {
        items.push("Create flashcards from your latest notes".to_string());
    } else {
        items.push(format!("Review your {} flashcard(s)", flashcard_count));
    }
    if metrics.consistency < 0.5 || metrics.streak_days == 0 {
        items.push("Schedule a short study session today".to_string());
    }
    if exam_count == 0 {
        items.push("Create a mock exam to test yourself".to_string());
    } else if metrics.exams_taken == 0 {
        items.push("Take one of your mock exams".to_string());
    }

    items
}
