// src/study/analyzer.rs

//! Post-grading analysis of an exam attempt: difficulty and topic
//! classification, weak topics, suggestions and per-question feedback.

use std::cmp::Ordering;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::models::{exam::ExamDefinition, question::Question};

use super::session::AnswerMap;

const HARD_KEYWORDS: &[&str] = &[
    "analyze",
    "evaluate",
    "compare",
    "synthesize",
    "complex",
    "advanced",
];
const MEDIUM_KEYWORDS: &[&str] = &["explain", "describe", "apply", "calculate", "determine"];

pub const GENERAL_TOPIC: &str = "General Knowledge";

/// Topic table. Order matters: the first matching topic wins.
pub const TOPICS: &[(&str, &[&str])] = &[
    (
        "Mathematics",
        &[
            "math", "equation", "algebra", "geometry", "calculate", "solve", "number", "fraction",
            "percent", "formula", "integer",
        ],
    ),
    (
        "Science",
        &[
            "science", "biology", "chemistry", "physics", "cell", "atom", "energy", "force",
            "experiment", "photosynthesis", "molecule",
        ],
    ),
    (
        "History",
        &[
            "history", "war", "century", "ancient", "revolution", "empire", "colonial",
            "apartheid", "president", "treaty",
        ],
    ),
    (
        "Language",
        &[
            "grammar", "language", "sentence", "verb", "noun", "poem", "literature", "essay",
            "vocabulary", "novel",
        ],
    ),
    (
        "Geography",
        &[
            "geography", "map", "country", "continent", "river", "climate", "capital",
            "mountain", "ocean", "population",
        ],
    ),
];

/// Feedback list stops taking positive reinforcement once it holds this many items.
pub const FEEDBACK_CAP: usize = 8;

/// Maximum number of suggestions returned.
pub const SUGGESTION_CAP: usize = 4;

pub const MATH_EXPLANATIONS: [&str; 3] = [
    "The correct answer is \"{answer}\". Work through the calculation one step at a time and check each operation.",
    "The correct answer is \"{answer}\". Write down the formula first, then substitute the values carefully.",
    "The correct answer is \"{answer}\". Estimate the result before solving so you can spot an unlikely answer.",
];

pub const SCIENCE_EXPLANATIONS: [&str; 3] = [
    "The correct answer is \"{answer}\". Revisit the underlying process and how each part depends on the others.",
    "The correct answer is \"{answer}\". Link the concept to an everyday example to make it stick.",
    "The correct answer is \"{answer}\". Review the key definitions for this topic in your notes.",
];

pub const GENERAL_EXPLANATIONS: [&str; 3] = [
    "The correct answer is \"{answer}\". Re-read the question and look for the keywords that point to it.",
    "The correct answer is \"{answer}\". Turn this question into a flashcard and review it tomorrow.",
    "The correct answer is \"{answer}\". Eliminate the options you know are wrong before choosing.",
];

pub const REINFORCEMENTS: [&str; 5] = [
    "Great job! You nailed this one.",
    "Correct! Your understanding of this concept is solid.",
    "Well done! Keep up the consistent work.",
    "Spot on! This topic is clearly a strength.",
    "Excellent! You applied the concept correctly.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Explanation family used for an incorrect answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationCategory {
    Math,
    Science,
    General,
}

impl ExplanationCategory {
    fn for_topic(topic: &str) -> Self {
        match topic {
            "Mathematics" => ExplanationCategory::Math,
            "Science" => ExplanationCategory::Science,
            _ => ExplanationCategory::General,
        }
    }

    pub fn templates(self) -> &'static [&'static str; 3] {
        match self {
            ExplanationCategory::Math => &MATH_EXPLANATIONS,
            ExplanationCategory::Science => &SCIENCE_EXPLANATIONS,
            ExplanationCategory::General => &GENERAL_EXPLANATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub correct: usize,
    pub total: usize,
    /// `correct / total`, or 0 for an empty bucket.
    pub accuracy: f64,
}

impl Bucket {
    fn empty() -> Self {
        Self {
            correct: 0,
            total: 0,
            accuracy: 0.0,
        }
    }

    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.accuracy = self.correct as f64 / self.total as f64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPerformance {
    pub topic: String,
    #[serde(flatten)]
    pub bucket: Bucket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyBreakdown {
    pub easy: Bucket,
    pub medium: Bucket,
    pub hard: Bucket,
}

impl DifficultyBreakdown {
    fn bucket_mut(&mut self, difficulty: Difficulty) -> &mut Bucket {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub index: usize,
    pub correct: bool,
    pub user_answer: Option<usize>,
    pub correct_answer: usize,
    pub difficulty: Difficulty,
    pub topic: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub score: u32,
    pub grade: Grade,
    pub correct_count: usize,
    pub total_questions: usize,
    /// Topics that occur in the exam, in table order.
    pub topics: Vec<TopicPerformance>,
    /// Up to three topics, lowest accuracy first.
    pub weak_topics: Vec<TopicPerformance>,
    pub difficulty: DifficultyBreakdown,
    pub suggestions: Vec<String>,
    pub feedback: Vec<QuestionFeedback>,
}

pub fn classify_difficulty(text: &str) -> Difficulty {
    let lower = text.to_lowercase();
    if HARD_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Difficulty::Hard
    } else if MEDIUM_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

pub fn classify_topic(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    TOPICS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
        .unwrap_or(GENERAL_TOPIC)
}

/// Analyzes a graded attempt. `rng` only picks cosmetic message templates.
pub fn analyze<R: Rng + ?Sized>(
    exam: &ExamDefinition,
    answers: &AnswerMap,
    score: u32,
    rng: &mut R,
) -> Analysis {
    // Table order plus the default topic, so ties resolve by table position.
    let mut topic_buckets: Vec<(&'static str, Bucket)> = TOPICS
        .iter()
        .map(|(topic, _)| (*topic, Bucket::empty()))
        .chain(std::iter::once((GENERAL_TOPIC, Bucket::empty())))
        .collect();
    let mut difficulty = DifficultyBreakdown {
        easy: Bucket::empty(),
        medium: Bucket::empty(),
        hard: Bucket::empty(),
    };
    let mut feedback = Vec::new();
    let mut correct_count = 0;

    for (index, question) in exam.questions.iter().enumerate() {
        let user_answer = answers.get(&index).copied();
        let correct = user_answer == Some(question.correct_index);
        let level = classify_difficulty(&question.text);
        let topic = classify_topic(&question.text);

        if correct {
            correct_count += 1;
        }
        difficulty.bucket_mut(level).record(correct);
        if let Some((_, bucket)) = topic_buckets.iter_mut().find(|(t, _)| *t == topic) {
            bucket.record(correct);
        }

        let message = if correct {
            if feedback.len() >= FEEDBACK_CAP {
                continue;
            }
            pick(&REINFORCEMENTS, rng).to_string()
        } else {
            explain(question, ExplanationCategory::for_topic(topic), rng)
        };

        feedback.push(QuestionFeedback {
            index,
            correct,
            user_answer,
            correct_answer: question.correct_index,
            difficulty: level,
            topic,
            message,
        });
    }

    let topics: Vec<TopicPerformance> = topic_buckets
        .into_iter()
        .filter(|(_, bucket)| bucket.total > 0)
        .map(|(topic, bucket)| TopicPerformance {
            topic: topic.to_string(),
            bucket,
        })
        .collect();

    // Weak means below the attempt's overall accuracy.
    let overall = correct_count as f64 / exam.question_count().max(1) as f64;
    let mut weak_topics: Vec<TopicPerformance> = topics
        .iter()
        .filter(|t| t.bucket.accuracy < overall)
        .cloned()
        .collect();
    // Stable sort keeps table order for equal accuracy.
    weak_topics.sort_by(|a, b| {
        a.bucket
            .accuracy
            .partial_cmp(&b.bucket.accuracy)
            .unwrap_or(Ordering::Equal)
    });
    weak_topics.truncate(3);

    let incorrect = exam.question_count() - correct_count;
    let suggestions = suggestions(score, &difficulty, &weak_topics, incorrect);

    Analysis {
        score,
        grade: Grade::from_score(score),
        correct_count,
        total_questions: exam.question_count(),
        topics,
        weak_topics,
        difficulty,
        suggestions,
        feedback,
    }
}

/// Rules are checked top to bottom; the first `SUGGESTION_CAP` that fire are kept.
fn suggestions(
    score: u32,
    difficulty: &DifficultyBreakdown,
    weak_topics: &[TopicPerformance],
    incorrect: usize,
) -> Vec<String> {
    let mut out = Vec::new();

    if score < 50 {
        out.push("Go back to the fundamentals: re-read your notes and review your flashcards before the next attempt.".to_string());
    } else if score < 70 {
        out.push("Review the questions you missed and retake this exam to reinforce the material.".to_string());
    } else if score < 90 {
        out.push("Good work! Target the remaining gaps to push your score above 90%.".to_string());
    } else {
        out.push("Excellent result! Try a harder exam to keep challenging yourself.".to_string());
    }

    let (easy, medium, hard) = (&difficulty.easy, &difficulty.medium, &difficulty.hard);
    if hard.total > 0 && medium.total > 0 && hard.accuracy > medium.accuracy {
        out.push("You handle complex questions well but slip on medium ones; slow down and read each question carefully.".to_string());
    }
    if hard.total > 0 && hard.accuracy < 0.5 {
        out.push("Break complex questions into smaller steps before choosing an answer.".to_string());
    }
    if easy.total > 0 && easy.accuracy < 1.0 {
        out.push("Double-check the easier questions; small mistakes are costing you marks.".to_string());
    }
    if let Some(weakest) = weak_topics.first() {
        out.push(format!("Spend extra study time on {}.", weakest.topic));
    }
    if incorrect > 0 {
        out.push("Create flashcards for the questions you got wrong.".to_string());
    }

    out.truncate(SUGGESTION_CAP);
    out
}

fn explain<R: Rng + ?Sized>(
    question: &Question,
    category: ExplanationCategory,
    rng: &mut R,
) -> String {
    pick(category.templates(), rng).replace("{answer}", question.correct_option())
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionDraft;
    use crate::study::authoring::create_exam;
    use crate::study::session::{grade, percentage};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(questions: &[(&str, usize)]) -> ExamDefinition {
        let drafts: Vec<QuestionDraft> = questions
            .iter()
            .map(|(text, c)| QuestionDraft::new(text, ["w", "x", "y", "z"], *c))
            .collect();
        create_exam("Mixed", "General", &drafts, Utc::now()).unwrap()
    }

    fn answers(choices: &[usize]) -> AnswerMap {
        choices.iter().copied().enumerate().collect()
    }

    #[test]
    fn test_grade_boundaries() {
        let cases = [
            (100, Grade::A),
            (90, Grade::A),
            (89, Grade::B),
            (80, Grade::B),
            (79, Grade::C),
            (70, Grade::C),
            (69, Grade::D),
            (60, Grade::D),
            (59, Grade::F),
            (0, Grade::F),
        ];
        for (score, expected) in cases {
            assert_eq!(Grade::from_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_classify_difficulty_precedence() {
        assert_eq!(classify_difficulty("Analyze and explain the result"), Difficulty::Hard);
        assert_eq!(classify_difficulty("Explain why the sky is blue"), Difficulty::Medium);
        assert_eq!(classify_difficulty("Calculate 3 x 4"), Difficulty::Medium);
        assert_eq!(classify_difficulty("Name the largest planet"), Difficulty::Easy);
    }

    #[test]
    fn test_classify_topic_first_match_wins() {
        assert_eq!(classify_topic("Solve the equation for x"), "Mathematics");
        assert_eq!(classify_topic("Which cell organelle makes energy?"), "Science");
        // Mentions both maths and geography keywords; maths comes first.
        assert_eq!(classify_topic("Calculate the population growth of the country"), "Mathematics");
        assert_eq!(classify_topic("Which river is the longest?"), "Geography");
        assert_eq!(classify_topic("Who painted the Mona Lisa?"), GENERAL_TOPIC);
    }

    #[test]
    fn test_example_attempt_grades_c() {
        let exam = build(&[("Q one", 2), ("Q two", 1), ("Q three", 2), ("Q four", 1)]);
        let choices = answers(&[2, 1, 0, 1]);
        let result = grade(&exam, &choices, Utc::now());
        let mut rng = StdRng::seed_from_u64(7);

        let analysis = analyze(&exam, &choices, result.score, &mut rng);
        assert_eq!(analysis.correct_count, 3);
        assert_eq!(analysis.score, 75);
        assert_eq!(analysis.grade, Grade::C);
        assert_eq!(analysis.grade.to_string(), "C");
    }

    #[test]
    fn test_weak_topics_sorted_ascending_and_capped() {
        let exam = build(&[
            ("Solve this equation", 0),
            ("Solve another equation", 0),
            ("Which cell divides?", 0),
            ("Which war ended in 1945?", 0),
            ("Which river flows north?", 0),
            ("Which verb is irregular?", 0),
        ]);
        // Maths 1/2, Science 0/1, History 1/1, Geography 0/1, Language 0/1.
        let choices = answers(&[0, 1, 1, 0, 1, 1]);
        let mut rng = StdRng::seed_from_u64(1);

        let analysis = analyze(&exam, &choices, 33, &mut rng);
        let names: Vec<&str> = analysis.weak_topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["Science", "Language", "Geography"]);
        assert!(analysis.weak_topics.len() <= 3);
        assert!(
            analysis
                .weak_topics
                .windows(2)
                .all(|w| w[0].bucket.accuracy <= w[1].bucket.accuracy)
        );
    }

    #[test]
    fn test_perfect_attempt_has_no_weak_topics() {
        let exam = build(&[
            ("Solve this equation", 0),
            ("Which cell divides?", 1),
            ("Which war ended in 1945?", 2),
        ]);
        let choices = answers(&[0, 1, 2]);
        let mut rng = StdRng::seed_from_u64(9);

        let analysis = analyze(&exam, &choices, 100, &mut rng);
        assert_eq!(analysis.topics.len(), 3);
        assert!(analysis.weak_topics.is_empty());
    }

    #[test]
    fn test_weak_topics_only_below_overall_accuracy() {
        let exam = build(&[
            ("Solve this equation", 0),
            ("Solve another equation", 0),
            ("Which cell divides?", 0),
            ("Which war ended in 1945?", 0),
        ]);
        // Overall 3/4. Maths 2/2, Science 0/1, History 1/1.
        let choices = answers(&[0, 0, 1, 0]);
        let mut rng = StdRng::seed_from_u64(4);

        let analysis = analyze(&exam, &choices, 75, &mut rng);
        let names: Vec<&str> = analysis.weak_topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["Science"]);
    }

    #[test]
    fn test_empty_difficulty_bucket_has_zero_accuracy() {
        let exam = build(&[("Name a planet", 0)]);
        let mut rng = StdRng::seed_from_u64(3);
        let analysis = analyze(&exam, &answers(&[0]), 100, &mut rng);

        assert_eq!(analysis.difficulty.easy.accuracy, 1.0);
        assert_eq!(analysis.difficulty.hard.total, 0);
        assert_eq!(analysis.difficulty.hard.accuracy, 0.0);
        assert_eq!(analysis.difficulty.medium.accuracy, 0.0);
    }

    #[test]
    fn test_hard_beating_medium_flags_suggestion() {
        let exam = build(&[
            ("Analyze the poem", 0),
            ("Describe the setting", 0),
            ("Describe the ending", 0),
        ]);
        let mut rng = StdRng::seed_from_u64(5);
        let choices = answers(&[0, 1, 1]);
        let analysis = analyze(&exam, &choices, percentage(1, 3), &mut rng);

        assert!(analysis.suggestions.len() <= SUGGESTION_CAP);
        assert!(
            analysis
                .suggestions
                .iter()
                .any(|s| s.contains("slip on medium ones"))
        );
        assert!(analysis.suggestions[0].contains("fundamentals"));
    }

    #[test]
    fn test_feedback_messages_come_from_template_sets() {
        let exam = build(&[
            ("Solve the equation 2x = 4", 1),
            ("Which atom is lightest?", 0),
            ("Who wrote Hamlet?", 3),
            ("Name a prime number", 2),
        ]);
        let choices = answers(&[0, 1, 2, 2]);
        let mut rng = StdRng::seed_from_u64(11);
        let analysis = analyze(&exam, &choices, 25, &mut rng);

        let correctness: Vec<bool> = analysis.feedback.iter().map(|f| f.correct).collect();
        assert_eq!(correctness, vec![false, false, false, true]);

        let rendered = |set: &[&str; 3], answer: &str| -> Vec<String> {
            set.iter().map(|t| t.replace("{answer}", answer)).collect()
        };
        assert!(rendered(&MATH_EXPLANATIONS, "x").contains(&analysis.feedback[0].message));
        assert!(rendered(&SCIENCE_EXPLANATIONS, "w").contains(&analysis.feedback[1].message));
        assert!(rendered(&GENERAL_EXPLANATIONS, "z").contains(&analysis.feedback[2].message));
        assert!(REINFORCEMENTS.contains(&analysis.feedback[3].message.as_str()));
    }

    #[test]
    fn test_reinforcement_stops_at_feedback_cap() {
        let questions: Vec<(String, usize)> = (0..12).map(|i| (format!("Item {}", i), 0)).collect();
        let refs: Vec<(&str, usize)> = questions.iter().map(|(q, c)| (q.as_str(), *c)).collect();
        let exam = build(&refs);
        // Last question wrong, everything else right.
        let mut choices = answers(&[0; 12]);
        choices.insert(11, 3);
        let mut rng = StdRng::seed_from_u64(2);

        let analysis = analyze(&exam, &choices, percentage(11, 12), &mut rng);
        let positives = analysis.feedback.iter().filter(|f| f.correct).count();
        assert_eq!(positives, FEEDBACK_CAP);
        assert_eq!(analysis.feedback.last().map(|f| f.index), Some(11));
        assert!(!analysis.feedback.last().unwrap().correct);
    }
}
