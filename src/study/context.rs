// src/study/context.rs

//! The entity store for one profile: notes, flashcards, exams, exam history,
//! activity log and points, with load/save through a `KeyValueStore`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    activity::{Activity, ActivityIcon, ActivityLog},
    exam::ExamDefinition,
    exam_record::{ExamRecord, ExamResult},
    flashcard::{Flashcard, GeneratedCard},
    note::Note,
    question::QuestionDraft,
};
use crate::storage::KeyValueStore;

use super::authoring;
use super::error::{Result, StudyError};
use super::session::ExamSession;

pub const NOTE_POINTS: u64 = 10;
pub const FLASHCARD_POINTS: u64 = 5;
pub const EXAM_CREATED_POINTS: u64 = 25;
pub const POINTS_PER_CORRECT_ANSWER: u64 = 5;

const NOTES_KEY: &str = "notes";
const FLASHCARDS_KEY: &str = "flashcards";
const EXAMS_KEY: &str = "exams";
const HISTORY_KEY: &str = "examHistory";
const ACTIVITY_KEY: &str = "activity";
const SCORE_KEY: &str = "score";

const ALL_KEYS: [&str; 6] = [
    NOTES_KEY,
    FLASHCARDS_KEY,
    EXAMS_KEY,
    HISTORY_KEY,
    ACTIVITY_KEY,
    SCORE_KEY,
];

/// Whose data a context holds. Every persistence key is prefixed with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileScope {
    Guest,
    Profile(String),
}

impl ProfileScope {
    pub fn key(&self, name: &str) -> String {
        match self {
            ProfileScope::Guest => format!("guest:{}", name),
            ProfileScope::Profile(id) => format!("user_{}:{}", id, name),
        }
    }
}

/// Everything a profile owns, as uploaded to the sync server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSnapshot {
    pub notes: Vec<Note>,
    pub flashcards: Vec<Flashcard>,
    pub exams: Vec<ExamDefinition>,
    pub exam_history: Vec<ExamRecord>,
    pub activity: ActivityLog,
    pub score: u64,
}

#[derive(Debug, Clone)]
pub struct StudyContext {
    scope: ProfileScope,
    data: ProfileSnapshot,
}

impl StudyContext {
    pub fn new(scope: ProfileScope) -> Self {
        Self {
            scope,
            data: ProfileSnapshot::default(),
        }
    }

    pub fn from_snapshot(scope: ProfileScope, snapshot: ProfileSnapshot) -> Self {
        Self {
            scope,
            data: snapshot,
        }
    }

    pub fn snapshot(&self) -> &ProfileSnapshot {
        &self.data
    }

    pub fn scope(&self) -> &ProfileScope {
        &self.scope
    }

    /// Reads every collection of `scope`. Missing keys, unreadable values and
    /// store failures all yield an empty collection; failures are logged.
    pub async fn load<S: KeyValueStore + ?Sized>(store: &S, scope: ProfileScope) -> Self {
        let data = ProfileSnapshot {
            notes: read_or_default(store, &scope.key(NOTES_KEY)).await,
            flashcards: read_or_default(store, &scope.key(FLASHCARDS_KEY)).await,
            exams: read_or_default(store, &scope.key(EXAMS_KEY)).await,
            exam_history: read_or_default(store, &scope.key(HISTORY_KEY)).await,
            activity: read_or_default(store, &scope.key(ACTIVITY_KEY)).await,
            score: read_or_default(store, &scope.key(SCORE_KEY)).await,
        };

        tracing::debug!(
            "Loaded {:?}: {} notes, {} flashcards, {} exams",
            scope,
            data.notes.len(),
            data.flashcards.len(),
            data.exams.len()
        );
        Self { scope, data }
    }

    /// Writes every collection. All keys are attempted; the first failure is
    /// returned after the rest have been tried.
    pub async fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<()> {
        let entries = [
            (NOTES_KEY, serde_json::to_value(&self.data.notes)),
            (FLASHCARDS_KEY, serde_json::to_value(&self.data.flashcards)),
            (EXAMS_KEY, serde_json::to_value(&self.data.exams)),
            (HISTORY_KEY, serde_json::to_value(&self.data.exam_history)),
            (ACTIVITY_KEY, serde_json::to_value(&self.data.activity)),
            (SCORE_KEY, serde_json::to_value(self.data.score)),
        ];

        let mut first_error = None;
        for (name, value) in entries {
            let key = self.scope.key(name);
            let outcome = match value {
                Ok(value) => store.set(&key, value).await.map_err(StudyError::from),
                Err(e) => Err(StudyError::Storage(e.to_string())),
            };
            if let Err(e) = outcome {
                tracing::error!("Failed to save {}: {}", key, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Removes every key of this scope from the store and empties the context.
    pub async fn clear<S: KeyValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        for name in ALL_KEYS {
            store.delete(&self.scope.key(name)).await?;
        }
        self.data = ProfileSnapshot::default();
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.data.notes
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.data.flashcards
    }

    pub fn exams(&self) -> &[ExamDefinition] {
        &self.data.exams
    }

    pub fn exam_history(&self) -> &[ExamRecord] {
        &self.data.exam_history
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.data.activity
    }

    pub fn score(&self) -> u64 {
        self.data.score
    }

    pub fn log_activity(&mut self, text: impl Into<String>, icon: ActivityIcon, now: DateTime<Utc>) {
        self.data.activity.push(Activity {
            text: text.into(),
            icon,
            timestamp: now,
        });
    }

    fn award(&mut self, points: u64) {
        self.data.score = self.data.score.saturating_add(points);
    }

    pub fn add_note(&mut self, image_data: String, text: String, now: DateTime<Utc>) -> &Note {
        self.data.notes.push(Note {
            id: Uuid::new_v4(),
            image_data,
            text,
            timestamp: now,
        });
        self.award(NOTE_POINTS);
        self.log_activity("Captured new notes", ActivityIcon::Note, now);
        &self.data.notes[self.data.notes.len() - 1]
    }

    pub fn delete_note(&mut self, id: Uuid) -> Result<()> {
        remove_by(&mut self.data.notes, |n| n.id == id).ok_or(StudyError::not_found("note", id))
    }

    pub fn add_flashcard(
        &mut self,
        front: &str,
        back: &str,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<&Flashcard> {
        let (front, back) = (front.trim(), back.trim());
        if front.is_empty() {
            return Err(StudyError::EmptyField("front"));
        }
        if back.is_empty() {
            return Err(StudyError::EmptyField("back"));
        }

        self.data.flashcards.push(Flashcard {
            id: Uuid::new_v4(),
            front: front.to_string(),
            back: back.to_string(),
            subject: subject_or_default(subject),
            created: now,
            ai_generated: false,
            kind: None,
        });
        self.award(FLASHCARD_POINTS);
        self.log_activity("Created a flashcard", ActivityIcon::Flashcard, now);
        Ok(&self.data.flashcards[self.data.flashcards.len() - 1])
    }

    /// Saves generator output as flashcards. Returns how many were added.
    pub fn add_generated_flashcards(
        &mut self,
        cards: Vec<GeneratedCard>,
        subject: &str,
        now: DateTime<Utc>,
    ) -> usize {
        let subject = subject_or_default(subject);
        let added = cards.len();
        for card in cards {
            self.data.flashcards.push(Flashcard {
                id: Uuid::new_v4(),
                front: card.question,
                back: card.answer,
                subject: subject.clone(),
                created: now,
                ai_generated: true,
                kind: Some(card.kind),
            });
        }

        if added > 0 {
            self.award(FLASHCARD_POINTS * added as u64);
            self.log_activity(
                format!("Generated {} flashcard(s)", added),
                ActivityIcon::Assistant,
                now,
            );
        }
        added
    }

    pub fn delete_flashcard(&mut self, id: Uuid) -> Result<()> {
        remove_by(&mut self.data.flashcards, |c| c.id == id)
            .ok_or(StudyError::not_found("flashcard", id))
    }

    /// Validates and stores a new exam. Nothing is stored when validation fails.
    pub fn create_exam(
        &mut self,
        title: &str,
        subject: &str,
        questions: &[QuestionDraft],
        now: DateTime<Utc>,
    ) -> Result<&ExamDefinition> {
        let exam = authoring::create_exam(title, subject, questions, now)?;
        tracing::info!(
            "Created exam '{}' with {} question(s)",
            exam.title,
            exam.question_count()
        );

        let text = format!("Created exam \"{}\"", exam.title);
        self.data.exams.push(exam);
        self.award(EXAM_CREATED_POINTS);
        self.log_activity(text, ActivityIcon::Exam, now);
        Ok(&self.data.exams[self.data.exams.len() - 1])
    }

    pub fn delete_exam(&mut self, id: Uuid) -> Result<()> {
        remove_by(&mut self.data.exams, |e| e.id == id).ok_or(StudyError::not_found("exam", id))
    }

    pub fn find_exam(&self, id: Uuid) -> Option<&ExamDefinition> {
        self.data.exams.iter().find(|e| e.id == id)
    }

    /// Starts a new attempt at exam `id`.
    pub fn start_exam(&self, id: Uuid, now: DateTime<Utc>) -> Result<ExamSession> {
        let exam = self
            .find_exam(id)
            .cloned()
            .ok_or(StudyError::not_found("exam", id))?;
        let mut session = ExamSession::new(exam);
        session.start(now)?;
        Ok(session)
    }

    /// Appends a graded attempt to the history and awards its points.
    pub fn record_result(&mut self, result: &ExamResult) -> Result<&ExamRecord> {
        let exam = self
            .find_exam(result.exam_id)
            .ok_or(StudyError::not_found("exam", result.exam_id))?;
        let record = ExamRecord::from_result(exam, result);

        let text = format!("Scored {}% on \"{}\"", record.score, record.title);
        self.data.exam_history.push(record);
        self.award(POINTS_PER_CORRECT_ANSWER * result.correct_count as u64);
        self.log_activity(text, ActivityIcon::Result, result.completed_at);
        Ok(&self.data.exam_history[self.data.exam_history.len() - 1])
    }
}

fn subject_or_default(subject: &str) -> String {
    match subject.trim() {
        "" => authoring::DEFAULT_SUBJECT.to_string(),
        s => s.to_string(),
    }
}

fn remove_by<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Option<()> {
    let index = items.iter().position(pred)?;
    items.remove(index);
    Some(())
}

async fn read_or_default<S, T>(store: &S, key: &str) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    match store.get(key).await {
        Ok(Some(value)) => parse_or_default(key, value),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("Failed to read {}, using empty value: {}", key, e);
            T::default()
        }
    }
}

fn parse_or_default<T: DeserializeOwned + Default>(key: &str, value: Value) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed value at {}: {}", key, e);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flashcard::CardKind;
    use crate::storage::{MemoryStore, StorageError};
    use async_trait::async_trait;
    use crate::study::analyzer;
    use crate::study::session::AnswerMap;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> crate::storage::Result<Option<Value>> {
            Err(StorageError::Json(serde_json::from_str::<Value>("{").unwrap_err()))
        }

        async fn set(&self, _key: &str, _value: Value) -> crate::storage::Result<()> {
            Err(StorageError::Json(serde_json::from_str::<Value>("{").unwrap_err()))
        }

        async fn delete(&self, _key: &str) -> crate::storage::Result<()> {
            Ok(())
        }
    }

    fn drafts() -> Vec<QuestionDraft> {
        vec![
            QuestionDraft::new("What is 2 + 2?", ["3", "4", "5", "6"], 1),
            QuestionDraft::new("Which gas do plants absorb?", ["O2", "N2", "CO2", "He"], 2),
        ]
    }

    #[test]
    fn test_scope_keys_are_isolated() {
        assert_eq!(ProfileScope::Guest.key("notes"), "guest:notes");
        assert_eq!(
            ProfileScope::Profile("42".to_string()).key("notes"),
            "user_42:notes"
        );
    }

    #[test]
    fn test_create_exam_awards_points_and_logs() {
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        let now = Utc::now();
        ctx.create_exam("Week 3", "Science", &drafts(), now).unwrap();

        assert_eq!(ctx.exams().len(), 1);
        assert_eq!(ctx.score(), EXAM_CREATED_POINTS);
        assert_eq!(ctx.activity().len(), 1);
    }

    #[test]
    fn test_failed_authoring_commits_nothing() {
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        let mut bad = drafts();
        bad[1].options.truncate(2);

        let err = ctx.create_exam("Week 3", "Science", &bad, Utc::now()).unwrap_err();
        assert_eq!(err, StudyError::IncompleteQuestion { index: 1 });
        assert!(ctx.exams().is_empty());
        assert_eq!(ctx.score(), 0);
        assert!(ctx.activity().is_empty());
    }

    #[test]
    fn test_delete_missing_ids_report_not_found() {
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        let id = Uuid::new_v4();
        assert!(matches!(ctx.delete_note(id), Err(StudyError::NotFound { kind: "note", .. })));
        assert!(matches!(ctx.delete_flashcard(id), Err(StudyError::NotFound { .. })));
        assert!(matches!(ctx.delete_exam(id), Err(StudyError::NotFound { .. })));
        assert!(matches!(ctx.start_exam(id, Utc::now()), Err(StudyError::NotFound { .. })));
    }

    #[test]
    fn test_flashcards_manual_and_generated() {
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        let now = Utc::now();
        assert_eq!(
            ctx.add_flashcard(" ", "back", "Maths", now).unwrap_err(),
            StudyError::EmptyField("front")
        );

        let id = ctx.add_flashcard("Front", "Back", "", now).unwrap().id;
        let added = ctx.add_generated_flashcards(
            vec![GeneratedCard::new("What is X?", "A letter.", CardKind::Definition)],
            "Language",
            now,
        );
        assert_eq!(added, 1);
        assert_eq!(ctx.flashcards()[0].subject, authoring::DEFAULT_SUBJECT);
        assert!(ctx.flashcards()[1].ai_generated);
        assert_eq!(ctx.score(), 2 * FLASHCARD_POINTS);

        ctx.delete_flashcard(id).unwrap();
        assert_eq!(ctx.flashcards().len(), 1);
    }

    #[test]
    fn test_exam_attempt_recorded_in_history() {
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        let now = Utc::now();
        let exam_id = ctx.create_exam("Quick quiz", "Maths", &drafts(), now).unwrap().id;

        let mut session = ctx.start_exam(exam_id, now).unwrap();
        session.select_answer(0, 1).unwrap();
        session.select_answer(1, 0).unwrap();
        let result = session.submit(now, false).unwrap();

        let record = ctx.record_result(&result).unwrap();
        assert_eq!(record.score, 50);
        assert_eq!(record.subject, "Maths");
        assert_eq!(ctx.exam_history().len(), 1);
        assert_eq!(ctx.score(), EXAM_CREATED_POINTS + POINTS_PER_CORRECT_ANSWER);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = MemoryStore::new();
        let scope = ProfileScope::Profile("7".to_string());
        let mut ctx = StudyContext::new(scope.clone());
        let now = Utc::now();
        ctx.add_note("data:image/png;base64,AAAA".to_string(), String::new(), now);
        ctx.create_exam("Quiz", "Maths", &drafts(), now).unwrap();
        ctx.save(&store).await.unwrap();

        let loaded = StudyContext::load(&store, scope).await;
        assert_eq!(loaded.snapshot(), ctx.snapshot());

        // Another profile sees nothing.
        let guest = StudyContext::load(&store, ProfileScope::Guest).await;
        assert!(guest.notes().is_empty());
        assert_eq!(guest.score(), 0);
    }

    #[tokio::test]
    async fn test_load_degrades_on_bad_data() {
        let store = MemoryStore::new();
        store.set("guest:notes", json!({"not": "a list"})).await.unwrap();
        store.set("guest:score", json!(30)).await.unwrap();

        let ctx = StudyContext::load(&store, ProfileScope::Guest).await;
        assert!(ctx.notes().is_empty());
        assert_eq!(ctx.score(), 30);

        let broken = StudyContext::load(&BrokenStore, ProfileScope::Guest).await;
        assert!(broken.exams().is_empty());
    }

    #[tokio::test]
    async fn test_load_drops_exams_with_invalid_answer_index() {
        let store = MemoryStore::new();
        let exam = json!({
            "id": Uuid::new_v4(),
            "title": "Synced quiz",
            "subject": "Maths",
            "questions": [{
                "text": "What is 2 + 2?",
                "options": ["3", "4", "5", "6"],
                "correctIndex": 7
            }],
            "created": Utc::now()
        });
        store.set("guest:exams", json!([exam])).await.unwrap();
        store.set("guest:score", json!(12)).await.unwrap();

        let ctx = StudyContext::load(&store, ProfileScope::Guest).await;
        assert!(ctx.exams().is_empty());
        assert_eq!(ctx.score(), 12);
    }

    #[tokio::test]
    async fn test_loaded_exam_can_be_analyzed() {
        let store = MemoryStore::new();
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        let now = Utc::now();
        let id = ctx.create_exam("Quiz", "Maths", &drafts(), now).unwrap().id;
        ctx.save(&store).await.unwrap();

        let loaded = StudyContext::load(&store, ProfileScope::Guest).await;
        let exam = loaded.find_exam(id).unwrap();
        let answers: AnswerMap = [(0, 0), (1, 2)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(5);
        let analysis = analyzer::analyze(exam, &answers, 50, &mut rng);
        assert_eq!(analysis.correct_count, 1);
        assert!(analysis.feedback[0].message.contains('4'));
    }

    #[tokio::test]
    async fn test_save_reports_store_failure() {
        let ctx = StudyContext::new(ProfileScope::Guest);
        let err = ctx.save(&BrokenStore).await.unwrap_err();
        assert!(matches!(err, StudyError::Storage(_)));
    }

    #[tokio::test]
    async fn test_clear_removes_scope_keys() {
        let store = MemoryStore::new();
        let mut ctx = StudyContext::new(ProfileScope::Guest);
        ctx.add_note("img".to_string(), String::new(), Utc::now());
        ctx.save(&store).await.unwrap();
        assert_eq!(store.len().await, 6);

        ctx.clear(&store).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(ctx.notes().is_empty());
    }
}
