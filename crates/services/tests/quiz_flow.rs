use std::fs;
use std::sync::Arc;

use quiz_core::{Question, QuizSettings, SelectionPool};
use services::QuizService;
use storage::sqlite::SqliteStore;
use storage::{InMemoryStore, JsonFileSource, KeyValueStore, StaticSource, StorageError};
use tempfile::tempdir;

const BANK: &str = r#"[
    {"area": "Physics", "text": "Light travels faster than sound", "true": true},
    {"area": "Physics", "text": "Sound travels in a vacuum", "true": false},
    {"area": "History", "text": "Rome was founded in 753 BC", "true": true},
    {"area": "Biology", "text": "Spiders are insects", "true": false}
]"#;

/// Store whose writes always fail; reads find nothing.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }
}

fn bank() -> Vec<Question> {
    vec![
        Question::new("x", "x1", true),
        Question::new("y", "y1", false),
        Question::new("z", "z1", true),
    ]
}

#[test]
fn session_covers_every_question_in_the_chosen_areas() {
    let mut service = QuizService::bootstrap(
        QuizSettings::default(),
        Arc::new(InMemoryStore::new()),
        &StaticSource::new(bank()),
    )
    .unwrap()
    .with_seed(11);

    for _ in 0..200 {
        let selection = service.next_question(&["x", "y"], None).unwrap();
        assert_ne!(selection.question.area(), "z");
        assert_ne!(selection.pool, SelectionPool::Review);
        let answer = selection.question.is_true();
        let outcome = service.answer(&selection.question, answer);
        assert!(outcome.record.correct);
        assert!(outcome.persisted);
    }

    let summary = service.summary();
    assert_eq!(summary.viewed_count, 2);
    assert_eq!(summary.area("z").unwrap().viewed, 0);
    assert_eq!(summary.incorrect_count, 0);
}

#[test]
fn progress_survives_a_new_service_on_the_same_store() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("quiz.db");
    let source = StaticSource::new(bank());

    {
        let store = Arc::new(SqliteStore::open(&db).unwrap());
        let mut service = QuizService::bootstrap(QuizSettings::default(), store, &source)
            .unwrap()
            .with_seed(3);
        service.answer(&Question::new("x", "x1", true), true);
        service.answer(&Question::new("y", "y1", false), true);
    }

    let store = Arc::new(SqliteStore::open(&db).unwrap());
    let service = QuizService::bootstrap(QuizSettings::default(), store, &source).unwrap();

    assert_eq!(service.progress().viewed_count(), 2);
    assert_eq!(service.progress().average_for("x"), Some(1.0));
    assert_eq!(service.progress().average_for("y"), Some(0.0));
    assert!(service.progress().is_flagged("y1"));
    assert!((service.viewed_ratio() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn failed_writes_do_not_interrupt_the_session() {
    let mut service = QuizService::bootstrap(
        QuizSettings::default(),
        Arc::new(ReadOnlyStore),
        &StaticSource::new(bank()),
    )
    .unwrap()
    .with_seed(5);

    let selection = service.next_question(&["x"], None).unwrap();
    let outcome = service.answer(&selection.question, !selection.question.is_true());

    assert!(!outcome.persisted);
    assert!(!outcome.record.correct);
    assert_eq!(service.progress().incorrect_count(), 1);
    assert!(!service.reset());
    assert_eq!(service.progress().viewed_count(), 0);
    assert!(service.clear_cached_questions().is_err());
}

#[test]
fn reset_clears_persisted_progress() {
    let store = InMemoryStore::new();
    let source = StaticSource::new(bank());
    let mut service =
        QuizService::bootstrap(QuizSettings::default(), Arc::new(store.clone()), &source)
            .unwrap()
            .with_seed(9);
    service.answer(&Question::new("z", "z1", true), false);
    assert!(service.reset());

    let restored =
        QuizService::bootstrap(QuizSettings::default(), Arc::new(store), &source).unwrap();
    assert_eq!(restored.progress().viewed_count(), 0);
    assert_eq!(restored.progress().incorrect_count(), 0);
    assert_eq!(restored.progress().average_for("z"), None);
}

#[test]
fn cleared_cache_reloads_bank_from_file() {
    let dir = tempdir().unwrap();
    let bank_path = dir.path().join("bank.json");
    fs::write(&bank_path, BANK).unwrap();
    let store = InMemoryStore::new();

    let service = QuizService::bootstrap(
        QuizSettings::default(),
        Arc::new(store.clone()),
        &JsonFileSource::new(&bank_path),
    )
    .unwrap();
    assert_eq!(service.areas(), ["Physics", "History", "Biology"]);

    // The cached copy wins until it is cleared.
    fs::write(
        &bank_path,
        r#"[{"area": "Chemistry", "text": "Water boils at 100C at sea level", "true": true}]"#,
    )
    .unwrap();
    let cached = QuizService::bootstrap(
        QuizSettings::default(),
        Arc::new(store.clone()),
        &JsonFileSource::new(&bank_path),
    )
    .unwrap();
    assert_eq!(cached.question_count(), 4);

    cached.clear_cached_questions().unwrap();
    let fresh = QuizService::bootstrap(
        QuizSettings::default(),
        Arc::new(store),
        &JsonFileSource::new(&bank_path),
    )
    .unwrap();
    assert_eq!(fresh.areas(), ["Chemistry"]);
}

#[test]
fn flagged_questions_come_back_for_review() {
    let mut service = QuizService::bootstrap(
        QuizSettings::default(),
        Arc::new(InMemoryStore::new()),
        &StaticSource::new(bank()),
    )
    .unwrap()
    .with_seed(21);

    for question in bank() {
        service.answer(&question, !question.is_true());
    }

    let mut reviews = 0;
    for _ in 0..300 {
        let selection = service.next_question(&["x", "y", "z"], Some(3.0)).unwrap();
        if selection.pool == SelectionPool::Review {
            reviews += 1;
        }
    }
    assert!(reviews > 0);
}
