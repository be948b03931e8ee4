use chrono::{Duration, TimeZone, Utc};
use nudge::kernel::signal::{
    ContextPatch, Difficulty, Emotion, EmotionReading, LearningContext, SignalDelta, SignalStore,
};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
}

fn store() -> SignalStore {
    let mut ctx = LearningContext::new("Advanced Mathematics", "Introduction to Derivatives", Difficulty::Medium, t0());
    ctx.time_spent = 12;
    SignalStore::new(ctx)
}

#[test]
fn test_default_reading_is_resting_focus() {
    let store = store();
    let reading = store.emotion_state();

    assert_eq!(reading.emotion, Emotion::Focused);
    assert!((reading.confidence - 0.8).abs() < f32::EPSILON);
    assert_eq!(reading.observed_at, t0());
    assert_eq!(store.version, 0);
}

#[test]
fn test_context_merge_touches_only_patched_fields() {
    let mut store = store();
    store.update_learning_context(ContextPatch::new().course("X"));

    let ctx = store.learning_context();
    assert_eq!(ctx.current_course, "X");
    assert_eq!(ctx.current_lesson, "Introduction to Derivatives", "Lesson must be untouched");
    assert_eq!(ctx.difficulty, Difficulty::Medium, "Difficulty must be untouched");
    assert_eq!(ctx.time_spent, 12, "time_spent must be untouched");
    assert_eq!(ctx.last_activity, t0());
}

#[test]
fn test_ingest_replaces_reading_wholesale() {
    let mut store = store();
    let first = EmotionReading::new(Emotion::Bored, 0.7, t0() + Duration::seconds(15));
    let second = EmotionReading::new(Emotion::Tired, 0.95, t0() + Duration::seconds(30));

    store.ingest_emotion_reading(first);
    store.ingest_emotion_reading(second.clone());
    assert_eq!(store.emotion_state(), &second);

    // Same reading twice is harmless
    store.ingest_emotion_reading(second.clone());
    assert_eq!(store.emotion_state(), &second);
    assert_eq!(store.version, 3);
}

#[test]
fn test_time_spent_never_rewinds() {
    let mut store = store();
    store.update_learning_context(ContextPatch::new().time_spent(3));
    assert_eq!(store.learning_context().time_spent, 12, "Lower time_spent patch must be ignored");

    store.update_learning_context(ContextPatch::new().time_spent(20).lesson("Chain Rule"));
    assert_eq!(store.learning_context().time_spent, 20);
    assert_eq!(store.learning_context().current_lesson, "Chain Rule");
}

#[test]
fn test_minute_elapsed_accumulates() {
    let mut store = store();
    let at = t0() + Duration::minutes(1);
    store.reduce(SignalDelta::MinuteElapsed { at });
    store.reduce(SignalDelta::MinuteElapsed { at: at + Duration::minutes(1) });

    assert_eq!(store.learning_context().time_spent, 14);
    assert_eq!(store.learning_context().last_activity, at + Duration::minutes(1));
}

#[test]
fn test_closed_enumerations_reject_unknown_values() {
    assert_eq!("frustrated".parse::<Emotion>().unwrap(), Emotion::Frustrated);
    assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);

    let err = "ecstatic".parse::<Emotion>().unwrap_err();
    assert_eq!(err.kind, "emotion");
    assert!("extreme".parse::<Difficulty>().is_err());

    let parsed: Result<EmotionReading, _> = serde_json::from_str(
        r#"{"emotion":"sleepy","confidence":0.7,"observed_at":"2026-01-05T09:00:00Z"}"#,
    );
    assert!(parsed.is_err(), "Deserialization must reject values outside the enumeration");
}

#[test]
fn test_confidence_is_clamped() {
    let reading = EmotionReading::new(Emotion::Engaged, 1.7, t0());
    assert_eq!(reading.confidence, 1.0);
}
