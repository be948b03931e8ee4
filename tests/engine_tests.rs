use chrono::{TimeZone, Utc};
use nudge::kernel::engine::generate_suggestions;
use nudge::kernel::signal::{Difficulty, Emotion, EmotionReading, LearningContext};
use nudge::kernel::suggestion::{Cause, Priority, SuggestionKind};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap()
}

fn reading(emotion: Emotion) -> EmotionReading {
    EmotionReading::new(emotion, 0.85, now())
}

fn context(lesson: &str, time_spent: u32, difficulty: Difficulty) -> LearningContext {
    let mut ctx = LearningContext::new("Advanced Mathematics", lesson, difficulty, now());
    ctx.time_spent = time_spent;
    ctx
}

#[test]
fn test_totality_over_all_inputs() {
    for emotion in Emotion::ALL {
        for difficulty in Difficulty::ALL {
            for minutes in [0, 45, 46, 60, 61] {
                let out = generate_suggestions(&reading(emotion), &context("Limits", minutes, difficulty), now());
                // At most one emotion candidate plus two context candidates
                assert!(out.len() <= 3, "{emotion:?}/{difficulty:?}/{minutes}: {out:?}");
                for pair in out.windows(2) {
                    assert!(pair[0].priority.rank() >= pair[1].priority.rank(), "Output must be sorted");
                }
            }
        }
    }
}

#[test]
fn test_frustrated_end_to_end() {
    let out = generate_suggestions(
        &reading(Emotion::Frustrated),
        &context("Derivatives", 10, Difficulty::Medium),
        now(),
    );

    assert_eq!(out.len(), 1);
    let s = &out[0];
    assert_eq!(s.kind, SuggestionKind::Suggestion);
    assert_eq!(s.priority, Priority::High);
    assert!(s.message.contains("Derivatives"));
    assert_eq!(s.timestamp, now());
    assert!(s.id.starts_with("frustration-"));
}

#[test]
fn test_focused_threshold() {
    let at_45 = generate_suggestions(&reading(Emotion::Focused), &context("Limits", 45, Difficulty::Medium), now());
    assert!(at_45.iter().all(|s| s.cause != Cause::DeepFocus), "45 minutes must not trigger");
    assert!(at_45.is_empty());

    let at_46 = generate_suggestions(&reading(Emotion::Focused), &context("Limits", 46, Difficulty::Medium), now());
    assert_eq!(at_46.len(), 1);
    assert_eq!(at_46[0].cause, Cause::DeepFocus);
    assert_eq!(at_46[0].priority, Priority::Low);
    assert!(at_46[0].message.contains("Limits"));
}

#[test]
fn test_emotion_mapping() {
    let ctx = context("Integrals", 30, Difficulty::Easy);
    let cases = [
        (Emotion::Frustrated, SuggestionKind::Suggestion, Priority::High),
        (Emotion::Bored, SuggestionKind::Suggestion, Priority::Medium),
        (Emotion::Confused, SuggestionKind::Question, Priority::High),
        (Emotion::Tired, SuggestionKind::Break, Priority::Medium),
        (Emotion::Engaged, SuggestionKind::Encouragement, Priority::Low),
    ];

    for (emotion, kind, priority) in cases {
        let out = generate_suggestions(&reading(emotion), &ctx, now());
        assert_eq!(out.len(), 1, "{emotion:?}");
        assert_eq!(out[0].kind, kind, "{emotion:?}");
        assert_eq!(out[0].priority, priority, "{emotion:?}");
    }

    let tired = generate_suggestions(&reading(Emotion::Tired), &ctx, now());
    assert!(tired[0].message.contains("30 minutes"));
    assert!(tired[0].message.contains("5-minute break"));
}

#[test]
fn test_context_triggers() {
    let long = generate_suggestions(&reading(Emotion::Focused), &context("Limits", 60, Difficulty::Medium), now());
    let causes: Vec<Cause> = long.iter().map(|s| s.cause).collect();
    assert_eq!(causes, vec![Cause::DeepFocus], "60 minutes is not over an hour");

    let out = generate_suggestions(&reading(Emotion::Focused), &context("Limits", 61, Difficulty::Hard), now());
    let causes: Vec<Cause> = out.iter().map(|s| s.cause).collect();
    assert_eq!(causes, vec![Cause::LongSession, Cause::HardTopic, Cause::DeepFocus]);
}

#[test]
fn test_ordering_is_stable() {
    // One high plus two mediums
    let out = generate_suggestions(&reading(Emotion::Confused), &context("Limits", 61, Difficulty::Hard), now());
    let causes: Vec<Cause> = out.iter().map(|s| s.cause).collect();
    assert_eq!(causes, vec![Cause::Confusion, Cause::LongSession, Cause::HardTopic]);

    // Three mediums keep production order: emotion first, then session, then difficulty
    let out = generate_suggestions(&reading(Emotion::Tired), &context("Limits", 61, Difficulty::Hard), now());
    let causes: Vec<Cause> = out.iter().map(|s| s.cause).collect();
    assert_eq!(causes, vec![Cause::Fatigue, Cause::LongSession, Cause::HardTopic]);

    // A low emotion candidate sinks below the context mediums
    let out = generate_suggestions(&reading(Emotion::Engaged), &context("Limits", 61, Difficulty::Medium), now());
    let causes: Vec<Cause> = out.iter().map(|s| s.cause).collect();
    assert_eq!(causes, vec![Cause::LongSession, Cause::Engagement]);
}

#[test]
fn test_ids_unique_within_same_millisecond() {
    let ctx = context("Limits", 61, Difficulty::Hard);
    let a = generate_suggestions(&reading(Emotion::Bored), &ctx, now());
    let b = generate_suggestions(&reading(Emotion::Bored), &ctx, now());

    let mut ids: Vec<&str> = a.iter().chain(b.iter()).map(|s| s.id.as_str()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total, "Every generated id must be unique");
}
