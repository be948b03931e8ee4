use chrono::{TimeZone, Utc};
use nudge::kernel::gate::{passes, FixedGate, RandomSource, RngSource, ScriptedSource};
use nudge::kernel::scheduler::SuppressReason;
use nudge::kernel::suggestion::Priority;
use nudge::kernel::surface::{ClearReason, DeliveryOrigin};
use nudge::kernel::telemetry::event::TelemetryEvent;
use nudge::kernel::telemetry::recorder::TelemetryRecorder;
use nudge::sampler::sample_reading;
use nudge::{responder, CourseCatalog, Difficulty, Emotion, EmotionReading, LearningContext, SuggestionKind};

fn context() -> LearningContext {
    let at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
    LearningContext::new("Computer Science Fundamentals", "Recursion", Difficulty::Hard, at)
}

fn reading(emotion: Emotion) -> EmotionReading {
    EmotionReading::new(emotion, 0.8, Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap())
}

#[test]
fn test_catalog_navigation() {
    let catalog = CourseCatalog::default();

    let patch = catalog.navigate("3");
    assert_eq!(patch.current_course.as_deref(), Some("Physics: From Classical to Quantum"));
    assert_eq!(patch.current_lesson.as_deref(), Some("Current Lesson"));
    assert_eq!(patch.difficulty, Some(Difficulty::Medium));
    assert_eq!(patch.time_spent, None, "Navigation keeps the session clock");

    let unknown = catalog.navigate("nope");
    assert_eq!(unknown.current_course.as_deref(), Some("Unknown Course"));
}

#[test]
fn test_catalog_encouragement() {
    let catalog = CourseCatalog::default();
    let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();

    let mut last = ScriptedSource::new([0.99]);
    assert_eq!(
        catalog.random_encouragement(&mut last),
        Some("Feel free to ask me anything about the material.")
    );

    let suggestion = catalog.encouragement_suggestion(&mut FixedGate::open(), now).unwrap();
    assert_eq!(suggestion.kind, SuggestionKind::Encouragement);
    assert_eq!(suggestion.priority, Priority::Low);
    assert_eq!(suggestion.timestamp, now);
    assert!(suggestion.id.starts_with("click-"));
}

#[test]
fn test_responder_keyword_rules_win() {
    let ctx = context();
    let mut source = FixedGate::open();

    let reply = responder::respond("I'm so CONFUSED", &reading(Emotion::Engaged), &ctx, &mut source);
    assert!(reply.starts_with("I understand you need help with Recursion"));

    let reply = responder::respond("need a break", &reading(Emotion::Focused), &ctx, &mut source);
    assert!(reply.contains("working hard on Computer Science Fundamentals"));

    let reply = responder::respond("this is hard", &reading(Emotion::Focused), &ctx, &mut source);
    assert!(reply.starts_with("Recursion can be challenging!"));

    let reply = responder::respond("give me a quiz", &reading(Emotion::Focused), &ctx, &mut source);
    assert!(reply.contains("quick quiz on Recursion"));
}

#[test]
fn test_responder_emotion_and_generic_fallback() {
    let ctx = context();

    let reply = responder::respond("hmm", &reading(Emotion::Frustrated), &ctx, &mut FixedGate::open());
    assert!(reply.starts_with("I can sense this might be frustrating"));

    let reply = responder::respond("hmm", &reading(Emotion::Engaged), &ctx, &mut FixedGate::open());
    assert!(reply.starts_with("I love your enthusiasm!"));

    let reply = responder::respond("hmm", &reading(Emotion::Bored), &ctx, &mut FixedGate::open());
    assert_eq!(
        reply,
        "That's a great question about Recursion! Let me help you understand this concept better."
    );

    let reply = responder::respond("hmm", &reading(Emotion::Bored), &ctx, &mut FixedGate(0.999));
    assert!(reply.starts_with("I notice you've been focused on this topic"));
}

#[test]
fn test_sample_reading_ranges() {
    let at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();

    let first = sample_reading(&mut ScriptedSource::new([0.0, 0.0]), at);
    assert_eq!(first.emotion, Emotion::ALL[0]);
    assert!((first.confidence - 0.6).abs() < 1e-6);

    let last = sample_reading(&mut ScriptedSource::new([0.999, 0.999]), at);
    assert_eq!(last.emotion, Emotion::ALL[Emotion::ALL.len() - 1]);
    assert!(last.confidence < 1.0);

    let mut rng = RngSource::seeded(3);
    for _ in 0..200 {
        let reading = sample_reading(&mut rng, at);
        assert!((0.6..=1.0).contains(&reading.confidence));
        assert_eq!(reading.observed_at, at);
    }
}

#[test]
fn test_gate_boundaries() {
    assert!(passes(&mut FixedGate(0.69), 0.7));
    assert!(!passes(&mut FixedGate(0.7), 0.7));
    assert!(!passes(&mut FixedGate::open(), 0.0), "Probability zero never passes");
    assert!(passes(&mut FixedGate(0.999), 1.0));
}

#[test]
fn test_pick_index_empty_range() {
    let mut rng = RngSource::seeded(11);
    assert_eq!(rng.pick_index(0), 0);
    assert_eq!(FixedGate(0.5).pick_index(0), 0);
    for _ in 0..50 {
        assert!(rng.pick_index(3) < 3);
    }
}

#[test]
fn test_telemetry_recorder_evicts_and_summarises() {
    let mut recorder = TelemetryRecorder::with_capacity(4);
    recorder.record(TelemetryEvent::EmotionIngested { emotion: Emotion::Bored });
    recorder.record(TelemetryEvent::Delivered {
        surface: "avatar".into(),
        kind: SuggestionKind::Question,
        priority: Priority::Medium,
        origin: DeliveryOrigin::Proactive,
    });
    recorder.record(TelemetryEvent::Suppressed {
        surface: "chat".into(),
        reason: SuppressReason::GatedOut,
    });
    recorder.record(TelemetryEvent::Suppressed {
        surface: "chat".into(),
        reason: SuppressReason::GatedOut,
    });
    recorder.record(TelemetryEvent::Cleared {
        surface: "avatar".into(),
        reason: ClearReason::Expired,
    });

    assert_eq!(recorder.len(), 4, "Oldest event evicted");
    let snapshot = recorder.snapshot();
    assert_eq!(snapshot.emotions_ingested, 0);
    assert_eq!(snapshot.delivery_stats.proactive, 1);
    assert_eq!(snapshot.delivery_stats.per_surface.get("avatar"), Some(&1));
    assert_eq!(snapshot.suppression_stats.gated_out, 2);
    assert!((snapshot.suppression_stats.gate_rejection_ratio - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(snapshot.clear_stats.expired, 1);

    recorder.clear();
    assert!(recorder.is_empty());
}
