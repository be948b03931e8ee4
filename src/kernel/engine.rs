use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use super::signal::{Difficulty, Emotion, EmotionReading, LearningContext};
use super::suggestion::{Cause, Priority, Suggestion, SuggestionKind};

/// A focused learner is only interrupted after this many minutes.
pub const DEEP_FOCUS_MINUTES: u32 = 45;
/// Sessions longer than this get a generic break reminder.
pub const LONG_SESSION_MINUTES: u32 = 60;

/// Pure mapping: (EmotionReading, LearningContext) -> candidates, highest priority first.
/// No randomness here; that lives in the delivery gate.
pub fn generate_suggestions(
    emotion: &EmotionReading,
    context: &LearningContext,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    let mut candidates: Vec<Suggestion> = emotion_candidate(emotion.emotion, context, now)
        .into_iter()
        .collect();
    candidates.extend(context_candidates(context, now));

    // sort_by_key is stable: equal priorities keep emotion-first production order.
    candidates.sort_by_key(|s| Reverse(s.priority.rank()));
    candidates
}

/// Zero or one candidate per emotion. The match is exhaustive on purpose.
fn emotion_candidate(
    emotion: Emotion,
    context: &LearningContext,
    now: DateTime<Utc>,
) -> Option<Suggestion> {
    let lesson = &context.current_lesson;

    match emotion {
        Emotion::Frustrated => Some(Suggestion::new(
            Cause::Frustration,
            SuggestionKind::Suggestion,
            Priority::High,
            format!(
                "I notice you might be finding {lesson} challenging. Would you like me to break down the concept into simpler steps?"
            ),
            now,
        )),
        Emotion::Bored => Some(Suggestion::new(
            Cause::Boredom,
            SuggestionKind::Suggestion,
            Priority::Medium,
            format!(
                "Let's make this more interesting! Would you like to see a real-world application of {lesson}?"
            ),
            now,
        )),
        Emotion::Confused => Some(Suggestion::new(
            Cause::Confusion,
            SuggestionKind::Question,
            Priority::High,
            format!(
                "I can see you might need some clarification. What specific part of {lesson} would you like me to explain differently?"
            ),
            now,
        )),
        Emotion::Tired => Some(Suggestion::new(
            Cause::Fatigue,
            SuggestionKind::Break,
            Priority::Medium,
            format!(
                "You've been studying for {} minutes. How about taking a 5-minute break? I'll be here when you're ready to continue.",
                context.time_spent
            ),
            now,
        )),
        Emotion::Engaged => Some(Suggestion::new(
            Cause::Engagement,
            SuggestionKind::Encouragement,
            Priority::Low,
            format!(
                "Great focus! You're doing really well with {lesson}. Ready for a quick challenge question to test your understanding?"
            ),
            now,
        )),
        Emotion::Focused if context.time_spent > DEEP_FOCUS_MINUTES => Some(Suggestion::new(
            Cause::DeepFocus,
            SuggestionKind::Suggestion,
            Priority::Low,
            format!(
                "You've been incredibly focused! Would you like to dive deeper into an advanced concept related to {lesson}?"
            ),
            now,
        )),
        Emotion::Focused => None,
    }
}

/// Emotion-independent triggers, evaluated every time.
fn context_candidates(context: &LearningContext, now: DateTime<Utc>) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if context.time_spent > LONG_SESSION_MINUTES {
        out.push(Suggestion::new(
            Cause::LongSession,
            SuggestionKind::Break,
            Priority::Medium,
            "You've been learning for over an hour. Consider taking a break to help consolidate what you've learned!",
            now,
        ));
    }

    if context.difficulty == Difficulty::Hard {
        out.push(Suggestion::new(
            Cause::HardTopic,
            SuggestionKind::Suggestion,
            Priority::Medium,
            "This is a challenging topic! Would you like me to provide some prerequisite review or additional examples?",
            now,
        ));
    }

    out
}
