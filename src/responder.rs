//! Contextual replies for the chat panel.
//!
//! Keyword rules first, then emotion rules, then a random generic reply.

use crate::kernel::gate::RandomSource;
use crate::kernel::signal::{Emotion, EmotionReading, LearningContext};

pub fn respond(
    input: &str,
    emotion: &EmotionReading,
    context: &LearningContext,
    source: &mut dyn RandomSource,
) -> String {
    let input = input.to_lowercase();
    let course = &context.current_course;
    let lesson = &context.current_lesson;
    let mentions = |words: &[&str]| words.iter().any(|w| input.contains(w));

    if mentions(&["help", "confused"]) {
        return format!(
            "I understand you need help with {lesson}. Let me break this down step by step. What specific part would you like me to explain further?"
        );
    }

    if mentions(&["tired", "break"]) {
        return format!(
            "I can see you might need a break. You've been working hard on {course}. Would you like some study tips or should we take a quick breather?"
        );
    }

    if mentions(&["difficult", "hard"]) {
        return format!(
            "{lesson} can be challenging! Let's approach it differently. Would you prefer a visual explanation, more examples, or should we review the prerequisites first?"
        );
    }

    if mentions(&["quiz", "test"]) {
        return format!(
            "Great idea! I can create a quick quiz on {lesson} to test your understanding. Would you like multiple choice questions or open-ended problems?"
        );
    }

    match emotion.emotion {
        Emotion::Frustrated => {
            return format!(
                "I can sense this might be frustrating. Remember, learning {course} takes time. Let's try a different approach - what would help you feel more confident right now?"
            );
        }
        Emotion::Engaged => {
            return format!(
                "I love your enthusiasm! Since you're so engaged with {lesson}, would you like to explore some advanced applications or try a challenging problem?"
            );
        }
        _ => {}
    }

    let generic = [
        format!("That's a great question about {lesson}! Let me help you understand this concept better."),
        format!("I can see you're working through {course}. Based on your progress, here's what I'd suggest..."),
        format!("Since you're learning {lesson}, let me provide some additional context that might help."),
        format!("You're doing well with {course}! Is there a particular aspect you'd like to dive deeper into?"),
        "I notice you've been focused on this topic for a while. Would you like me to suggest some practice problems or additional resources?".to_string(),
    ];
    let index = source.pick_index(generic.len()).min(generic.len() - 1);
    generic.into_iter().nth(index).unwrap_or_default()
}
