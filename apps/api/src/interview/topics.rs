//! Skill/topic selection for mock-interview questions.

use crate::models::conversation::ConversationState;
use crate::practice::taxonomy::{InterviewType, Track};

/// Static fallback when the candidate has no weak-topic signal.
pub fn default_topic(interview_type: InterviewType, track: Option<Track>) -> (&'static str, &'static str) {
    match interview_type {
        InterviewType::Hr => ("Behavioral", "Teamwork"),
        InterviewType::Technical => match track {
            Some(Track::Backend) => ("DSA", "fundamentals"),
            _ => ("React", "fundamentals"),
        },
        InterviewType::Scenario => ("SystemDesign", "architecture"),
    }
}

/// Skill under which a weak topic is probed.
pub fn weak_topic_skill(interview_type: InterviewType, track: Option<Track>) -> &'static str {
    match interview_type {
        InterviewType::Hr => "Behavioral",
        InterviewType::Technical => match track {
            Some(Track::Backend) => "DSA",
            Some(Track::Frontend) => "React",
            _ => "SystemDesign",
        },
        InterviewType::Scenario => "ProblemSolving",
    }
}

/// Prefers weak topics this conversation has not covered, then any weak
/// topic, then the default table.
pub fn select_topic(
    interview_type: InterviewType,
    track: Option<Track>,
    state: &ConversationState,
) -> (String, String) {
    let weak = state
        .uncovered_weak_spots()
        .into_iter()
        .next()
        .or_else(|| state.weak_spots_identified.first().cloned());

    match weak {
        Some(topic) => (weak_topic_skill(interview_type, track).to_string(), topic),
        None => {
            let (skill, topic) = default_topic(interview_type, track);
            (skill.to_string(), topic.to_string())
        }
    }
}
