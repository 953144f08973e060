use crate::provider::ChatProvider;

/// Behavioral prompt for the companion persona, fixed for the session's
/// lifetime.
const SYSTEM_PROMPT: &str = r#"You are "HealthDost", a highly empathetic, warm, and professional health companion.
Your goal is to help users with their health queries, physical problems, and emotional feelings.
Tone:
1. Deeply empathetic: Acknowledge the user's feelings first. Use phrases like "I'm so sorry you're feeling this way" or "That sounds really difficult."
2. Encouraging & Motivational: If the user is feeling down or struggling with a health goal, offer gentle motivation.
3. Informative but cautious: Provide useful health suggestions and wellness recommendations (nutrition, sleep, exercise, stress management).
4. Safety First: ALWAYS include a small disclaimer if the user mentions serious symptoms, suggesting they consult a real doctor.
5. Conversational: Keep responses concise but warm. Use bullet points for recommendations.

Example: If a user says "I've had a headache all day and I'm stressed," don't just say "Drink water." Say: "Oh, I'm so sorry to hear your head has been hurting all day; that must be so draining, especially when you're already feeling stressed. Please take a deep breath with me. Aside from the stress, have you been able to drink enough water today? Sometimes a cool compress on your forehead and dimming the lights can help. If this headache is unusually severe, please do check in with a healthcare professional.""#;

/// Higher temperature favors varied, warmer phrasing over determinism.
const SESSION_TEMPERATURE: f32 = 0.8;

pub(super) const EMPTY_REPLY_MESSAGE: &str =
    "I'm sorry, I'm having a little trouble connecting right now. I'm still here for you, though.";
pub(super) const FAILURE_MESSAGE: &str =
    "I apologize, but I encountered an error. Please try again, I really want to help.";
pub(super) const CLEARED_MESSAGE: &str =
    "I've cleared our chat history for your privacy. How else can I help you today?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Author {
    User,
    Assistant,
}

/// One authored message in the conversation. Never mutated after creation.
#[derive(Clone, Debug)]
pub(crate) struct ChatTurn {
    pub(crate) author: Author,
    pub(crate) text: String,
}

/// Persona instructions plus sampling temperature, supplied once at session
/// creation and immutable afterwards.
#[derive(Clone, Debug)]
pub(crate) struct SystemProfile {
    pub(crate) persona: String,
    pub(crate) temperature: f32,
}

impl SystemProfile {
    pub(crate) fn health_companion() -> Self {
        Self {
            persona: SYSTEM_PROMPT.to_string(),
            temperature: SESSION_TEMPERATURE,
        }
    }
}

/// Result of one submission round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum ReplyOutcome {
    Text(String),
    Empty,
    Failure,
}

/// One ongoing dialogue with the provider: the accumulated turn history plus
/// the fixed system profile. The view can be cleared without touching this
/// memory; only a full reset discards it.
pub(super) struct ChatSession {
    profile: SystemProfile,
    provider: Box<dyn ChatProvider>,
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub(super) fn new(provider: Box<dyn ChatProvider>, profile: SystemProfile) -> Self {
        Self {
            profile,
            provider,
            turns: Vec::new(),
        }
    }

    /// Submits one user utterance and blocks on the provider round-trip.
    /// Empty-after-trim input is a no-op, not an error, and never reaches
    /// the provider.
    pub(super) fn submit(&mut self, utterance: &str) -> Option<ReplyOutcome> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return None;
        }

        // The utterance stays in context even when the call fails, so a
        // re-submission continues the same conversation.
        self.turns.push(ChatTurn {
            author: Author::User,
            text: utterance.to_string(),
        });

        match self.provider.generate(&self.profile, &self.turns) {
            Ok(Some(reply)) => {
                self.turns.push(ChatTurn {
                    author: Author::Assistant,
                    text: reply.clone(),
                });
                Some(ReplyOutcome::Text(reply))
            }
            Ok(None) => {
                // Soft failure: the reassurance fallback is view-only and is
                // not recorded as an assistant turn.
                Some(ReplyOutcome::Empty)
            }
            Err(err) => {
                tracing::error!(error = format!("{err:#}"), "provider call failed");
                Some(ReplyOutcome::Failure)
            }
        }
    }

    /// Forgets all accumulated turns. The profile is unchanged and the next
    /// submission starts a conversation with no memory of prior turns.
    pub(super) fn reset(&mut self) {
        self.turns.clear();
    }

    pub(super) fn turn_count(&self) -> usize {
        self.turns.len()
    }
}
