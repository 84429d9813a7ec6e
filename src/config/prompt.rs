//! Fixed prompt text and user-visible strings shared by the relay and the console.

/// Instruction the relay prepends to every upstream request.
pub const RELAY_SYSTEM_PROMPT: &str = "You are Jarvis, a proactive AI operator assisting a human controller. \
Respond with concise, actionable intelligence. Prefer structured sections \
titled \"Situation\", \"Analysis\", \"Next Actions\" when relevant. Maintain a confident tone.";

/// System message that opens every console transcript. Never sent to the relay.
pub const CONSOLE_SYSTEM_PROMPT: &str = "You are Jarvis, an adaptive, hyper-capable AI operator trained to act as a tactical
mission assistant. Your tone is confident, precise, and mission-oriented.
Always provide structured, actionable insights. When appropriate, break down
responses into \"Situation\", \"Analysis\", and \"Next Actions\".";

pub const INITIAL_ASSISTANT_GREETING: &str =
    "Systems online. Jarvis standing by. What are we orchestrating today?";

pub const TRANSMISSION_FAILED: &str =
    "⚠️ Transmission failed. Verify the control room has OPENAI_API_KEY configured.";
pub const TRANSMISSION_ABORTED: &str = "Transmission aborted.";
pub const UNKNOWN_FAILURE: &str = "Unknown failure detected.";

pub const STATUS_NOMINAL: &str = "All systems nominal.";
pub const STATUS_DEPLOYING: &str = "Deploying Jarvis cognition stack…";
pub const STATUS_PROCESSING: &str = "Jarvis processing multi-threaded inference…";
pub const STATUS_COMPLETE: &str = "Transmission complete.";
pub const STATUS_OBSTRUCTION: &str = "Jarvis encountered an obstruction.";
pub const STATUS_LISTENING: &str = "Capturing voice command…";

pub const ERROR_MISSING_CREDENTIAL: &str = "OPENAI_API_KEY is not configured on the server.";
pub const ERROR_INVALID_JSON: &str = "Invalid JSON payload.";
pub const ERROR_MISSING_MESSAGES: &str = "Body must include a messages array.";
pub const ERROR_INVALID_MESSAGE: &str = "Each message must include a role and text content.";
pub const ERROR_UPSTREAM: &str = "Jarvis failed to complete the directive.";
pub const ERROR_SPEECH_UNSUPPORTED: &str = "Speech recognition is not supported in this environment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub title: &'static str,
    pub body: &'static str,
}

pub const SUGGESTIONS: [Suggestion; 3] = [
    Suggestion {
        title: "Strategize",
        body: "Summarize the current mission status and recommend next moves.",
    },
    Suggestion {
        title: "Intel Sweep",
        body: "Scan news & brief me on critical developments in AI governance.",
    },
    Suggestion {
        title: "Code Ops",
        body: "Review this repository and outline the highest risk change.",
    },
];
