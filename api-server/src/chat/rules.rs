//! Rule-based responder
//!
//! Deterministic replies: crisis language first, then guidance for a known
//! risk level, then keyword intents, then a generic supportive reply.

use mindbloom_core::RiskLevel;

const CRISIS_PHRASES: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "better off dead",
    "no reason to live",
    "hurt myself",
    "harm myself",
    "self-harm",
    "self harm",
    "hurt my baby",
    "harm my baby",
];

const CRISIS_REPLY: &str = "I'm really concerned about what you've shared, and I'm glad you told me. \
You deserve support right now. If you are in immediate danger, please call your local emergency number \
(999 in Bangladesh, 911 in the US) or go to the nearest hospital. You can also reach the 988 Suicide & \
Crisis Lifeline (call or text 988 in the US) or the Postpartum Support International HelpLine at \
1-800-944-4773. Please reach out to someone you trust and let them stay with you.";

const GUIDANCE_WORDS: &[&str] = &["result", "risk", "score", "what should i do", "next step", "what now", "mean"];

const GENERIC_REPLY: &str = "Thank you for sharing. I'm here to listen and support you. \
Could you tell me a bit more about what's on your mind?";

struct Intent {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const INTENTS: &[Intent] = &[
    Intent {
        keywords: &["hello", "hi ", "hey", "good morning", "good evening"],
        reply: "Hello, I'm glad you're here. How have you been feeling since your baby arrived?",
    },
    Intent {
        keywords: &["thank", "thanks"],
        reply: "You're welcome. Taking care of yourself matters. I'm here whenever you want to talk.",
    },
    Intent {
        keywords: &["sleep", "insomnia", "tired", "exhausted"],
        reply: "Broken sleep is one of the hardest parts of the newborn months. Try to rest when the baby \
sleeps, share night feeds with someone you trust if you can, and keep screens away before bed. If you \
cannot sleep even when you have the chance, mention it to your doctor.",
    },
    Intent {
        keywords: &["anxious", "anxiety", "worry", "worried", "panic", "scared", "afraid"],
        reply: "Feeling anxious after birth is common, and it is not a sign of failure. Slow breathing, \
short walks and talking to someone close can help. If worry takes over most of your day, a health \
worker can help you find the right support.",
    },
    Intent {
        keywords: &["husband", "family", "in-law", "in law", "mother-in-law", "alone", "lonely", "support"],
        reply: "Support from the people around you makes a real difference. It's okay to ask your \
husband or family for specific help, like holding the baby while you rest. If you feel alone, a \
mothers' group or a community health worker can be a good place to start.",
    },
    Intent {
        keywords: &["breastfeed", "feeding", "milk", "latch"],
        reply: "Feeding can be stressful, especially in the first weeks. A midwife or lactation \
counsellor can check the latch and answer questions. Fed and cared for is what matters most.",
    },
    Intent {
        keywords: &["sad", "cry", "crying", "hopeless", "empty", "depressed", "depression"],
        reply: "I'm sorry you're feeling this way. Many mothers feel low after birth, and postpartum \
depression is treatable. If these feelings last more than two weeks or make daily life hard, please \
talk to a doctor or health worker.",
    },
    Intent {
        keywords: &["postpartum", "ppd", "baby blues"],
        reply: "Baby blues are mood swings that usually fade within two weeks of birth. Postpartum \
depression lasts longer and feels heavier, with sadness, loss of interest or trouble coping. It is \
common, it is not your fault, and it responds well to care.",
    },
];

#[derive(Debug, Clone, Default)]
pub struct RuleResponder;

impl RuleResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn is_crisis(message: &str) -> bool {
        let lower = message.to_lowercase();
        CRISIS_PHRASES.iter().any(|p| lower.contains(p))
    }

    pub fn crisis_reply() -> &'static str {
        CRISIS_REPLY
    }

    pub fn respond(&self, message: &str, risk_level: Option<RiskLevel>) -> String {
        if Self::is_crisis(message) {
            return CRISIS_REPLY.to_string();
        }

        // Trailing space lets "hi " match a bare greeting
        let lower = format!("{} ", message.trim().to_lowercase());

        if let Some(level) = risk_level {
            if GUIDANCE_WORDS.iter().any(|w| lower.contains(w)) {
                return risk_guidance(level).to_string();
            }
        }

        INTENTS
            .iter()
            .find(|intent| intent.keywords.iter().any(|k| lower.contains(k)))
            .map(|intent| intent.reply)
            .unwrap_or(GENERIC_REPLY)
            .to_string()
    }
}

pub fn risk_guidance(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "Your screening suggests a high risk of postpartum depression. This is not a \
diagnosis, but it is important. Please contact a doctor, midwife or mental health professional soon, and \
let someone close to you know how you are feeling.",
        RiskLevel::Medium => "Your screening suggests a moderate risk. Keep an eye on how you feel over the \
next two weeks, lean on people you trust, and consider talking to a health worker, especially if things \
get harder.",
        RiskLevel::Low => "Your screening suggests a low risk right now. Keep looking after your rest, food \
and support, and check in with yourself again in a few weeks. Reach out any time if things change.",
    }
}
