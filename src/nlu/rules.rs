//! Static rule tables for classification and extraction
//!
//! New intents are additions to these tables, not new types. Order is
//! significant everywhere: the first matching entry wins.

use crate::core::types::kinds;

/// Regex rules and description for one intent
pub struct IntentRule {
    pub intent: &'static str,
    pub description: &'static str,
    pub patterns: &'static [&'static str],
}

/// Pattern-stage rules, most specific first
///
/// Patterns run against the lower-cased, trimmed utterance.
pub const INTENT_RULES: &[IntentRule] = &[
    // === TIMERS ===
    IntentRule {
        intent: "timer.cancel",
        description: "Cancel a timer",
        patterns: &[
            r"\bcancel\s+(the\s+)?(all\s+)?(my\s+)?timers?\b",
            r"\bstop\s+(the\s+)?(all\s+)?(my\s+)?timers?\b",
            r"\bdelete\s+(the\s+)?(all\s+)?(my\s+)?timers?\b",
            r"\bturn\s+off\s+(the\s+)?(all\s+)?timers?\b",
        ],
    },
    IntentRule {
        intent: "timer.list",
        description: "List active timers",
        patterns: &[
            r"\blist\s+(my\s+)?timers\b",
            r"\bshow\s+(me\s+)?(my\s+)?timers\b",
            r"\bwhat\s+timers\b",
            r"\bactive\s+timers\b",
        ],
    },
    IntentRule {
        intent: "timer.status",
        description: "Check timer status",
        patterns: &[
            r"\bhow\s+(much|long)\s+.*\s+(left|remaining)\b",
            r"\btime\s+(left|remaining)\b",
            r"\btimer\s+status\b",
        ],
    },
    IntentRule {
        intent: "timer.set",
        description: "Set a timer or alarm",
        patterns: &[
            r"\bset\s+(a\s+|an\s+)?(timer|alarm)\b",
            r"\bstart\s+(a\s+)?timer\b",
            r"\btimer\s+for\b",
            r"\bremind\s+me\s+in\b",
            r"\balarm\s+(for|in)\b",
        ],
    },
    // === WEATHER ===
    IntentRule {
        intent: "weather.query",
        description: "Get weather information",
        patterns: &[
            r"\b(what|how)'?s?\s+the\s+weather\b",
            r"\bweather\s+(like\s+)?(in|at|for)\b",
            r"\b(will|is)\s+it\s+(going\s+to\s+)?(rain|snow|be\s+sunny|be\s+cloudy)\b",
            r"\bforecast\b",
            r"\btemperature\b.*\b(in|at|for)\b",
            r"\bhow\s+(hot|cold|warm)\b",
            r"\bweather\b",
        ],
    },
    // === APPLICATIONS ===
    IntentRule {
        intent: "app.list",
        description: "List running applications",
        patterns: &[
            r"\blist\s+(running\s+)?app(lication)?s\b",
            r"\bwhat\s+apps?\s+(are\s+)?(running|open)\b",
            r"\bshow\s+(me\s+)?(running\s+)?app(lication)?s\b",
        ],
    },
    IntentRule {
        intent: "app.switch",
        description: "Switch to an application",
        patterns: &[
            r"\bswitch\s+to\s+\w+",
            r"\bfocus\s+(on\s+)?\w+",
            r"\bgo\s+to\s+\w+",
        ],
    },
    IntentRule {
        intent: "app.close",
        description: "Close an application",
        patterns: &[
            r"\bclose\s+\w+",
            r"\bquit\s+\w+",
            r"\bexit\s+\w+",
            r"\bkill\s+\w+",
        ],
    },
    IntentRule {
        intent: "app.open",
        description: "Open an application",
        patterns: &[
            r"\bopen\s+\w+",
            r"\blaunch\s+\w+",
            r"\bstart\s+\w+",
            r"\brun\s+\w+",
        ],
    },
    // === SEARCH ===
    IntentRule {
        intent: "search.web",
        description: "Search the web",
        patterns: &[
            r"\bsearch\s+(the\s+web\s+)?(for\s+)?\w+",
            r"\bgoogle\s+\w+",
            r"\blook\s+up\s+\w+",
            r"\bfind\s+(me\s+)?(information\s+)?(about\s+)?\w+",
        ],
    },
    // === SMALL TALK ===
    IntentRule {
        intent: "smalltalk.help",
        description: "Request help",
        patterns: &[
            r"\bwhat\s+can\s+you\s+do\b",
            r"\bshow\s+me\s+(your\s+)?capabilities\b",
            r"\bwhat\s+(are\s+)?your\s+commands\b",
            r"\bhelp\b",
        ],
    },
    IntentRule {
        intent: "smalltalk.question",
        description: "Small talk question",
        patterns: &[
            r"\bhow\s+are\s+you\b",
            r"\bhow'?s\s+it\s+going\b",
            r"\bwho\s+are\s+you\b",
            r"\bwhat'?s\s+your\s+name\b",
        ],
    },
    IntentRule {
        intent: "smalltalk.thanks",
        description: "Express gratitude",
        patterns: &[
            r"\b(thank|thanks|thx|ty)\b",
            r"\bappreciate\s+it\b",
        ],
    },
    IntentRule {
        intent: "smalltalk.farewell",
        description: "Say goodbye",
        patterns: &[
            r"\b(bye|goodbye|farewell)\b",
            r"\bsee\s+you\b",
            r"\bgood\s+night\b",
            r"\btalk\s+to\s+you\s+later\b",
        ],
    },
    IntentRule {
        intent: "smalltalk.greeting",
        description: "Greeting",
        patterns: &[
            r"\b(hi|hello|hey|greetings|howdy)\b",
            r"\bgood\s+(morning|afternoon|evening)\b",
            r"\bwhat'?s\s+up\b",
        ],
    },
    // === SYSTEM ===
    IntentRule {
        intent: "system.status",
        description: "Check system status",
        patterns: &[
            r"\bsystem\s+status\b",
            r"\bstatus\b",
            r"\bsystem\s+info(rmation)?\b",
        ],
    },
];

/// Token-sequence rule for the secondary matcher
///
/// Each position lists the accepted lower-case tokens; positions must match
/// consecutive tokens.
pub struct TokenRule {
    pub intent: &'static str,
    pub sequence: &'static [&'static [&'static str]],
}

/// Secondary-matcher rules, most specific first
pub const TOKEN_RULES: &[TokenRule] = &[
    TokenRule {
        intent: "timer.cancel",
        sequence: &[&["cancel", "stop", "delete"], &["timer", "timers", "alarm"]],
    },
    TokenRule {
        intent: "timer.cancel",
        sequence: &[
            &["cancel", "stop", "delete"],
            &["the", "my", "all"],
            &["timer", "timers", "alarm"],
        ],
    },
    TokenRule {
        intent: "timer.set",
        sequence: &[&["set", "start"], &["timer", "alarm"]],
    },
    TokenRule {
        intent: "timer.set",
        sequence: &[&["set", "start"], &["a", "an", "the"], &["timer", "alarm"]],
    },
    TokenRule {
        intent: "timer.set",
        sequence: &[&["timer", "alarm"], &["for"]],
    },
    TokenRule {
        intent: "timer.set",
        sequence: &[&["remind"], &["me"]],
    },
    TokenRule {
        intent: "weather.query",
        sequence: &[&["weather", "forecast", "temperature", "umbrella"]],
    },
    TokenRule {
        intent: "weather.query",
        sequence: &[&["how"], &["hot", "cold", "warm"]],
    },
    TokenRule {
        intent: "weather.query",
        sequence: &[&["will"], &["it"], &["rain", "snow"]],
    },
    TokenRule {
        intent: "app.switch",
        sequence: &[&["switch"], &["to"]],
    },
    TokenRule {
        intent: "app.close",
        sequence: &[&["close", "quit", "kill"]],
    },
    TokenRule {
        intent: "app.open",
        sequence: &[&["open", "launch", "start", "run"]],
    },
    TokenRule {
        intent: "search.web",
        sequence: &[&["search", "google"]],
    },
    TokenRule {
        intent: "search.web",
        sequence: &[&["look"], &["up"]],
    },
    TokenRule {
        intent: "smalltalk.greeting",
        sequence: &[&["hi", "hello", "hey", "greetings", "howdy"]],
    },
    TokenRule {
        intent: "smalltalk.thanks",
        sequence: &[&["thanks", "thank", "thx", "cheers"]],
    },
    TokenRule {
        intent: "smalltalk.farewell",
        sequence: &[&["bye", "goodbye", "farewell"]],
    },
    TokenRule {
        intent: "smalltalk.help",
        sequence: &[&["help"]],
    },
];

/// Entity types that corroborate an intent guess
pub const ENTITY_HINTS: &[(&str, &[&str])] = &[
    ("timer.set", &[kinds::DURATION]),
    ("app.open", &[kinds::APP_NAME]),
    ("app.close", &[kinds::APP_NAME]),
    ("app.switch", &[kinds::APP_NAME]),
    (
        "weather.query",
        &[kinds::LOCATION, kinds::WEATHER_CONDITION, kinds::TEMPERATURE_UNIT],
    ),
];

/// Follow-up phrases that continue the previous topic with its last action
pub const FOLLOW_UP_PHRASES: &[&str] = &[
    "what about",
    "how about",
    "and in",
    "and for",
    "also",
    "tomorrow",
    "next week",
    "what else",
    "anything else",
];

/// Follow-up phrases that apply a specific action to the previous topic
pub const FOLLOW_UP_ACTIONS: &[(&str, &str)] = &[
    ("cancel it", "cancel"),
    ("stop it", "cancel"),
    ("close it", "close"),
];

/// Entities an intent needs before its skill can run
///
/// Missing ones are filled from conversational memory when possible.
pub const REQUIRED_ENTITIES: &[(&str, &[&str])] = &[
    ("weather.query", &[kinds::LOCATION]),
    ("timer.set", &[kinds::DURATION]),
    ("app.open", &[kinds::APP_NAME]),
    ("app.close", &[kinds::APP_NAME]),
    ("app.switch", &[kinds::APP_NAME]),
];

/// Application alias -> canonical name
pub const APP_ALIASES: &[(&str, &str)] = &[
    ("chrome", "Google Chrome"),
    ("browser", "Google Chrome"),
    ("safari", "Safari"),
    ("firefox", "Firefox"),
    ("vscode", "Visual Studio Code"),
    ("vs code", "Visual Studio Code"),
    ("code", "Visual Studio Code"),
    ("editor", "Visual Studio Code"),
    ("spotify", "Spotify"),
    ("music", "Spotify"),
    ("mail", "Mail"),
    ("email", "Mail"),
    ("notes", "Notes"),
    ("terminal", "Terminal"),
    ("slack", "Slack"),
    ("discord", "Discord"),
    ("zoom", "Zoom"),
];

/// Location alias -> canonical name
pub const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("new york city", "New York"),
    ("nyc", "New York"),
    ("the big apple", "New York"),
    ("san fran", "San Francisco"),
    ("sf", "San Francisco"),
    ("washington dc", "Washington"),
    ("the uk", "United Kingdom"),
];

/// Verbs after which a capitalized phrase is taken as an application name
pub const APP_VERBS: &[&str] = &[
    "open", "launch", "start", "run", "close", "quit", "exit", "kill", "switch to", "focus on",
];

/// Prepositions after which a capitalized phrase is taken as a location
pub const LOCATION_PREPOSITIONS: &[&str] = &["in", "at", "for", "near"];

/// Description lookup for [`INTENT_RULES`] labels
pub fn describe_intent(intent: &str) -> Option<&'static str> {
    INTENT_RULES
        .iter()
        .find(|rule| rule.intent == intent)
        .map(|rule| rule.description)
}

pub fn required_entities(intent: &str) -> &'static [&'static str] {
    REQUIRED_ENTITIES
        .iter()
        .find(|(name, _)| *name == intent)
        .map(|(_, kinds)| *kinds)
        .unwrap_or(&[])
}
