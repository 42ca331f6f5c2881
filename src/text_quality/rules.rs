//! Data tables driving the accuracy checker.
//!
//! Each regex rule is `(pattern, weight, category)`; adding a rule means adding
//! a row here. Checks that regexes cannot express (repeated tokens, list
//! numbering, date-format mixing) keep their tunables here as well.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Spacing,
    MixedScript,
    BlankLines,
    RepeatedToken,
    Hedging,
    Inappropriate,
    NumberedList,
    DateFormat,
    Spelling,
}

/// One pattern-based defect rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleEntry {
    pub pattern: &'static str,
    pub weight: f64,
    pub category: RuleCategory,
}

const fn rule(pattern: &'static str, weight: f64, category: RuleCategory) -> RuleEntry {
    RuleEntry {
        pattern,
        weight,
        category,
    }
}

/// Structural and phrasing defects, counted once per match.
pub static PATTERN_RULES: &[RuleEntry] = &[
    // two or more spaces/tabs inside a line
    rule(r"[ \t]{2,}", 1.0, RuleCategory::Spacing),
    // three or more line breaks in a row
    rule(r"\n[ \t\r]*\n[ \t\r]*\n", 1.0, RuleCategory::BlankLines),
    // contradictory certainty next to hedging
    rule(r"아마(?:도)?\s*(?:확실히|틀림없이|반드시)", 1.0, RuleCategory::Hedging),
    rule(r"(?:확실히|틀림없이)\s*아마(?:도)?", 1.0, RuleCategory::Hedging),
    rule(r"(?:일\s*수도\s*있고|수도\s*있지만)\s*(?:확실히|분명히)", 1.0, RuleCategory::Hedging),
    rule(r"(?i)\b(?:maybe|perhaps|probably)\s+(?:definitely|certainly|absolutely)\b", 1.0, RuleCategory::Hedging),
    rule(r"(?i)\b(?:definitely|certainly)\s+(?:maybe|perhaps)\b", 1.0, RuleCategory::Hedging),
    rule(r"(?i)\bi\s+think\s+(?:i\s+)?(?:know\s+)?for\s+sure\b", 0.5, RuleCategory::Hedging),
];

/// Mixed Hangul/Latin run without spaces, e.g. `데이터set입니다`.
pub const MIXED_SCRIPT_PATTERN: &str = r"[가-힣]+([A-Za-z]+)[가-힣]+";

/// Latin fragments that legitimately sit inside Hangul words.
pub static KNOWN_ABBREVIATIONS: &[&str] = &[
    "AI", "API", "CEO", "CPU", "DB", "DNA", "GPU", "HTML", "ID", "IoT", "IT", "KB", "MB", "GB",
    "OK", "OS", "PC", "PDF", "QR", "SNS", "SW", "TV", "UI", "URL", "USB", "UX", "VR", "Wi", "Fi",
];

/// Blocklisted words and their weights. Matched on word boundaries for Latin
/// entries and as substrings for Hangul entries.
pub static INAPPROPRIATE_WORDS: &[(&str, f64)] = &[
    ("씨발", 3.0),
    ("시발", 3.0),
    ("좆", 3.0),
    ("병신", 3.0),
    ("개새끼", 3.0),
    ("지랄", 2.0),
    ("닥쳐", 1.5),
    ("꺼져", 1.5),
    ("멍청이", 1.0),
    ("바보", 1.0),
    ("fuck", 3.0),
    ("shit", 2.0),
    ("bitch", 3.0),
    ("bastard", 2.0),
    ("asshole", 3.0),
    ("damn", 1.0),
    ("stupid", 1.0),
    ("idiot", 1.0),
];

/// Common misspellings used when no spell-check backend is plugged in.
pub static LATIN_MISSPELLINGS: &[&str] = &[
    "teh",
    "recieve",
    "recieved",
    "definately",
    "seperate",
    "occured",
    "untill",
    "wich",
    "becuase",
    "acheive",
    "beleive",
    "accomodate",
    "goverment",
    "enviroment",
    "tommorow",
    "neccessary",
    "occurence",
    "existance",
    "independant",
    "wierd",
];

/// Common Korean misspellings (frequent spelling and spacing confusions).
pub static KOREAN_MISSPELLINGS: &[&str] = &[
    "됬",
    "몇일",
    "어떻해",
    "어의없",
    "금새",
    "왠만하면",
    "희안하",
    "할께",
    "갈께",
    "일일히",
    "깨끗히",
    "않되",
    "되요",
    "설겆이",
    "오랫만",
    "웬지",
    "역활",
];

pub const REPEATED_TOKEN_WEIGHT: f64 = 1.0;

/// Numbered-list marker at line start: `1.` or `1)`.
pub const NUMBERED_LIST_PATTERN: &str = r"(?m)^[ \t]*(\d{1,3})[.)][ \t]+";
pub const NUMBERED_LIST_WEIGHT: f64 = 1.0;

/// Date-format families; mixing families inside one text is a defect.
pub static DATE_FORMATS: &[(&str, &str)] = &[
    ("iso", r"\b\d{4}-\d{1,2}-\d{1,2}\b"),
    ("dotted", r"\b\d{4}\.\s?\d{1,2}\.\s?\d{1,2}\.?"),
    ("slashed", r"\b\d{4}/\d{1,2}/\d{1,2}\b"),
    ("korean", r"\d{4}년\s*\d{1,2}월\s*\d{1,2}일"),
];
pub const DATE_FORMAT_WEIGHT: f64 = 1.0;

pub const SPELLING_WEIGHT: f64 = 1.0;
pub const MIXED_SCRIPT_WEIGHT: f64 = 1.0;
