//! Controlled vocabularies, one per supported blueprint language.
//!
//! Only `zh-CN` and `en-US` ship with entries. Any other language tag gets
//! the empty lexicon, so every checked value is reported as invalid.

use super::rules::Rule;

pub const LANGUAGE_ZH_CN: &str = "zh-CN";
pub const LANGUAGE_EN_US: &str = "en-US";

// ---------------------------------------------------------------------------
// Word lists
// ---------------------------------------------------------------------------

const EN_SCENE_MOODS: &[&str] = &[
    "Tense",
    "Romantic",
    "Joyful",
    "Melancholic",
    "Suspenseful",
    "Warm",
    "Humorous",
    "Dramatic",
    "Mysterious",
    "Hostile",
    "Calm",
    "Hopeful",
    "Desperate",
    "Awkward",
];

const EN_SCENE_CONTENT_TYPES: &[&str] = &[
    "Dialogue",
    "Action",
    "Montage",
    "Flashback",
    "Exposition",
    "Transition",
    "Confrontation",
    "Revelation",
    "Romance",
    "Comedy",
];

const EN_HIGHLIGHT_TYPES: &[&str] = &[
    "Plot_Twist",
    "Emotional_Peak",
    "Conflict_Climax",
    "Identity_Reveal",
    "Comic_Relief",
    "Romantic_Moment",
    "Cliffhanger",
    "Power_Reversal",
];

const EN_HIGHLIGHT_MOODS: &[&str] = &[
    "Shocking",
    "Satisfying",
    "Heartwarming",
    "Tense",
    "Funny",
    "Sad",
    "Exciting",
    "Infuriating",
];

const ZH_SCENE_MOODS: &[&str] = &[
    "紧张", "浪漫", "欢乐", "忧郁", "悬疑", "温馨", "幽默", "戏剧性", "神秘", "敌对", "平静",
    "希望", "绝望", "尴尬",
];

const ZH_SCENE_CONTENT_TYPES: &[&str] = &[
    "对话", "动作", "蒙太奇", "闪回", "铺垫", "过渡", "冲突", "揭示", "感情", "喜剧",
];

const ZH_HIGHLIGHT_TYPES: &[&str] = &[
    "剧情反转", "情绪高潮", "冲突高潮", "身份揭露", "喜剧调剂", "浪漫时刻", "悬念结尾", "打脸逆袭",
];

const ZH_HIGHLIGHT_MOODS: &[&str] = &[
    "震惊", "爽快", "温暖", "紧张", "搞笑", "悲伤", "兴奋", "愤怒",
];

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

/// The vocabulary a checked field draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    SceneMood,
    SceneContentType,
    HighlightType,
    HighlightMood,
}

impl Vocabulary {
    /// Rule reported when a value falls outside this vocabulary.
    pub fn rule(&self) -> Rule {
        match self {
            Self::SceneMood => Rule::InvalidSceneMood,
            Self::SceneContentType => Rule::InvalidSceneContentType,
            Self::HighlightType => Rule::InvalidHighlightType,
            Self::HighlightMood => Rule::InvalidHighlightMood,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SceneMood => "scene mood",
            Self::SceneContentType => "scene content type",
            Self::HighlightType => "highlight type",
            Self::HighlightMood => "highlight mood",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexicon {
    pub scene_moods: &'static [&'static str],
    pub scene_content_types: &'static [&'static str],
    pub highlight_types: &'static [&'static str],
    pub highlight_moods: &'static [&'static str],
}

impl Lexicon {
    pub const EMPTY: Lexicon = Lexicon {
        scene_moods: &[],
        scene_content_types: &[],
        highlight_types: &[],
        highlight_moods: &[],
    };

    /// Select the lexicon for a language tag (case-insensitive).
    pub fn for_language(language: &str) -> Self {
        if language.eq_ignore_ascii_case(LANGUAGE_ZH_CN) {
            Self {
                scene_moods: ZH_SCENE_MOODS,
                scene_content_types: ZH_SCENE_CONTENT_TYPES,
                highlight_types: ZH_HIGHLIGHT_TYPES,
                highlight_moods: ZH_HIGHLIGHT_MOODS,
            }
        } else if language.eq_ignore_ascii_case(LANGUAGE_EN_US) {
            Self {
                scene_moods: EN_SCENE_MOODS,
                scene_content_types: EN_SCENE_CONTENT_TYPES,
                highlight_types: EN_HIGHLIGHT_TYPES,
                highlight_moods: EN_HIGHLIGHT_MOODS,
            }
        } else {
            Self::EMPTY
        }
    }

    pub fn words(&self, vocabulary: Vocabulary) -> &'static [&'static str] {
        match vocabulary {
            Vocabulary::SceneMood => self.scene_moods,
            Vocabulary::SceneContentType => self.scene_content_types,
            Vocabulary::HighlightType => self.highlight_types,
            Vocabulary::HighlightMood => self.highlight_moods,
        }
    }

    pub fn allows(&self, vocabulary: Vocabulary, value: &str) -> bool {
        self.words(vocabulary).contains(&value)
    }
}
