//! Voicing classification of a token's phonological context.
//!
//! Both classifiers are total: any symbol outside the reference sets maps to
//! [`VoicingCategory::Unknown`].

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::types::{PhonemeToken, VoicingCategory};

const VOICELESS_CONSONANTS: &[&str] = &[
    "c", "cy", "F", "Fy", "h", "hy", "k", "ky", "p", "py", "S", "s", "sy", "t", "ty",
];

const VOICED_CONSONANTS: &[&str] = &[
    "b", "by", "d", "dy", "g", "gy", "m", "my", "n", "ny", "r", "ry", "v", "w", "y", "Z", "z",
    "zy",
];

// ぺ and へ are hiragana in the corpus annotation and are kept as such.
const VOICELESS_MORAS: &[&str] = &[
    "シ", "カ", "テ", "ツ", "ト", "キ", "ッ", "ケ", "タ", "ソ", "ク", "チ", "コ", "ス", "ハ", "サ",
    "ぺ", "セ", "ホ", "パ", "へ", "ヒ", "ピ", "フ", "プ", "シャ", "キュ", "キョ", "ヒャ", "ショ",
    "チュ", "シュ", "ヒョ", "トゥ", "チャ", "ティ", "チョ", "フォ", "テュ", "ツォ", "ツァ", "スィ",
    "ツェ", "チェ",
];

const VOICED_MORAS: &[&str] = &[
    "マ", "ド", "ー", "オ", "ニ", "レ", "ラ", "ガ", "ワ", "モ", "ン", "ダ", "ゴ", "イ", "ヨ", "ボ",
    "ジ", "ズ", "リ", "ム", "ナ", "ノ", "ル", "デ", "メ", "ネ", "ギ", "ブ", "ゲ", "ロ", "ア", "エ",
    "ザ", "ビ", "ヤ", "ヌ", "バ", "ミ", "ゾ", "グ", "ゼ", "ウ", "ユ", "ジョ", "ウォ", "ジュ", "ビョ",
    "ニュ", "リョ", "ミャ", "ディ", "ギョ", "ニョ", "ズィ", "ビュ", "ジェ", "ジャ", "リュ", "ドゥ",
    "ギャ", "ギュ", "ニャ", "リャ", "ミョ", "ウェ", "デゥ", "ニェ",
];

struct SymbolSets {
    voiceless: HashSet<&'static str>,
    voiced: HashSet<&'static str>,
}

impl SymbolSets {
    fn new(voiceless: &[&'static str], voiced: &[&'static str]) -> Self {
        Self {
            voiceless: voiceless.iter().copied().collect(),
            voiced: voiced.iter().copied().collect(),
        }
    }

    fn classify(&self, symbol: &str) -> VoicingCategory {
        if self.voiceless.contains(symbol) {
            VoicingCategory::Voiceless
        } else if self.voiced.contains(symbol) {
            VoicingCategory::Voiced
        } else {
            VoicingCategory::Unknown
        }
    }
}

fn consonants() -> &'static SymbolSets {
    static SETS: OnceLock<SymbolSets> = OnceLock::new();
    SETS.get_or_init(|| SymbolSets::new(VOICELESS_CONSONANTS, VOICED_CONSONANTS))
}

fn moras() -> &'static SymbolSets {
    static SETS: OnceLock<SymbolSets> = OnceLock::new();
    SETS.get_or_init(|| SymbolSets::new(VOICELESS_MORAS, VOICED_MORAS))
}

/// Classify the preceding segment. An absent segment is `Unknown`.
pub fn classify_prev_voicing(symbol: Option<&str>) -> VoicingCategory {
    match symbol {
        Some(s) => consonants().classify(s),
        None => VoicingCategory::Unknown,
    }
}

/// Classify the following mora. An absent mora marks an utterance boundary.
pub fn classify_following_voicing(symbol: Option<&str>) -> VoicingCategory {
    match symbol {
        Some(s) => moras().classify(s),
        None => VoicingCategory::Pause,
    }
}

/// Fill in both voicing fields for every token.
pub fn annotate_voicing(tokens: &mut [PhonemeToken]) {
    for token in tokens.iter_mut() {
        token.prev_voicing = classify_prev_voicing(token.prev_phoneme.as_deref());
        token.following_voicing = classify_following_voicing(token.following_mora.as_deref());
    }
}
