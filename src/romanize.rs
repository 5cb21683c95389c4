//! Folding of accented and ligature letters into plain Latin.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

const REPLACEMENTS: &[(char, &str)] = &[
    ('æ', "ae"), ('ǝ', "ae"), ('ǽ', "ae"), ('ǣ', "ae"), ('Æ', "Ae"), ('Ə', "Ae"),
    ('ß', "ss"), ('đ', "dj"), ('Đ', "Dj"), ('ø', "oe"), ('œ', "oe"), ('Œ', "Oe"),
    ('Ø', "Oe"), ('þ', "th"), ('Þ', "Th"), ('ĳ', "y"), ('Ĳ', "Y"), ('á', "a"),
    ('à', "a"), ('â', "a"), ('ä', "a"), ('å', "a"), ('ą', "a"), ('ã', "a"),
    ('ā', "a"), ('ă', "a"), ('ǎ', "a"), ('ȃ', "a"), ('ǻ', "a"), ('ȁ', "a"),
    ('Ƌ', "a"), ('ƌ', "a"), ('ȧ', "a"), ('Ã', "A"), ('Ą', "A"), ('Á', "A"),
    ('Ä', "A"), ('Å', "A"), ('À', "A"), ('Â', "A"), ('Ā', "A"), ('Ă', "A"),
    ('Ǻ', "A"), ('ĉ', "c"), ('ć', "c"), ('č', "c"), ('ç', "c"), ('ċ', "c"),
    ('Ĉ', "C"), ('Č', "C"), ('Ć', "C"), ('Ç', "C"), ('ð', "d"), ('ď', "d"),
    ('Ď', "D"), ('Ð', "D"), ('Ɖ', "D"), ('ê', "e"), ('é', "e"), ('ë', "e"),
    ('è', "e"), ('ę', "e"), ('ė', "e"), ('ě', "e"), ('ē', "e"), ('ĕ', "e"),
    ('ȅ', "e"), ('Ė', "E"), ('Ę', "E"), ('Ê', "E"), ('Ë', "E"), ('É', "E"),
    ('È', "E"), ('Ě', "E"), ('Ē', "E"), ('Ĕ', "E"), ('ƒ', "f"), ('ſ', "f"),
    ('ğ', "g"), ('ģ', "g"), ('ǧ', "g"), ('ġ', "g"), ('Ğ', "G"), ('Ĝ', "G"),
    ('Ģ', "G"), ('Ġ', "G"), ('Ɠ', "G"), ('ĥ', "h"), ('Ħ', "H"), ('í', "i"),
    ('і', "i"), ('ī', "i"), ('ı', "i"), ('ï', "i"), ('î', "i"), ('ì', "i"),
    ('ĭ', "i"), ('ĩ', "i"), ('ǐ', "i"), ('į', "i"), ('Í', "I"), ('İ', "I"),
    ('Î', "I"), ('Ì', "I"), ('Ï', "I"), ('І', "I"), ('Ĩ', "I"), ('Ī', "I"),
    ('ј', "j"), ('ĵ', "j"), ('Ј', "J"), ('Ĵ', "J"), ('ķ', "k"), ('Ķ', "K"),
    ('ĸ', "K"), ('ł', "l"), ('ŀ', "l"), ('ľ', "l"), ('ļ', "l"), ('ĺ', "l"),
    ('Ļ', "L"), ('Ľ', "L"), ('Ŀ', "L"), ('Ĺ', "L"), ('Ł', "L"), ('ñ', "n"),
    ('ņ', "n"), ('ń', "n"), ('ň', "n"), ('ŋ', "n"), ('ǹ', "n"), ('Ň', "N"),
    ('Ń', "N"), ('Ñ', "N"), ('Ŋ', "N"), ('Ņ', "N"), ('ô', "o"), ('ö', "o"),
    ('ò', "o"), ('õ', "o"), ('ó', "o"), ('ő', "o"), ('ơ', "o"), ('ǒ', "o"),
    ('ŏ', "o"), ('ǿ', "o"), ('ȍ', "o"), ('ō', "o"), ('ȯ', "o"), ('ǫ', "o"),
    ('Ó', "O"), ('Ő', "O"), ('Ô', "O"), ('Ö', "O"), ('Ò', "O"), ('Õ', "O"),
    ('Ŏ', "O"), ('Ō', "O"), ('Ơ', "O"), ('Ƿ', "P"), ('ƽ', "q"), ('Ƽ', "Q"),
    ('ř', "r"), ('ŕ', "r"), ('ŗ', "r"), ('Ř', "R"), ('Ʀ', "R"), ('Ȓ', "R"),
    ('Ŗ', "R"), ('Ŕ', "R"), ('š', "s"), ('ś', "s"), ('ş', "s"), ('ŝ', "s"),
    ('ș', "s"), ('Ş', "S"), ('Š', "S"), ('Ś', "S"), ('Ș', "S"), ('Ŝ', "S"),
    ('ť', "t"), ('ţ', "t"), ('ŧ', "t"), ('ț', "t"), ('Ť', "T"), ('Ŧ', "T"),
    ('Ţ', "T"), ('Ț', "T"), ('ũ', "u"), ('ú', "u"), ('ü', "u"), ('ư', "u"),
    ('û', "u"), ('ů', "u"), ('ù', "u"), ('ű', "u"), ('ū', "u"), ('µ', "u"),
    ('ǔ', "u"), ('ŭ', "u"), ('ȕ', "u"), ('Ū', "U"), ('Ű', "U"), ('Ù', "U"),
    ('Ú', "U"), ('Ü', "U"), ('Û', "U"), ('Ũ', "U"), ('Ư', "U"), ('Ů', "U"),
    ('Ǖ', "U"), ('Ʊ', "U"), ('ŵ', "w"), ('Ŵ', "W"), ('ÿ', "y"), ('Ŷ', "Y"),
    ('Ÿ', "Y"), ('ý', "y"), ('ȝ', "y"), ('Ȝ', "Y"), ('Ý', "Y"), ('ž', "z"),
    ('ź', "z"), ('ż', "z"), ('Ź', "Z"), ('Ž', "Z"), ('Ż', "Z"),
];

static MAPPINGS: Lazy<FxHashMap<char, &'static str>> =
    Lazy::new(|| REPLACEMENTS.iter().copied().collect());

/// Replaces roman-like letters (accents, ligatures) with their a-z/A-Z
/// equivalents. Letters from other scripts pass through unchanged.
pub fn romanize(s: &str) -> String {
    if s.is_ascii() {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match MAPPINGS.get(&c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}
