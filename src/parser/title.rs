//! Raw fansub release title parsing.
//!
//! Titles on Chinese trackers follow loose conventions such as
//! `[Group] 中文名 / English Name - 08 [WebRip 1080p][简繁内封字幕]`. The parser
//! splits the title around the last episode marker and then works through the
//! name span (noise, season, names) and the tag span (subtitle, resolution,
//! source) independently.

use crate::domain::EpisodeNumber;
use crate::models::release::ParsedRelease;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TitleParseError {
    #[error("No episode marker found in title: {0}")]
    Structural(String),

    #[error("No English, Chinese or Japanese name found in title: {0}")]
    NameClassification(String),
}

/// Subtitle keywords, most specific first.
const SUBTITLE_PRIORITY: &[&str] = &["简体", "简繁", "简日", "简中", "简", "CHS", "GB"];

const CHINESE_NUMERALS: &[(&str, i32)] = &[
    ("一", 1),
    ("二", 2),
    ("三", 3),
    ("四", 4),
    ("五", 5),
    ("六", 6),
    ("七", 7),
    ("八", 8),
    ("九", 9),
    ("十", 10),
];

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn structure_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(
        &RE,
        r"(.*|\[.*\])( -? \d+|\[\d+\]|\[\d+.?[vV]\d\]|第\d+[话話集]|\[第?\d+[话話集]\]|\[\d+.?END\]|[Ee][Pp]?\d+)(.*)",
    )
}

/// Parses a raw release title into its structured fields.
///
/// The function is pure: the same input always yields the same output.
pub fn parse_title(raw: &str) -> Result<ParsedRelease, TitleParseError> {
    let title = normalize(raw);
    let group = release_group(&title);

    let caps = structure_regex()
        .captures(&title)
        .ok_or_else(|| TitleParseError::Structural(raw.to_string()))?;
    let name_span = caps.get(1).map_or("", |m| m.as_str()).trim();
    let episode_span = caps.get(2).map_or("", |m| m.as_str()).trim();
    let tag_span = caps.get(3).map_or("", |m| m.as_str()).trim();

    let episode = first_number(episode_span)
        .ok_or_else(|| TitleParseError::Structural(raw.to_string()))?;

    let name_span = strip_noise(name_span, &group);
    let (name, season_raw, season) = extract_season(&name_span);

    let names = classify_names(&split_names(&name));
    if names.en.is_empty() && names.zh.is_empty() && names.jp.is_empty() {
        return Err(TitleParseError::NameClassification(raw.to_string()));
    }

    let tags = extract_tags(tag_span);

    Ok(ParsedRelease {
        name_en: names.en,
        name_zh: names.zh,
        name_jp: names.jp,
        season,
        season_raw,
        episode: EpisodeNumber::new(episode),
        subtitle: tags.subtitle,
        group,
        resolution: tags.resolution,
        source: tags.source,
    })
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .replace(['【', '［'], "[")
        .replace(['】', '］'], "]")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn release_group(title: &str) -> String {
    title
        .split(['[', ']'])
        .nth(1)
        .map(|group| group.trim().to_string())
        .unwrap_or_default()
}

fn first_number(span: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"\d+");
    re.find(span)?.as_str().parse().ok()
}

/// Removes the group tag, "new season" markers and region-lock tokens.
fn strip_noise(span: &str, group: &str) -> String {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    static NEW_SEASON: OnceLock<Regex> = OnceLock::new();
    let punct = get_regex(&PUNCT, r"[^\w\s\p{Han}\p{Hiragana}\p{Katakana}-]");
    let new_season = get_regex(&NEW_SEASON, r"新番|月?番");

    let mut span = if group.is_empty() {
        span.to_string()
    } else {
        span.replacen(&format!("[{group}]"), "", 1)
    };

    let separated = punct.replace_all(&span, "/").into_owned();
    let mut tokens: Vec<&str> = separated
        .split('/')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.len() == 1 {
        tokens = tokens[0].split_whitespace().collect();
    }

    for token in tokens {
        let is_new_season = new_season.is_match(token) && token.chars().count() <= 5;
        if is_new_season || token.contains("港澳台地区") {
            span = remove_token(&span, token);
        }
    }

    span
}

fn remove_token(span: &str, token: &str) -> String {
    for wrapped in [
        format!("[{token}]"),
        format!("({token})"),
        format!("（{token}）"),
    ] {
        if span.contains(&wrapped) {
            return span.replace(&wrapped, "");
        }
    }
    span.replace(token, "")
}

/// Returns the name with season markers removed, the first marker as written,
/// and the resolved season number.
fn extract_season(span: &str) -> (String, String, i32) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"S\d{1,2}|Season \d{1,2}|第[^\s第]{1,3}?[季期]");

    let span = span.replace(['[', ']'], " ");
    let markers: Vec<&str> = re.find_iter(&span).map(|m| m.as_str()).collect();
    let Some(first) = markers.first() else {
        return (span, String::new(), 1);
    };

    let season = markers
        .iter()
        .copied()
        .find_map(season_number)
        .unwrap_or(1);
    let season_raw = (*first).to_string();
    let name = re.replace_all(&span, "").into_owned();

    (name, season_raw, season)
}

fn season_number(marker: &str) -> Option<i32> {
    if let Some(rest) = marker.strip_prefix('第') {
        let inner = rest.trim_end_matches(['季', '期']).trim();
        return inner.parse().ok().or_else(|| {
            CHINESE_NUMERALS
                .iter()
                .find(|(numeral, _)| *numeral == inner)
                .map(|(_, value)| *value)
        });
    }

    marker
        .trim_start_matches("Season")
        .trim_start_matches('S')
        .trim()
        .parse()
        .ok()
}

fn split_names(name: &str) -> Vec<String> {
    static REGION: OnceLock<Regex> = OnceLock::new();
    static MULTI_SPACE: OnceLock<Regex> = OnceLock::new();
    static LEADING_HAN: OnceLock<Regex> = OnceLock::new();
    let region = get_regex(&REGION, r"[(（]仅限港澳台地区[）)]");
    let multi_space = get_regex(&MULTI_SPACE, r"\s{2,}");
    let leading_han = get_regex(&LEADING_HAN, r"^\p{Han}{2,}");

    let name = region.replace_all(name.trim(), "");
    let name = name.trim();

    let attempts = [
        clean(name.split('/').collect()),
        clean(multi_space.split(name).collect()),
        clean(name.split('_').collect()),
        clean(name.split(" - ").collect()),
    ];
    if let Some(parts) = attempts.into_iter().find(|parts| parts.len() > 1) {
        return parts;
    }

    let words: Vec<&str> = name.split(' ').filter(|word| !word.is_empty()).collect();
    if let [first, rest @ ..] = words.as_slice()
        && !rest.is_empty()
        && leading_han.is_match(first)
    {
        return clean(vec![*first, rest.join(" ").as_str()]);
    }
    if let [init @ .., last] = words.as_slice()
        && !init.is_empty()
        && leading_han.is_match(last)
    {
        return clean(vec![init.join(" ").as_str(), *last]);
    }

    clean(vec![name])
}

fn clean(parts: Vec<&str>) -> Vec<String> {
    parts
        .into_iter()
        .map(trim_decoration)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn trim_decoration(part: &str) -> &str {
    part.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '★' | '☆' | '♪' | '◆' | '●' | '・' | '|' | '-')
    })
}

#[derive(Debug, Default)]
struct Names {
    en: String,
    zh: String,
    jp: String,
}

fn classify_names(segments: &[String]) -> Names {
    static KANA: OnceLock<Regex> = OnceLock::new();
    static HAN: OnceLock<Regex> = OnceLock::new();
    static LATIN: OnceLock<Regex> = OnceLock::new();
    let kana = get_regex(&KANA, r"[\p{Hiragana}\p{Katakana}]");
    let han = get_regex(&HAN, r"\p{Han}{2,}");
    let latin = get_regex(&LATIN, r"[a-zA-Z]{3,}");

    let mut names = Names::default();
    for segment in segments {
        let slot = if kana.is_match(segment) {
            &mut names.jp
        } else if han.is_match(segment) {
            &mut names.zh
        } else if latin.is_match(segment) {
            &mut names.en
        } else {
            continue;
        };
        if slot.is_empty() {
            slot.clone_from(segment);
        }
    }
    names
}

#[derive(Debug, Default)]
struct Tags {
    subtitle: String,
    resolution: String,
    source: String,
}

fn extract_tags(span: &str) -> Tags {
    static BRACKETS: OnceLock<Regex> = OnceLock::new();
    static SUBTITLE: OnceLock<Regex> = OnceLock::new();
    static CONTAINER: OnceLock<Regex> = OnceLock::new();
    static RESOLUTION: OnceLock<Regex> = OnceLock::new();
    static SOURCE: OnceLock<Regex> = OnceLock::new();
    let brackets = get_regex(&BRACKETS, r"[\[\]()（）]");
    let subtitle_marker = get_regex(
        &SUBTITLE,
        r"[简繁日字幕]|CH|BIG5|GB|CHS|CHT|JP|ENG|简中|繁中|中字",
    );
    let container = get_regex(&CONTAINER, r"_MP4|_MKV");
    let resolution = get_regex(&RESOLUTION, r"1080|720|2160|4K");
    let source = get_regex(
        &SOURCE,
        r"B-Global|[Bb]aha|[Bb]ilibili|AT-X|[Ww]eb|WEB|ABEMA|Abema|Netflix",
    );

    let cleaned = brackets.replace_all(span, " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    let prioritized = tokens
        .iter()
        .filter_map(|token| {
            SUBTITLE_PRIORITY
                .iter()
                .position(|keyword| token.contains(keyword))
                .map(|rank| (rank, *token))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, token)| token);
    let subtitle = prioritized.or_else(|| {
        tokens.iter().copied().find(|token| {
            subtitle_marker.is_match(token)
                && !SUBTITLE_PRIORITY
                    .iter()
                    .any(|keyword| token.contains(keyword))
        })
    });

    let first_match = |re: &Regex| {
        tokens
            .iter()
            .find(|token| re.is_match(token))
            .map(|token| (*token).to_string())
            .unwrap_or_default()
    };

    Tags {
        subtitle: subtitle
            .map(|tag| container.replace_all(tag, "").into_owned())
            .unwrap_or_default(),
        resolution: first_match(resolution),
        source: first_match(source),
    }
}
