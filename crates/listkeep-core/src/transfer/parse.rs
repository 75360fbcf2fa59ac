//! Best-effort recovery of a list from arbitrary pasted text.
//!
//! Input is cleaned of control characters, opportunistically base64-decoded
//! and then run through an ordered table of format strategies. The first
//! strategy that both detects and parses the text wins; a strategy that
//! detects but fails hands over to the next one. Plain text always parses,
//! so [`parse_foreign_text`] never fails.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde_json::{Map, Value};

use super::markdown::ITEMS_HEADING;
use crate::models::{AnimationKind, Category, ItemDraft, ListDraft, RecordId};

/// Name given to an imported list that does not declare one
pub const DEFAULT_LIST_NAME: &str = "Lista Importada";
/// Color given to an imported list that does not declare one
pub const DEFAULT_LIST_COLOR: &str = "#007AFF";

/// An item recovered from foreign text; the category is still a name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedItem {
    pub text: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl ParsedItem {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A list recovered from foreign text, before it is given an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedList {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub items: Vec<ParsedItem>,
    /// Distinct category names, declared or referenced by items
    pub categories: Vec<String>,
    pub allows_random_pick: bool,
    pub animation_kind: Option<AnimationKind>,
}

impl Default for ParsedList {
    fn default() -> Self {
        Self {
            name: DEFAULT_LIST_NAME.to_string(),
            description: None,
            color: DEFAULT_LIST_COLOR.to_string(),
            items: Vec::new(),
            categories: Vec::new(),
            allows_random_pick: true,
            animation_kind: None,
        }
    }
}

impl ParsedList {
    fn add_category(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let folded = fold(name);
        if !self.categories.iter().any(|known| fold(known) == folded) {
            self.categories.push(name.to_string());
        }
    }

    fn push_item(&mut self, item: ParsedItem) {
        if let Some(category) = item.category.as_deref() {
            self.add_category(category);
        }
        self.items.push(item);
    }

    /// Turn the parsed shape into a list draft.
    ///
    /// Every distinct category name becomes one [`Category`] and items point
    /// at it by id.
    #[must_use]
    pub fn into_draft(self) -> ListDraft {
        let categories = self
            .categories
            .iter()
            .map(Category::new)
            .collect::<Vec<_>>();
        let category_id = |name: &str| -> Option<RecordId> {
            let folded = fold(name);
            categories
                .iter()
                .find(|category| fold(&category.name) == folded)
                .map(|category| category.id.clone())
        };

        let items = self
            .items
            .into_iter()
            .map(|item| {
                ItemDraft {
                    category: item.category.as_deref().and_then(&category_id),
                    description: item.description,
                    ..ItemDraft::new(item.text)
                }
                .into_item()
            })
            .collect();

        ListDraft {
            name: self.name,
            description: self.description,
            color: Some(self.color),
            items,
            categories,
            allows_random_pick: self.allows_random_pick,
            animation_kind: self.animation_kind,
            ..ListDraft::default()
        }
    }
}

/// Recover a list from arbitrary text. Never fails; unusable input yields
/// an empty list with default metadata.
#[must_use]
pub fn parse_foreign_text(raw: &str) -> ParsedList {
    let cleaned = strip_control_chars(raw);
    let text = match decode_base64(&cleaned) {
        Some(decoded) => {
            tracing::debug!("Import payload was base64, decoded {} chars", decoded.len());
            strip_control_chars(&decoded)
        }
        None => cleaned,
    };
    detect_and_parse(&text)
}

struct Strategy {
    name: &'static str,
    detect: fn(&str) -> bool,
    parse: fn(&str) -> Option<ParsedList>,
}

const STRATEGIES: [Strategy; 4] = [
    Strategy {
        name: "json",
        detect: looks_like_json,
        parse: parse_json,
    },
    Strategy {
        name: "markdown",
        detect: looks_like_markdown,
        parse: parse_markdown,
    },
    Strategy {
        name: "markup",
        detect: looks_like_markup,
        parse: parse_markup,
    },
    Strategy {
        name: "plain",
        detect: always,
        parse: parse_plain,
    },
];

fn detect_and_parse(text: &str) -> ParsedList {
    for strategy in &STRATEGIES {
        if !(strategy.detect)(text) {
            continue;
        }
        if let Some(parsed) = (strategy.parse)(text) {
            tracing::debug!(
                "Parsed foreign text as {} ({} items)",
                strategy.name,
                parsed.items.len()
            );
            return parsed;
        }
        tracing::debug!("Text looked like {} but did not parse", strategy.name);
    }
    ParsedList::default()
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid regex"))
}

fn base64_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    compiled(&PATTERN, r"^[A-Za-z0-9+/]+={0,2}$")
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    compiled(
        &PATTERN,
        r"^(?:[-•*▪▫◦‣⁃]+\s*|\d+[.)]\s+|[A-Za-z][.)]\s+)",
    )
}

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    compiled(
        &PATTERN,
        r"^(?P<text>.*?)(?:\s*\((?P<desc>[^()]*)\))?(?:\s*\[(?P<cat>[^\[\]]*)\])?\s*$",
    )
}

fn line_break_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    compiled(
        &PATTERN,
        r"(?i)<\s*(?:br|/p|/div|/li|/h[1-6]|/tr|p|div|tr)\b[^<>]*>",
    )
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    compiled(&PATTERN, r"<[^<>]*>")
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    compiled(&PATTERN, r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);")
}

fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\n' | '\r' | '\t') || !(c.is_control() || c == '\u{feff}'))
        .collect()
}

fn decode_base64(text: &str) -> Option<String> {
    let compact = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    if compact.len() < 16 || compact.len() % 4 != 0 || !base64_pattern().is_match(&compact) {
        return None;
    }

    let bytes = STANDARD.decode(compact.as_bytes()).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let readable = decoded.chars().count() > 10
        && decoded.chars().any(char::is_alphabetic)
        && !decoded
            .chars()
            .any(|c| c.is_control() && !c.is_whitespace());
    readable.then_some(decoded)
}

/// Lowercase and drop the Portuguese diacritics so keys compare loosely
fn fold(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    match bullet_pattern().find(line) {
        Some(marker) => line[marker.end()..].trim(),
        None => line,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match fold(value).as_str() {
        "sim" | "s" | "yes" | "y" | "true" | "1" => Some(true),
        "nao" | "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn split_names(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// `text (description) [category]`, both suffixes optional
fn parse_item_line(line: &str) -> Option<ParsedItem> {
    let body = strip_bullet(line);
    if body.is_empty() {
        return None;
    }

    let Some(captures) = item_pattern().captures(body) else {
        return Some(ParsedItem::new(body));
    };
    let text = captures.name("text").map_or("", |m| m.as_str()).trim();
    if text.is_empty() {
        return Some(ParsedItem::new(body));
    }

    Some(ParsedItem {
        text: text.to_string(),
        description: captures.name("desc").and_then(|m| non_empty(m.as_str())),
        category: captures.name("cat").and_then(|m| non_empty(m.as_str())),
    })
}

// ----- json -----

fn looks_like_json(text: &str) -> bool {
    text.trim_start().starts_with(['{', '['])
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(object, keys)
        .and_then(Value::as_str)
        .and_then(non_empty)
}

fn parse_json(text: &str) -> Option<ParsedList> {
    let value = serde_json::from_str::<Value>(text.trim()).ok()?;
    let list = match &value {
        Value::Array(entries) => entries.first()?,
        Value::Object(object) => match object.get("lists") {
            Some(Value::Array(lists)) => lists.first()?,
            _ => &value,
        },
        _ => return None,
    };
    let object = list.as_object()?;

    let name = string_field(object, &["name", "nome", "title", "titulo", "título"]);
    let items = field(object, &["itens", "items"]).and_then(Value::as_array);
    if name.is_none() && items.is_none() {
        return None;
    }

    let mut parsed = ParsedList::default();
    if let Some(name) = name {
        parsed.name = name;
    }
    parsed.description = string_field(object, &["description", "descricao", "descrição"]);
    if let Some(color) = string_field(object, &["color", "cor"]) {
        parsed.color = color;
    }

    // Item categories may reference these by id
    let mut category_names = Vec::<(String, String)>::new();
    if let Some(categories) = field(object, &["categories", "categorias"]).and_then(Value::as_array)
    {
        for category in categories {
            match category {
                Value::String(name) => parsed.add_category(name),
                Value::Object(entry) => {
                    let Some(name) = string_field(entry, &["name", "nome"]) else {
                        continue;
                    };
                    if let Some(id) = string_field(entry, &["id"]) {
                        category_names.push((id, name.clone()));
                    }
                    parsed.add_category(&name);
                }
                _ => {}
            }
        }
    }
    let resolve_category = |reference: String| -> String {
        category_names
            .iter()
            .find(|(id, _)| *id == reference)
            .map_or(reference, |(_, name)| name.clone())
    };

    for entry in items.into_iter().flatten() {
        let item = match entry {
            Value::String(text) => non_empty(text).map(ParsedItem::new),
            Value::Object(entry) => {
                string_field(entry, &["text", "texto", "name", "nome", "title"]).map(|text| {
                    let category = string_field(entry, &["category", "categoria"]).or_else(|| {
                        field(entry, &["categories", "categorias"])
                            .and_then(Value::as_array)
                            .and_then(|ids| ids.first())
                            .and_then(Value::as_str)
                            .and_then(non_empty)
                    });
                    ParsedItem {
                        text,
                        description: string_field(
                            entry,
                            &["description", "descricao", "descrição"],
                        ),
                        category: category.map(&resolve_category),
                    }
                })
            }
            _ => None,
        };
        if let Some(item) = item {
            parsed.push_item(item);
        }
    }

    if let Some(flag) = field(object, &["allowsRandomPick", "allowRandomPick"]) {
        parsed.allows_random_pick = flag
            .as_bool()
            .or_else(|| flag.as_str().and_then(parse_flag))
            .unwrap_or(parsed.allows_random_pick);
    }
    parsed.animation_kind = field(object, &["animationType", "animationKind", "tipoAnimacao"])
        .and_then(Value::as_str)
        .and_then(AnimationKind::from_label);

    Some(parsed)
}

// ----- markdown template -----

fn looks_like_markdown(text: &str) -> bool {
    let mut has_title = false;
    let mut has_items = false;
    for line in text.lines() {
        let line = line.trim_start();
        has_title |= line.starts_with("# ");
        has_items |= line.starts_with(ITEMS_HEADING);
    }
    has_title && has_items
}

enum Section {
    Preamble,
    Description,
    Items,
    Metadata,
    Other,
}

impl Section {
    fn from_heading(heading: &str) -> Self {
        match fold(heading).as_str() {
            "descricao" | "description" => Self::Description,
            "itens" | "items" => Self::Items,
            "metadados" | "metadata" => Self::Metadata,
            _ => Self::Other,
        }
    }
}

fn apply_template_metadata(parsed: &mut ParsedList, line: &str) {
    let Some((key, value)) = strip_bullet(line).split_once(':') else {
        return;
    };
    let value = value.trim();
    match fold(key).as_str() {
        "cor" | "color" => {
            if let Some(color) = non_empty(value) {
                parsed.color = color;
            }
        }
        "categorias" | "categories" => {
            for name in split_names(value) {
                parsed.add_category(name);
            }
        }
        "selecao aleatoria" | "random pick" => {
            if let Some(flag) = parse_flag(value) {
                parsed.allows_random_pick = flag;
            }
        }
        "tipo de animacao" | "animacao" | "animation" => {
            parsed.animation_kind = AnimationKind::from_label(value);
        }
        _ => {}
    }
}

fn parse_markdown(text: &str) -> Option<ParsedList> {
    let mut parsed = ParsedList::default();
    let mut name = None;
    let mut description = Vec::new();
    let mut section = Section::Preamble;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("## ") {
            section = Section::from_heading(heading);
            continue;
        }
        if let Some(title) = trimmed.strip_prefix("# ") {
            if name.is_none() {
                name = non_empty(title);
            }
            continue;
        }

        match section {
            Section::Description => description.push(trimmed),
            Section::Items => {
                if let Some(item) = parse_item_line(trimmed) {
                    parsed.push_item(item);
                }
            }
            Section::Metadata if !trimmed.is_empty() => {
                apply_template_metadata(&mut parsed, trimmed);
            }
            _ => {}
        }
    }

    parsed.name = name?;
    parsed.description = non_empty(&description.join("\n"));
    Some(parsed)
}

// ----- markup -----

fn looks_like_markup(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

fn decode_entity(entity: &str) -> &'static str {
    match entity {
        "&amp;" => "&",
        "&quot;" => "\"",
        "&apos;" | "&#39;" => "'",
        _ => " ",
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_markup(text: &str) -> Option<ParsedList> {
    let text = line_break_tag_pattern().replace_all(text, "\n");
    let text = tag_pattern().replace_all(&text, "");
    let text = entity_pattern().replace_all(&text, |captures: &regex::Captures<'_>| {
        decode_entity(&captures[0])
    });
    // Stray angle brackets would send the cleaned text back here
    let text = text.replace(|c: char| c == '<' || c == '>', " ");

    let cleaned = collapse_whitespace(&text);
    if cleaned.is_empty() {
        return None;
    }
    Some(detect_and_parse(&cleaned))
}

// ----- plain text -----

const fn always(_: &str) -> bool {
    true
}

/// Apply a `key: value` line naming list metadata; false for anything else
fn apply_plain_metadata(parsed: &mut ParsedList, line: &str) -> bool {
    let Some((key, value)) = strip_bullet(line).split_once(':') else {
        return false;
    };
    let value = value.trim();
    match fold(key).as_str() {
        "nome" | "name" | "titulo" | "title" => {
            if let Some(name) = non_empty(value) {
                parsed.name = name;
            }
        }
        "descricao" | "description" => parsed.description = non_empty(value),
        "cor" | "color" => {
            if let Some(color) = non_empty(value) {
                parsed.color = color;
            }
        }
        "categorias" | "categories" => {
            for name in split_names(value) {
                parsed.add_category(name);
            }
        }
        _ => return false,
    }
    true
}

#[allow(clippy::unnecessary_wraps)]
fn parse_plain(text: &str) -> Option<ParsedList> {
    let mut parsed = ParsedList::default();
    let mut seen_item = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen_item && apply_plain_metadata(&mut parsed, trimmed) {
            continue;
        }
        if let Some(item) = parse_item_line(trimmed) {
            seen_item = true;
            parsed.push_item(item);
        }
    }

    Some(parsed)
}
