//! Modifier sets and their normalization.
//!
//! A modifier is a provider-agnostic transform parameter (`width`, `height`,
//! `format`, `quality`, `fit`, `background`, …). Modifiers are kept in
//! insertion order because that order is the order in which providers emit
//! their operations, and srcset consumers compare URLs byte for byte.
//!
//! An entry can be *present but absent* (`None`). That mirrors a modifier that
//! was explicitly cleared, e.g. `width = "auto"`: the key keeps its position,
//! but the [operations generator](crate::operations) skips it.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const FORMAT: &str = "format";
pub const QUALITY: &str = "quality";
pub const FIT: &str = "fit";
pub const BACKGROUND: &str = "background";

/// A single modifier value as it arrives from configuration or callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ModifierValue {
    /// Interpret a raw string the way a command line or query string would:
    /// integers, then floats, then booleans, otherwise text.
    pub fn parse_lossy(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Int(n);
        }
        if let Ok(f) = raw.parse::<f64>()
            && f.is_finite()
        {
            return Self::Float(f);
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ModifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ModifierValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ModifierValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ModifierValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ModifierValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ModifierValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ModifierValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ModifierValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Insertion-ordered modifier mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    entries: Vec<(String, Option<ModifierValue>)>,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, if the key is present and not cleared.
    pub fn get(&self, key: &str) -> Option<&ModifierValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Set `key`, keeping its position when it already exists.
    pub fn set(&mut self, key: &str, value: impl Into<ModifierValue>) {
        self.set_opt(key, Some(value.into()));
    }

    /// Set or clear `key`, keeping its position when it already exists.
    pub fn set_opt(&mut self, key: &str, value: Option<ModifierValue>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Clear `key` in place. Absent keys are left alone.
    pub fn unset(&mut self, key: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = None;
        }
    }

    /// Drop `key` entirely, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ModifierValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        self.entries.remove(pos).1
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All entries in insertion order, cleared ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ModifierValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// True when no entry carries a value.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_none())
    }

    /// Overlay `self` on top of `defaults`.
    ///
    /// Keys keep the position they have in `defaults`; keys only known to
    /// `self` follow in their own order. Cleared entries in `self` never erase
    /// a default value.
    pub fn with_defaults(&self, defaults: &Modifiers) -> Modifiers {
        let mut merged = defaults.clone();
        for (key, value) in &self.entries {
            match value {
                Some(v) => merged.set(key, v.clone()),
                None if !merged.entries.iter().any(|(k, _)| k == key) => {
                    merged.entries.push((key.clone(), None));
                }
                None => {}
            }
        }
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for Modifiers
where
    K: Into<String>,
    V: Into<ModifierValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut modifiers = Modifiers::new();
        for (k, v) in iter {
            modifiers.set(&k.into(), v);
        }
        modifiers
    }
}

impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present: Vec<_> = self
            .entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k, v)))
            .collect();
        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (k, v) in present {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModifiersVisitor;

        impl<'de> Visitor<'de> for ModifiersVisitor {
            type Value = Modifiers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of modifier names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Modifiers, A::Error> {
                let mut modifiers = Modifiers::new();
                while let Some((key, value)) = access.next_entry::<String, ModifierValue>()? {
                    modifiers.set(&key, value);
                }
                Ok(modifiers)
            }
        }

        deserializer.deserialize_map(ModifiersVisitor)
    }
}

/// Coerce a width/height value to pixels.
///
/// Accepts non-negative integers, finite non-negative floats (rounded), and
/// digit strings with an optional `px` suffix. `"auto"`, empty strings and
/// anything else yield `None`.
pub fn parse_size(value: &ModifierValue) -> Option<u32> {
    match value {
        ModifierValue::Int(n) => u32::try_from(*n).ok(),
        ModifierValue::Float(f) if f.is_finite() && *f >= 0.0 && *f <= f64::from(u32::MAX) => {
            Some(f.round() as u32)
        }
        ModifierValue::Text(s) => {
            let s = s.trim();
            let digits = s.strip_suffix("px").unwrap_or(s);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Normalize a modifier set for URL building.
///
/// `width`/`height` arguments, when given, replace the modifier entries of the
/// same name. The preset is merged under the explicit modifiers. Sizes that do
/// not coerce are cleared rather than reported.
pub fn normalize(
    modifiers: &Modifiers,
    width: Option<ModifierValue>,
    height: Option<ModifierValue>,
    preset: Option<&Modifiers>,
) -> Modifiers {
    let mut explicit = modifiers.clone();
    if let Some(w) = width {
        explicit.set(WIDTH, w);
    }
    if let Some(h) = height {
        explicit.set(HEIGHT, h);
    }

    let mut merged = match preset {
        Some(preset) => explicit.with_defaults(preset),
        None => explicit,
    };

    for key in [WIDTH, HEIGHT] {
        let Some(raw) = merged.get(key).cloned() else {
            continue;
        };
        match parse_size(&raw) {
            Some(px) => merged.set(key, px),
            None => {
                log::debug!("dropping {key} modifier: cannot use {raw:?} as a pixel size");
                merged.unset(key);
            }
        }
    }

    if let Some(ModifierValue::Text(q)) = merged.get(QUALITY)
        && let Ok(n) = q.trim().parse::<i64>()
    {
        merged.set(QUALITY, n);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ModifierValue {
        ModifierValue::from(s)
    }

    #[test]
    fn parse_size_accepts_numbers_and_px_strings() {
        assert_eq!(parse_size(&ModifierValue::Int(300)), Some(300));
        assert_eq!(parse_size(&text("300")), Some(300));
        assert_eq!(parse_size(&text("300px")), Some(300));
        assert_eq!(parse_size(&ModifierValue::Float(299.6)), Some(300));
    }

    #[test]
    fn parse_size_rejects_auto_and_garbage() {
        assert_eq!(parse_size(&text("auto")), None);
        assert_eq!(parse_size(&text("")), None);
        assert_eq!(parse_size(&text("12em")), None);
        assert_eq!(parse_size(&text("px")), None);
        assert_eq!(parse_size(&ModifierValue::Int(-5)), None);
        assert_eq!(parse_size(&ModifierValue::Float(f64::NAN)), None);
        assert_eq!(parse_size(&ModifierValue::Bool(true)), None);
    }

    #[test]
    fn set_keeps_position_of_existing_key() {
        let mut m: Modifiers = [("width", 10u32), ("height", 20u32)].into_iter().collect();
        m.set("width", 30u32);
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["width", "height"]);
        assert_eq!(m.get("width"), Some(&ModifierValue::Int(30)));
    }

    #[test]
    fn unset_clears_without_moving() {
        let mut m: Modifiers = [("width", 10u32), ("height", 20u32)].into_iter().collect();
        m.unset("width");
        assert_eq!(m.get("width"), None);
        assert!(!m.contains("width"));
        assert_eq!(m.iter().next().map(|(k, _)| k), Some("width"));
        m.unset("missing");
        assert_eq!(m.iter().count(), 2);
    }

    #[test]
    fn is_empty_ignores_cleared_entries() {
        let mut m = Modifiers::new();
        assert!(m.is_empty());
        m.set_opt("width", None);
        assert!(m.is_empty());
        m.set("format", "webp");
        assert!(!m.is_empty());
    }

    #[test]
    fn explicit_modifiers_win_over_preset() {
        let preset: Modifiers = [("format", "jpg"), ("fit", "cover")].into_iter().collect();
        let explicit: Modifiers = [("format", "webp")].into_iter().collect();
        let out = normalize(&explicit, None, None, Some(&preset));
        assert_eq!(out.get("format"), Some(&text("webp")));
        assert_eq!(out.get("fit"), Some(&text("cover")));
    }

    #[test]
    fn cleared_explicit_value_keeps_preset_value() {
        let preset: Modifiers = [("width", 50u32)].into_iter().collect();
        let mut explicit = Modifiers::new();
        explicit.set_opt("width", None);
        let out = normalize(&explicit, None, None, Some(&preset));
        assert_eq!(out.get("width"), Some(&ModifierValue::Int(50)));
    }

    #[test]
    fn auto_width_normalizes_to_absent_not_zero() {
        let out = normalize(&Modifiers::new(), Some(text("auto")), Some(text("200px")), None);
        assert_eq!(out.get(WIDTH), None);
        assert_eq!(out.get(HEIGHT), Some(&ModifierValue::Int(200)));
    }

    #[test]
    fn numeric_quality_string_becomes_integer() {
        let m: Modifiers = [("quality", "80")].into_iter().collect();
        let out = normalize(&m, None, None, None);
        assert_eq!(out.get(QUALITY), Some(&ModifierValue::Int(80)));

        let m: Modifiers = [("quality", "auto:good")].into_iter().collect();
        let out = normalize(&m, None, None, None);
        assert_eq!(out.get(QUALITY), Some(&text("auto:good")));
    }

    #[test]
    fn unknown_keys_pass_through() {
        let m: Modifiers = [("blur", 3u32)].into_iter().collect();
        let out = normalize(&m, None, None, None);
        assert_eq!(out.get("blur"), Some(&ModifierValue::Int(3)));
    }

    #[test]
    fn parse_lossy_picks_narrowest_type() {
        assert_eq!(ModifierValue::parse_lossy("80"), ModifierValue::Int(80));
        assert_eq!(ModifierValue::parse_lossy("1.5"), ModifierValue::Float(1.5));
        assert_eq!(ModifierValue::parse_lossy("true"), ModifierValue::Bool(true));
        assert_eq!(ModifierValue::parse_lossy("cover"), text("cover"));
    }

    #[test]
    fn float_display_drops_trailing_zero() {
        assert_eq!(ModifierValue::Float(2.0).to_string(), "2");
        assert_eq!(ModifierValue::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn deserialize_preserves_table_order() {
        let m: Modifiers = toml::from_str(
            r#"
format = "webp"
width = 50
fit = "cover"
"#,
        )
        .unwrap();
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["format", "width", "fit"]);
    }

    #[test]
    fn serialize_skips_cleared_entries() {
        let mut m: Modifiers = [("width", 10u32)].into_iter().collect();
        m.set("format", "png");
        m.unset("width");
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"format":"png"}"#);
    }
}
