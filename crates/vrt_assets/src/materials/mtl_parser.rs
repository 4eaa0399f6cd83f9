//! MTL (Material Template Library) text parser
//!
//! Tokenizes `key value` lines into raw per-material records. The parser is
//! deliberately lax: color channels that fail to parse become NaN rather
//! than errors, unknown keys are stored verbatim for the material creator
//! to interpret, and text before the first `newmtl` is discarded. This
//! mirrors the accepted behavior of the format's reference implementation
//! and must not be hardened.

use crate::math::Vec3;

/// Value of one raw material property
#[derive(Debug, Clone, PartialEq)]
pub enum MtlValue {
    /// Three color channels (`ka`, `kd`, `ks`, `ke`)
    Color(Vec3),
    /// Any other property, stored as the trimmed remainder of the line
    Text(String),
}

/// Raw property record of one material, in source key order
///
/// Source order matters downstream: several keys target the same texture
/// slot and the first occurrence wins, so iteration must be deterministic.
#[derive(Debug, Clone, Default)]
pub struct RawMaterial {
    entries: Vec<(String, MtlValue)>,
}

impl RawMaterial {
    /// Set a property; a repeated key overwrites in place, keeping its
    /// original position
    pub fn set(&mut self, key: &str, value: MtlValue) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    /// Look up a property by (lower-cased) key
    pub fn get(&self, key: &str) -> Option<&MtlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate properties in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MtlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no properties were recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All materials of one parsed library, in declaration order
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    entries: Vec<(String, RawMaterial)>,
}

impl MaterialLibrary {
    /// Look up a material record by name
    pub fn get(&self, name: &str) -> Option<&RawMaterial> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Material names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate (name, record) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawMaterial)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the library holds no materials
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, name: String) {
        self.entries.push((name, RawMaterial::default()));
    }

    fn current_mut(&mut self) -> Option<&mut RawMaterial> {
        self.entries.last_mut().map(|(_, m)| m)
    }
}

/// MTL text parser
pub struct MtlParser;

impl MtlParser {
    /// Parse MTL text into raw material records
    pub fn parse(text: &str) -> MaterialLibrary {
        let mut library = MaterialLibrary::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = match line.find(' ') {
                Some(pos) => (line[..pos].to_lowercase(), line[pos + 1..].trim()),
                None => (line.to_lowercase(), ""),
            };

            if key == "newmtl" {
                library.push(value.to_string());
                continue;
            }

            // Properties before the first newmtl have no record to land in.
            let Some(material) = library.current_mut() else {
                continue;
            };

            let parsed = match key.as_str() {
                "ka" | "kd" | "ks" | "ke" => MtlValue::Color(parse_color(value)),
                _ => MtlValue::Text(value.to_string()),
            };
            material.set(&key, parsed);
        }

        log::debug!("Parsed MTL text: {} material(s)", library.len());
        library
    }
}

// Exactly three channels; anything missing or unparseable becomes NaN.
fn parse_color(value: &str) -> Vec3 {
    let mut tokens = value.split_whitespace();
    let mut channels = [f32::NAN; 3];
    for channel in &mut channels {
        *channel = tokens
            .next()
            .map_or(f32::NAN, |t| t.parse().unwrap_or(f32::NAN));
    }
    Vec3::new(channels[0], channels[1], channels[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_material() {
        let library = MtlParser::parse("newmtl m1\nKd 1.0 0.5 0.0\nmap_Kd tex.png\n");
        assert_eq!(library.len(), 1);

        let material = library.get("m1").unwrap();
        assert_eq!(
            material.get("kd"),
            Some(&MtlValue::Color(Vec3::new(1.0, 0.5, 0.0)))
        );
        assert_eq!(
            material.get("map_kd"),
            Some(&MtlValue::Text("tex.png".to_string()))
        );
    }

    #[test]
    fn test_keys_lowercased_values_verbatim() {
        let library = MtlParser::parse("newmtl M\nmap_Bump -bm 0.5 Rock_N.PNG\n");
        let material = library.get("M").unwrap();
        assert_eq!(
            material.get("map_bump"),
            Some(&MtlValue::Text("-bm 0.5 Rock_N.PNG".to_string()))
        );
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "\n# header comment\n\nnewmtl m\n# Kd 9 9 9\nKd 0.2 0.2 0.2\n";
        let library = MtlParser::parse(text);
        let material = library.get("m").unwrap();
        assert_eq!(
            material.get("kd"),
            Some(&MtlValue::Color(Vec3::new(0.2, 0.2, 0.2)))
        );
        assert_eq!(material.len(), 1);
    }

    #[test]
    fn test_lines_before_first_newmtl_discarded() {
        let library = MtlParser::parse("Kd 1 0 0\nKs 0 1 0\nnewmtl real\nKd 0 0 1\n");
        assert_eq!(library.len(), 1);
        let material = library.get("real").unwrap();
        assert_eq!(
            material.get("kd"),
            Some(&MtlValue::Color(Vec3::new(0.0, 0.0, 1.0)))
        );
    }

    #[test]
    fn test_bad_numbers_become_nan() {
        let library = MtlParser::parse("newmtl m\nKd 1.0 oops\n");
        let material = library.get("m").unwrap();
        let MtlValue::Color(color) = material.get("kd").unwrap() else {
            panic!("expected color");
        };
        assert_eq!(color.x, 1.0);
        assert!(color.y.is_nan());
        assert!(color.z.is_nan());
    }

    #[test]
    fn test_multiple_materials_in_order() {
        let library = MtlParser::parse("newmtl a\nKd 1 0 0\nnewmtl b\nKd 0 1 0\n");
        let names: Vec<_> = library.names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_repeated_key_keeps_position_takes_last_value() {
        let library = MtlParser::parse("newmtl m\nNs 10\nKd 1 1 1\nNs 20\n");
        let material = library.get("m").unwrap();
        assert_eq!(material.get("ns"), Some(&MtlValue::Text("20".to_string())));
        // Position of the first occurrence is retained.
        let keys: Vec<_> = material.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ns", "kd"]);
    }
}
