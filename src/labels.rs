use std::collections::BTreeMap;

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};

/// One entry of the label table as it appears in the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub id: u8,
    pub name: String,
    pub color: [u8; 3],
}

impl LabelEntry {
    pub fn new(id: u8, name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            id,
            name: name.into(),
            color,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelClass {
    pub name: String,
    pub color: [u8; 3],
}

impl LabelClass {
    pub fn to_egui(&self) -> egui::Color32 {
        egui::Color32::from_rgb(self.color[0], self.color[1], self.color[2])
    }
}

/// Read-only table from class id to display name and overlay color.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelMap {
    classes: BTreeMap<u8, LabelClass>,
}

pub const BACKGROUND: u8 = 0;

pub fn default_labels() -> Vec<LabelEntry> {
    vec![
        LabelEntry::new(0, "Background", [0, 0, 0]),
        LabelEntry::new(1, "French manicure", [255, 0, 0]),
        LabelEntry::new(2, "Acrylic", [0, 255, 0]),
        LabelEntry::new(3, "Bare nail", [0, 0, 255]),
    ]
}

impl LabelMap {
    /// Build the table, rejecting duplicate ids and tables without a
    /// background class (freshly loaded images start all zero).
    pub fn from_entries(entries: &[LabelEntry]) -> Result<Self> {
        let mut classes = BTreeMap::new();
        for entry in entries {
            let class = LabelClass {
                name: entry.name.clone(),
                color: entry.color,
            };
            if classes.insert(entry.id, class).is_some() {
                return Err(AnnotateError::invalid_config(format!(
                    "duplicate label id {}",
                    entry.id
                )));
            }
        }
        if !classes.contains_key(&BACKGROUND) {
            return Err(AnnotateError::invalid_config(
                "label map must define background id 0",
            ));
        }
        Ok(Self { classes })
    }

    pub fn contains(&self, id: u8) -> bool {
        self.classes.contains_key(&id)
    }

    /// Display color for `id`; ids outside the table render black.
    pub fn color(&self, id: u8) -> [u8; 3] {
        self.classes.get(&id).map(|c| c.color).unwrap_or([0, 0, 0])
    }

    pub fn name(&self, id: u8) -> &str {
        self.classes.get(&id).map(|c| c.name.as_str()).unwrap_or("?")
    }

    /// Classes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &LabelClass)> {
        self.classes.iter().map(|(id, class)| (*id, class))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        let classes = default_labels()
            .into_iter()
            .map(|e| {
                (
                    e.id,
                    LabelClass {
                        name: e.name,
                        color: e.color,
                    },
                )
            })
            .collect();
        Self { classes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map_has_four_classes() {
        let map = LabelMap::default();
        assert_eq!(map.len(), 4);
        assert_eq!(map.name(1), "French manicure");
        assert_eq!(map.color(2), [0, 255, 0]);
        let ids: Vec<u8> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_from_entries_matches_default() {
        let map = LabelMap::from_entries(&default_labels()).unwrap();
        assert_eq!(map, LabelMap::default());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entries = vec![
            LabelEntry::new(0, "Background", [0, 0, 0]),
            LabelEntry::new(1, "a", [1, 1, 1]),
            LabelEntry::new(1, "b", [2, 2, 2]),
        ];
        assert!(matches!(
            LabelMap::from_entries(&entries),
            Err(AnnotateError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_missing_background_rejected() {
        let entries = vec![LabelEntry::new(1, "a", [1, 1, 1])];
        assert!(LabelMap::from_entries(&entries).is_err());
    }

    #[test]
    fn test_unknown_id_renders_black() {
        let map = LabelMap::default();
        assert!(!map.contains(42));
        assert_eq!(map.color(42), [0, 0, 0]);
    }
}
