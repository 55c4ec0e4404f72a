//! File tree node model and related value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of a node in the file tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    File,
    Image,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Folder => "folder",
            FileKind::File => "file",
            FileKind::Image => "image",
        }
    }

    /// Whether nodes of this kind reference stored bytes
    pub fn has_content(&self) -> bool {
        !matches!(self, FileKind::Folder)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(FileKind::Folder),
            "file" => Ok(FileKind::File),
            "image" => Ok(FileKind::Image),
            other => Err(format!("unknown file kind: {}", other)),
        }
    }
}

/// Location of a node: the owner's root, or inside one of the owner's folders
///
/// On the wire the root is the literal `0` (a string `"0"` or a missing field
/// are accepted too) and a folder is its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parent {
    #[default]
    Root,
    Folder(Uuid),
}

impl Parent {
    pub fn folder_id(&self) -> Option<Uuid> {
        match self {
            Parent::Root => None,
            Parent::Folder(id) => Some(*id),
        }
    }
}

impl From<Option<Uuid>> for Parent {
    fn from(id: Option<Uuid>) -> Self {
        id.map_or(Parent::Root, Parent::Folder)
    }
}

impl FromStr for Parent {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "0" => Ok(Parent::Root),
            id => Ok(Parent::Folder(Uuid::parse_str(id)?)),
        }
    }
}

impl Serialize for Parent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Parent::Root => serializer.serialize_u8(0),
            Parent::Folder(id) => id.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Parent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None | Some(Raw::Number(0)) => Ok(Parent::Root),
            Some(Raw::Number(n)) => Err(serde::de::Error::custom(format!(
                "invalid parent id: {}",
                n
            ))),
            Some(Raw::Text(text)) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Opaque handle to bytes held by the blob store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    /// Generate a fresh, never used handle
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Handle of a derived variant of this content
    pub fn variant(&self, variant: Variant) -> String {
        match variant {
            Variant::Original => self.0.clone(),
            Variant::Size(size) => format!("{}_{}", self.0, size),
        }
    }
}

impl From<String> for ContentRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which bytes of a node to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Original,
    /// Thumbnail resampled to this width
    Size(u32),
}

/// Node of a user's file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub is_public: bool,
    pub parent: Parent,
    /// Set for files and images, never for folders
    pub content: Option<ContentRef>,
    pub created_at: DateTime<Utc>,
}

impl FileNode {
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }

    /// Whether `requester` may see this node and read its content
    pub fn is_visible_to(&self, requester: Option<Uuid>) -> bool {
        self.is_public || requester == Some(self.owner_id)
    }
}

/// New node creation payload
#[derive(Debug, Clone)]
pub struct NewFileNode {
    pub owner_id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub is_public: bool,
    pub parent: Parent,
    pub content: Option<ContentRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parent_accepts_root_spellings() {
        assert_eq!(serde_json::from_value::<Parent>(json!(0)).unwrap(), Parent::Root);
        assert_eq!(serde_json::from_value::<Parent>(json!("0")).unwrap(), Parent::Root);
        assert_eq!(serde_json::from_value::<Parent>(json!(null)).unwrap(), Parent::Root);
    }

    #[test]
    fn test_parent_folder_round_trip() {
        let id = Uuid::new_v4();
        let parent: Parent = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(parent, Parent::Folder(id));
        assert_eq!(serde_json::to_value(parent).unwrap(), json!(id.to_string()));
        assert_eq!(serde_json::to_value(Parent::Root).unwrap(), json!(0));
    }

    #[test]
    fn test_parent_rejects_garbage() {
        assert!(serde_json::from_value::<Parent>(json!(7)).is_err());
        assert!(serde_json::from_value::<Parent>(json!("not-an-id")).is_err());
        assert!("nope".parse::<Parent>().is_err());
    }

    #[test]
    fn test_variant_handles() {
        let content = ContentRef::from("abc".to_string());
        assert_eq!(content.variant(Variant::Original), "abc");
        assert_eq!(content.variant(Variant::Size(250)), "abc_250");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("image".parse::<FileKind>().unwrap(), FileKind::Image);
        assert!("movie".parse::<FileKind>().is_err());
        assert!(!FileKind::Folder.has_content());
        assert!(FileKind::File.has_content());
    }
}
