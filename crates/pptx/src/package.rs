//! OPC package access: archive members and relationship parts.

use crate::xml::{self, XmlNode};
use deck_core::{Error, Result};
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// One `Relationship` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Archive path for internal targets, raw target for external ones.
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with the given short name,
    /// e.g. `slideLayout` or `notesSlide`.
    pub fn is_type(&self, short: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(short)
    }
}

/// Relationships of one part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` document whose targets are relative to `base_dir`.
    pub fn parse(content: &str, base_dir: &str) -> Result<Self> {
        let root = xml::parse(content)?;
        let entries = root
            .children_named("Relationship")
            .filter_map(|node| relationship(node, base_dir))
            .collect();
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// Resolved target of an internal or external relationship.
    pub fn target(&self, id: &str) -> Option<&str> {
        self.get(id).map(|rel| rel.target.as_str())
    }

    /// First relationship of the given short type.
    pub fn first_of_type(&self, short: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.is_type(short))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }
}

fn relationship(node: &XmlNode, base_dir: &str) -> Option<Relationship> {
    let id = node.attr("Id")?.to_string();
    let rel_type = node.attr("Type").unwrap_or_default().to_string();
    let raw = node.attr("Target")?;
    let external = node.attr("TargetMode") == Some("External");
    let target = if external {
        raw.to_string()
    } else {
        resolve_target(base_dir, raw)
    };
    Some(Relationship {
        id,
        rel_type,
        target,
        external,
    })
}

/// Resolve a relative target against a directory inside the archive.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Directory part of an archive path (`ppt/slides/slide1.xml` -> `ppt/slides`).
pub fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Path of the relationship part belonging to `part`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// An opened `.pptx` archive.
pub struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    pub fn has_part(&mut self, path: &str) -> bool {
        self.archive.by_name(path).is_ok()
    }

    /// Read a member's raw bytes.
    pub fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => Error::MissingPart(path.to_string()),
            other => Error::ZipError(format!("Failed to open '{}': {}", path, other)),
        })?;
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::CorruptedFile(format!("Failed to read '{}': {}", path, e)))?;
        Ok(content)
    }

    /// Read a member as UTF-8 text.
    pub fn read_string(&mut self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::CorruptedFile(format!("'{}' is not UTF-8: {}", path, e)))
    }

    /// Read and parse an XML member.
    pub fn read_xml(&mut self, path: &str) -> Result<XmlNode> {
        let content = self.read_string(path)?;
        xml::parse(&content)
    }

    /// Relationships of a part; empty when the part has none.
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let path = rels_path(part);
        match self.read_string(&path) {
            Ok(content) => Relationships::parse(&content, parent_dir(part)),
            Err(Error::MissingPart(_)) => Ok(Relationships::default()),
            Err(e) => Err(e),
        }
    }
}
