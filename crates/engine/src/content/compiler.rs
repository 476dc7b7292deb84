use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use crate::scene::{
    encode_resource_list, ResourceKind, ResourceListEntry, SceneDescriptor, SceneLut,
};

use super::archive::ResourceArchive;
use super::hashing::decode_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    MissingAttribute,
    InvalidValue,
    DuplicateResource,
}

#[derive(Debug, Clone)]
pub struct ArchiveCompileError {
    pub code: ArchiveErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ArchiveCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ArchiveCompileError {}

/// Compiles an XML archive manifest; `file` attributes resolve against the
/// manifest's directory.
pub fn compile_archive_file(path: &Path) -> Result<ResourceArchive, ArchiveCompileError> {
    let raw = fs::read_to_string(path).map_err(|error| read_error(path, error))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let archive = compile_archive_str(&raw, path, base_dir)?;
    info!(
        manifest = %path.display(),
        resources = archive.len(),
        "resource_archive_compiled"
    );
    Ok(archive)
}

pub fn compile_archive_str(
    raw: &str,
    file_path: &Path,
    base_dir: &Path,
) -> Result<ResourceArchive, ArchiveCompileError> {
    let doc = Document::parse(raw).map_err(|error| ArchiveCompileError {
        code: ArchiveErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let ctx = Ctx {
        file_path,
        base_dir,
        doc: &doc,
    };
    let root = doc.root_element();
    if root.tag_name().name() != "ResourceArchive" {
        return Err(ctx.error_at(
            ArchiveErrorCode::InvalidRoot,
            "root element must be <ResourceArchive>".to_string(),
            root,
        ));
    }

    let mut archive = ResourceArchive::new();
    for child in root.children().filter(|node| node.is_element()) {
        let (id, bytes) = match child.tag_name().name() {
            "Resource" => ctx.parse_resource(child)?,
            "SceneLut" => ctx.parse_scene_lut(child)?,
            "SceneDescriptor" => ctx.parse_descriptor(child)?,
            "ResourceList" => ctx.parse_resource_list(child)?,
            other => {
                return Err(ctx.error_at(
                    ArchiveErrorCode::UnknownElement,
                    format!(
                        "unsupported element <{other}>; expected <Resource>, <SceneLut>, <SceneDescriptor> or <ResourceList>"
                    ),
                    child,
                ))
            }
        };
        if archive.insert(id, bytes).is_some() {
            return Err(ctx.error_at(
                ArchiveErrorCode::DuplicateResource,
                format!("resource id {id} is defined more than once"),
                child,
            ));
        }
    }
    Ok(archive)
}

struct Ctx<'a, 'input> {
    file_path: &'a Path,
    base_dir: &'a Path,
    doc: &'a Document<'input>,
}

impl<'a, 'input> Ctx<'a, 'input> {
    fn parse_resource(&self, node: Node<'_, '_>) -> Result<(u16, Vec<u8>), ArchiveCompileError> {
        self.check_attributes(node, &["id", "file", "hex"])?;
        let id = self.required_u16(node, "id")?;
        let bytes = match (node.attribute("file"), node.attribute("hex")) {
            (Some(file), None) => {
                let path = self.base_dir.join(file);
                fs::read(&path).map_err(|error| ArchiveCompileError {
                    location: Some(self.location_of(node)),
                    ..read_error(&path, error)
                })?
            }
            (None, Some(hex)) => decode_hex(hex).ok_or_else(|| {
                self.error_at(
                    ArchiveErrorCode::InvalidValue,
                    format!("attribute hex of resource {id} is not valid hex"),
                    node,
                )
            })?,
            _ => {
                return Err(self.error_at(
                    ArchiveErrorCode::MissingAttribute,
                    format!("<Resource id=\"{id}\"> needs exactly one of file or hex"),
                    node,
                ))
            }
        };
        Ok((id, bytes))
    }

    /// `<Scene>` children become indices 1..=n; slot 0 and a trailing slot
    /// are reserved by the table layout.
    fn parse_scene_lut(&self, node: Node<'_, '_>) -> Result<(u16, Vec<u8>), ArchiveCompileError> {
        self.check_attributes(node, &["id"])?;
        let id = self.required_u16(node, "id")?;
        let mut entries = vec![0u16];
        for scene in self.element_children(node, "Scene")? {
            self.check_attributes(scene, &["resource"])?;
            entries.push(self.required_u16(scene, "resource")?);
        }
        entries.push(0);
        let lut = SceneLut::from_entries(entries).map_err(|error| {
            self.error_at(ArchiveErrorCode::InvalidValue, error.to_string(), node)
        })?;
        Ok((id, lut.to_bytes()))
    }

    fn parse_descriptor(&self, node: Node<'_, '_>) -> Result<(u16, Vec<u8>), ArchiveCompileError> {
        self.check_attributes(
            node,
            &[
                "id",
                "resourceList",
                "endSlope",
                "beginSlope",
                "script",
                "sceneScript",
                "startScript",
                "music",
            ],
        )?;
        let id = self.required_u16(node, "id")?;
        let descriptor = SceneDescriptor {
            reserved0: 0,
            resource_list: self.required_u16(node, "resourceList")?,
            end_slope: self.optional_number(node, "endSlope")?,
            begin_slope: self.optional_number(node, "beginSlope")?,
            script_number: self.optional_number(node, "script")?,
            scene_script_number: self.optional_number(node, "sceneScript")?,
            start_script_number: self.optional_number(node, "startScript")?,
            music: self.optional_number(node, "music")?,
        };
        Ok((id, descriptor.to_bytes().to_vec()))
    }

    fn parse_resource_list(
        &self,
        node: Node<'_, '_>,
    ) -> Result<(u16, Vec<u8>), ArchiveCompileError> {
        self.check_attributes(node, &["id"])?;
        let id = self.required_u16(node, "id")?;
        let mut entries = Vec::<ResourceListEntry>::new();
        for entry in self.element_children(node, "Entry")? {
            self.check_attributes(entry, &["resource", "type"])?;
            let resource_id = self.required_u16(entry, "resource")?;
            let kind = self.resource_kind(entry)?;
            entries.push(ResourceListEntry::new(resource_id, kind));
        }
        Ok((id, encode_resource_list(&entries)))
    }

    fn resource_kind(&self, node: Node<'_, '_>) -> Result<ResourceKind, ArchiveCompileError> {
        let raw = self.required_attribute(node, "type")?;
        if let Some(kind) = ResourceKind::from_manifest_name(raw) {
            return Ok(kind);
        }
        raw.parse::<u16>()
            .map(ResourceKind::from_code)
            .map_err(|_| {
                self.error_at(
                    ArchiveErrorCode::InvalidValue,
                    format!("unknown resource type '{raw}'"),
                    node,
                )
            })
    }

    fn element_children<'n, 'i>(
        &self,
        node: Node<'n, 'i>,
        expected: &str,
    ) -> Result<Vec<Node<'n, 'i>>, ArchiveCompileError> {
        let mut out = Vec::new();
        for child in node.children().filter(|child| child.is_element()) {
            if child.tag_name().name() != expected {
                return Err(self.error_at(
                    ArchiveErrorCode::UnknownElement,
                    format!(
                        "<{}> may only contain <{expected}>, found <{}>",
                        node.tag_name().name(),
                        child.tag_name().name()
                    ),
                    child,
                ));
            }
            out.push(child);
        }
        Ok(out)
    }

    fn check_attributes(
        &self,
        node: Node<'_, '_>,
        allowed: &[&str],
    ) -> Result<(), ArchiveCompileError> {
        for attribute in node.attributes() {
            let name = attribute.name();
            if !allowed.contains(&name) {
                return Err(self.error_at(
                    ArchiveErrorCode::UnknownAttribute,
                    format!(
                        "unknown attribute {name} on <{}>",
                        node.tag_name().name()
                    ),
                    node,
                ));
            }
        }
        Ok(())
    }

    fn required_attribute<'n>(
        &self,
        node: Node<'n, '_>,
        name: &str,
    ) -> Result<&'n str, ArchiveCompileError> {
        node.attribute(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                self.error_at(
                    ArchiveErrorCode::MissingAttribute,
                    format!(
                        "<{}> requires attribute {name}",
                        node.tag_name().name()
                    ),
                    node,
                )
            })
    }

    fn required_u16(&self, node: Node<'_, '_>, name: &str) -> Result<u16, ArchiveCompileError> {
        let raw = self.required_attribute(node, name)?;
        self.parse_number(node, name, raw)
    }

    fn optional_number<T: std::str::FromStr + Default>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<T, ArchiveCompileError> {
        match node.attribute(name).map(str::trim) {
            None => Ok(T::default()),
            Some(raw) => self.parse_number(node, name, raw),
        }
    }

    fn parse_number<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
        raw: &str,
    ) -> Result<T, ArchiveCompileError> {
        raw.parse::<T>().map_err(|_| {
            self.error_at(
                ArchiveErrorCode::InvalidValue,
                format!(
                    "attribute {name}='{raw}' on <{}> is out of range or not a number",
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    fn location_of(&self, node: Node<'_, '_>) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }
    }

    fn error_at(
        &self,
        code: ArchiveErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ArchiveCompileError {
        ArchiveCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(self.location_of(node)),
        }
    }
}

fn read_error(path: &Path, source: std::io::Error) -> ArchiveCompileError {
    ArchiveCompileError {
        code: ArchiveErrorCode::ReadFile,
        message: format!("failed to read file: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    }
}
