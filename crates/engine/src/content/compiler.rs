use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use crate::carry::Rarity;

use super::database::{EntityTemplate, TemplateCatalog, TemplateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDef,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
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

impl std::error::Error for ContentCompileError {}

/// Compiles every `*.xml` file under `content_dir` (sorted by relative path)
/// into one catalog. A def name may appear only once across all files.
pub fn compile_template_catalog(content_dir: &Path) -> Result<TemplateCatalog, ContentCompileError> {
    let xml_files = collect_xml_files_sorted(content_dir)?;
    let mut seen = HashSet::<String>::new();
    let mut templates = Vec::<EntityTemplate>::new();

    for xml_file in xml_files {
        let raw = fs::read_to_string(&xml_file).map_err(|source| read_error(&xml_file, source))?;
        for template in parse_templates_str(&xml_file, &raw)? {
            if !seen.insert(template.def_name.clone()) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::DuplicateDef,
                    message: format!(
                        "duplicate CreatureDef '{}'; each defName may be defined once",
                        template.def_name
                    ),
                    file_path: xml_file.clone(),
                    location: None,
                });
            }
            templates.push(template);
        }
    }

    let catalog = TemplateCatalog::from_templates(templates);
    info!(
        dir = %content_dir.display(),
        templates = catalog.len(),
        "template_catalog_compiled"
    );
    Ok(catalog)
}

/// Parses one `<Defs>` document. `file_path` is only used for error reports.
pub fn parse_templates_str(
    file_path: &Path,
    raw: &str,
) -> Result<Vec<EntityTemplate>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(error_at_node(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut templates = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "CreatureDef" {
            return Err(error_at_node(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; expected <CreatureDef>",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }
        templates.push(parse_creature_def(file_path, &doc, child)?);
    }
    Ok(templates)
}

fn parse_creature_def(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<EntityTemplate, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut rarity: Option<Rarity> = None;
    let mut base_income: Option<u64> = None;
    let mut fought = false;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <CreatureDef>"),
                file_path,
                doc,
                field,
            ));
        }

        match field_name.as_str() {
            "defName" => def_name = Some(required_text(file_path, doc, field, "defName")?),
            "label" => label = Some(required_text(file_path, doc, field, "label")?),
            "rarity" => {
                let value = required_text(file_path, doc, field, "rarity")?;
                let Some(parsed) = Rarity::parse(&value) else {
                    return Err(error_at_node(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "invalid rarity '{value}'; allowed values: Common, Rare, Epic, Legendary, Mythic, Secret"
                        ),
                        file_path,
                        doc,
                        field,
                    ));
                };
                rarity = Some(parsed);
            }
            "baseIncome" => {
                let value = required_text(file_path, doc, field, "baseIncome")?;
                let parsed = value.parse::<u64>().map_err(|_| {
                    error_at_node(
                        ContentErrorCode::InvalidValue,
                        format!("baseIncome '{value}' is not a non-negative integer"),
                        file_path,
                        doc,
                        field,
                    )
                })?;
                base_income = Some(parsed);
            }
            "fought" => {
                let value = required_text(file_path, doc, field, "fought")?;
                fought = match value.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(error_at_node(
                            ContentErrorCode::InvalidValue,
                            format!("fought '{value}' must be true or false"),
                            file_path,
                            doc,
                            field,
                        ))
                    }
                };
            }
            _ => {
                return Err(error_at_node(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <CreatureDef>"),
                    file_path,
                    doc,
                    field,
                ))
            }
        }
    }

    let def_name = required_field(def_name, "defName", file_path, doc, node)?;
    let label = required_field(label, "label", file_path, doc, node)?;
    let rarity = required_field(rarity, "rarity", file_path, doc, node)?;
    let base_income = required_field(base_income, "baseIncome", file_path, doc, node)?;

    Ok(EntityTemplate {
        id: TemplateId(0),
        def_name,
        label,
        rarity,
        base_income,
        fought,
    })
}

fn required_field<T>(
    value: Option<T>,
    field_name: &str,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<T, ContentCompileError> {
    value.ok_or_else(|| {
        error_at_node(
            ContentErrorCode::MissingField,
            format!("missing required field <{field_name}> in <CreatureDef>"),
            file_path,
            doc,
            node,
        )
    })
}

fn required_text(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, ContentCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            ContentErrorCode::MissingField,
            format!("field <{field_name}> must not be empty"),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn error_at_node(
    code: ContentErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> ContentCompileError {
    let pos = doc.text_pos_at(node.range().start);
    ContentCompileError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}

fn read_error(path: &Path, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read content: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    }
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ContentCompileError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path.as_path())));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ContentCompileError> {
    let entries = fs::read_dir(current).map_err(|source| read_error(current, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| read_error(current, source))?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    const SLIME: &str = "<CreatureDef><defName>creature.slime</defName><label>Slime</label><rarity>Common</rarity><baseIncome>2</baseIncome></CreatureDef>";

    #[test]
    fn catalog_ids_follow_def_name_order() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join("b.xml"),
            &format!("<Defs>{SLIME}</Defs>"),
        );
        write_file(
            &temp.path().join("nested").join("a.xml"),
            r#"<Defs><CreatureDef><defName>creature.ash_wyrm</defName><label>Ash Wyrm</label><rarity>Mythic</rarity><baseIncome>40</baseIncome><fought>true</fought></CreatureDef></Defs>"#,
        );
        let catalog = compile_template_catalog(temp.path()).expect("compile");
        let wyrm = catalog.template_id_by_name("creature.ash_wyrm").expect("wyrm");
        let slime = catalog.template_id_by_name("creature.slime").expect("slime");
        assert!(wyrm.0 < slime.0);
        let wyrm = catalog.template(wyrm).expect("template");
        assert_eq!(wyrm.rarity, Rarity::Mythic);
        assert!(wyrm.fought);
        assert!(!catalog.template(slime).expect("template").fought);
    }

    #[test]
    fn missing_base_income_reports_file_and_location() {
        let err = parse_templates_str(
            Path::new("defs.xml"),
            r#"<Defs><CreatureDef><defName>a</defName><label>A</label><rarity>Rare</rarity></CreatureDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert!(err.message.contains("baseIncome"));
        assert_eq!(err.file_path, PathBuf::from("defs.xml"));
        assert!(err.location.is_some());
    }

    #[test]
    fn unknown_field_errors() {
        let err = parse_templates_str(
            Path::new("defs.xml"),
            r#"<Defs><CreatureDef><defName>a</defName><label>A</label><rarity>Rare</rarity><baseIncome>1</baseIncome><mood>Happy</mood></CreatureDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);
    }

    #[test]
    fn invalid_rarity_and_income_error() {
        let err = parse_templates_str(
            Path::new("defs.xml"),
            r#"<Defs><CreatureDef><defName>a</defName><label>A</label><rarity>Shiny</rarity><baseIncome>1</baseIncome></CreatureDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);

        let err = parse_templates_str(
            Path::new("defs.xml"),
            r#"<Defs><CreatureDef><defName>a</defName><label>A</label><rarity>Rare</rarity><baseIncome>-4</baseIncome></CreatureDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = parse_templates_str(
            Path::new("defs.xml"),
            r#"<Defs><CreatureDef><defName>a</defName></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn wrong_def_type_and_root_error() {
        let err = parse_templates_str(Path::new("defs.xml"), "<Things/>").expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidRoot);
        let err = parse_templates_str(Path::new("defs.xml"), "<Defs><EntityDef/></Defs>")
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownDefType);
    }

    #[test]
    fn duplicate_def_across_files_errors() {
        let temp = TempDir::new().expect("temp");
        write_file(
            &temp.path().join("a.xml"),
            &format!("<Defs>{SLIME}</Defs>"),
        );
        write_file(
            &temp.path().join("b.xml"),
            &format!("<Defs>{SLIME}</Defs>"),
        );
        let err = compile_template_catalog(temp.path()).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateDef);
        assert!(err.file_path.ends_with("b.xml"));
    }

    #[test]
    fn missing_directory_is_read_error() {
        let temp = TempDir::new().expect("temp");
        let err = compile_template_catalog(&temp.path().join("absent")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::ReadFile);
    }
}
