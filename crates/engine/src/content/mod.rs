mod compiler;
mod database;

pub use compiler::{
    compile_template_catalog, parse_templates_str, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{EntityTemplate, TemplateCatalog, TemplateId};
