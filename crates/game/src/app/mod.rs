pub(crate) mod bootstrap;
mod config;
pub(crate) mod loop_runner;
mod scene;
mod script;

#[cfg(test)]
fn demo_catalog() -> collector_engine::TemplateCatalog {
    use std::path::Path;

    let raw = include_str!("../../../../assets/creatures/creatures.xml");
    let templates = collector_engine::parse_templates_str(Path::new("creatures.xml"), raw)
        .expect("demo content parses");
    collector_engine::TemplateCatalog::from_templates(templates)
}
