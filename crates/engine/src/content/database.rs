use std::collections::HashMap;

use crate::carry::{EconomicAttributes, Rarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct EntityTemplate {
    pub id: TemplateId,
    pub def_name: String,
    pub label: String,
    pub rarity: Rarity,
    pub base_income: u64,
    pub fought: bool,
}

impl EntityTemplate {
    pub fn economy(&self) -> EconomicAttributes {
        EconomicAttributes::new(self.rarity, self.base_income)
    }
}

/// Creature templates indexed by def name. Ids follow def-name order so they
/// are stable across runs.
#[derive(Debug, Default, Clone)]
pub struct TemplateCatalog {
    templates: Vec<EntityTemplate>,
    ids_by_name: HashMap<String, TemplateId>,
}

impl TemplateCatalog {
    pub fn from_templates(mut templates: Vec<EntityTemplate>) -> Self {
        templates.sort_by(|a, b| a.def_name.cmp(&b.def_name));
        let mut ids_by_name = HashMap::with_capacity(templates.len());
        for (idx, template) in templates.iter_mut().enumerate() {
            let id = TemplateId(idx as u32);
            template.id = id;
            ids_by_name.insert(template.def_name.clone(), id);
        }
        Self {
            templates,
            ids_by_name,
        }
    }

    pub fn template_id_by_name(&self, name: &str) -> Option<TemplateId> {
        self.ids_by_name.get(name).copied()
    }

    pub fn template(&self, id: TemplateId) -> Option<&EntityTemplate> {
        self.templates.get(id.0 as usize)
    }

    pub fn template_by_name(&self, name: &str) -> Option<&EntityTemplate> {
        self.template_id_by_name(name)
            .and_then(|id| self.template(id))
    }

    pub fn templates(&self) -> &[EntityTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
