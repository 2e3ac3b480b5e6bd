use tabled::{settings::Style, Table, Tabled};

use crate::db::Project;

#[derive(Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "Project Name")]
    pub name: String,
    #[tabled(rename = "Functions")]
    pub functions: i64,
    #[tabled(rename = "Created")]
    pub created: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl ProjectRow {
    pub fn new(project: &Project, functions: i64) -> Self {
        Self {
            name: project.name.clone(),
            functions,
            created: project.created_at.format("%Y-%m-%d %H:%M").to_string(),
            updated: project.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub fn projects_table(rows: &[ProjectRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}
