//! Template catalog — built-in document skeletons plus in-memory user templates.
//!
//! Templates are plain records. There is no variable substitution: the
//! declared variables only describe what a user is expected to edit.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Academic,
    Resume,
    Business,
    Custom,
}

impl TemplateCategory {
    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "academic" => Some(Self::Academic),
            "resume" => Some(Self::Resume),
            "business" => Some(Self::Business),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Array,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    pub default_value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: TemplateCategory,
    pub typst_code: String,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default)]
    pub metadata: TemplateMetadata,
}

/// A template without its identifier, as submitted by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: TemplateCategory,
    pub typst_code: String,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub metadata: TemplateMetadata,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<TemplateCategory>,
    pub typst_code: Option<String>,
    pub variables: Option<Vec<TemplateVariable>>,
    /// `null` removes the preview.
    #[serde(default, deserialize_with = "crate::services::nullable")]
    pub preview: Option<Option<String>>,
    pub metadata: Option<TemplateMetadata>,
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// All templates, optionally restricted to one category. Catalog order is kept.
pub async fn list_templates(state: &AppState, category: Option<TemplateCategory>) -> Vec<Template> {
    state
        .templates
        .read()
        .await
        .iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .cloned()
        .collect()
}

/// # Errors
///
/// Returns [`TemplateError::NotFound`] for an unknown id.
pub async fn get_template(state: &AppState, id: &str) -> Result<Template, TemplateError> {
    state
        .templates
        .read()
        .await
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .ok_or_else(|| TemplateError::NotFound(id.to_owned()))
}

/// Add a user template under a freshly generated id.
pub async fn create_template(state: &AppState, new: NewTemplate) -> Template {
    let template = Template {
        id: Uuid::new_v4().to_string(),
        name: new.name,
        description: new.description,
        category: new.category,
        typst_code: new.typst_code,
        variables: new.variables,
        preview: new.preview,
        metadata: new.metadata,
    };
    state.templates.write().await.push(template.clone());
    info!(template_id = %template.id, name = %template.name, "template: created");
    template
}

/// # Errors
///
/// Returns [`TemplateError::NotFound`] for an unknown id.
pub async fn update_template(state: &AppState, id: &str, patch: TemplatePatch) -> Result<Template, TemplateError> {
    let mut templates = state.templates.write().await;
    let template = templates
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| TemplateError::NotFound(id.to_owned()))?;

    if let Some(name) = patch.name {
        template.name = name;
    }
    if let Some(description) = patch.description {
        template.description = description;
    }
    if let Some(category) = patch.category {
        template.category = category;
    }
    if let Some(code) = patch.typst_code {
        template.typst_code = code;
    }
    if let Some(variables) = patch.variables {
        template.variables = variables;
    }
    if let Some(preview) = patch.preview {
        template.preview = preview;
    }
    if let Some(metadata) = patch.metadata {
        template.metadata = metadata;
    }
    Ok(template.clone())
}

/// # Errors
///
/// Returns [`TemplateError::NotFound`] for an unknown id.
pub async fn delete_template(state: &AppState, id: &str) -> Result<(), TemplateError> {
    let mut templates = state.templates.write().await;
    let before = templates.len();
    templates.retain(|t| t.id != id);
    if templates.len() == before {
        return Err(TemplateError::NotFound(id.to_owned()));
    }
    info!(template_id = %id, "template: deleted");
    Ok(())
}

// =============================================================================
// BUILT-IN CATALOG
// =============================================================================

pub const IEEE_PAPER_CODE: &str = r#"#import "@preview/ieee:1.0.0": ieee

#show: ieee.with(
  title: [论文标题],
  authors: (
    (name: "作者姓名", organization: [研究机构], email: "author@example.com")
  ),
  abstract: [
    这里是摘要内容。简要描述研究的目的、方法、结果和结论。
  ],
  keywords: ("关键词1", "关键词2", "关键词3"),
  bibliography: bibliography("refs.bib"),
)

= 引言

这里是正文内容...

= 相关工作

= 方法

= 实验结果

= 结论

#bibliography("refs.bib")"#;

pub const MODERN_RESUME_CODE: &str = r#"#set page(margin: (x: 0.8in, y: 0.6in))
#set text(font: "Inter", size: 11pt)

#align(center)[
  #text(24pt, weight: "bold")[姓名]
  #text(12pt)[
    邮箱：example@email.com | 电话：+86 123 4567 8900 |
    GitHub：github.com/username
  ]
]

#line(length: 100%, stroke: 0.5pt)

== 教育背景
*大学名称* #h(1fr) 2020-2024 \
计算机科学与技术学士 #h(1fr) GPA: 3.8/4.0

== 工作经验
*公司名称* - 职位 #h(1fr) 2023-至今
- 负责...
- 开发...
- 优化...

== 项目经验
*项目名称* #h(1fr) 2023
- 项目描述...
- 技术栈：React, TypeScript, Node.js

== 技能
*编程语言：* Python, JavaScript, TypeScript, Java
*框架工具：* React, Vue, Node.js, Docker"#;

fn string_variable(name: &str, default: &str, description: &str, required: bool) -> TemplateVariable {
    TemplateVariable {
        name: name.to_owned(),
        kind: VariableType::String,
        default_value: serde_json::Value::String(default.to_owned()),
        description: Some(description.to_owned()),
        required: required.then_some(true),
    }
}

fn builtin_metadata(tags: &[&str]) -> TemplateMetadata {
    TemplateMetadata {
        author: Some("Lychee Team".to_owned()),
        version: Some("1.0.0".to_owned()),
        tags: Some(tags.iter().map(|t| (*t).to_owned()).collect()),
        requirements: None,
    }
}

/// Templates present at startup.
#[must_use]
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "academic-ieee".to_owned(),
            name: "IEEE学术论文".to_owned(),
            description: "IEEE标准格式的学术论文模板".to_owned(),
            category: TemplateCategory::Academic,
            typst_code: IEEE_PAPER_CODE.to_owned(),
            variables: vec![
                string_variable("title", "论文标题", "论文标题", true),
                string_variable("author", "作者姓名", "作者姓名", true),
                string_variable("organization", "研究机构", "研究机构", false),
                string_variable("email", "author@example.com", "邮箱地址", false),
            ],
            preview: None,
            metadata: builtin_metadata(&["学术", "IEEE", "论文"]),
        },
        Template {
            id: "resume-modern".to_owned(),
            name: "现代简历".to_owned(),
            description: "简洁现代的简历模板".to_owned(),
            category: TemplateCategory::Resume,
            typst_code: MODERN_RESUME_CODE.to_owned(),
            variables: vec![
                string_variable("name", "姓名", "姓名", true),
                string_variable("email", "example@email.com", "邮箱", true),
                string_variable("phone", "+86 123 4567 8900", "电话", false),
                string_variable("github", "github.com/username", "GitHub地址", false),
            ],
            preview: None,
            metadata: builtin_metadata(&["简历", "现代", "简洁"]),
        },
    ]
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
