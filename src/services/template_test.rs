use super::*;
use crate::state::test_helpers;

fn new_template(name: &str, category: TemplateCategory) -> NewTemplate {
    NewTemplate {
        name: name.to_owned(),
        description: String::new(),
        category,
        typst_code: "= Memo".to_owned(),
        variables: Vec::new(),
        preview: None,
        metadata: TemplateMetadata::default(),
    }
}

#[test]
fn category_parses_lowercase_only() {
    assert_eq!(TemplateCategory::from_str("academic"), Some(TemplateCategory::Academic));
    assert_eq!(TemplateCategory::from_str("business"), Some(TemplateCategory::Business));
    assert_eq!(TemplateCategory::from_str("Resume"), None);
    assert_eq!(TemplateCategory::from_str(""), None);
}

#[test]
fn builtin_catalog_has_two_entries() {
    let templates = builtin_templates();
    assert_eq!(templates.len(), 2);
    let ieee = &templates[0];
    assert_eq!(ieee.category, TemplateCategory::Academic);
    assert!(ieee.typst_code.contains("ieee.with"));
    assert_eq!(ieee.variables.len(), 4);
    assert_eq!(ieee.variables[0].required, Some(true));
    assert_eq!(ieee.variables[2].required, None);
}

#[test]
fn template_serializes_camel_case() {
    let json = serde_json::to_value(&builtin_templates()[1]).unwrap();
    assert_eq!(json["category"], "resume");
    assert!(json["typstCode"].as_str().unwrap().contains("教育背景"));
    assert_eq!(json["variables"][0]["type"], "string");
    assert_eq!(json["variables"][0]["defaultValue"], "姓名");
}

#[tokio::test]
async fn list_filters_by_category() {
    let state = test_helpers::test_app_state();
    assert_eq!(list_templates(&state, None).await.len(), 2);

    let resumes = list_templates(&state, Some(TemplateCategory::Resume)).await;
    assert_eq!(resumes.len(), 1);
    assert_eq!(resumes[0].id, "resume-modern");

    assert!(list_templates(&state, Some(TemplateCategory::Business)).await.is_empty());
}

#[tokio::test]
async fn get_unknown_template_is_not_found() {
    let state = test_helpers::test_app_state();
    assert!(get_template(&state, "academic-ieee").await.is_ok());
    assert!(matches!(get_template(&state, "nope").await, Err(TemplateError::NotFound(_))));
}

#[tokio::test]
async fn create_assigns_fresh_ids() {
    let state = test_helpers::test_app_state();
    let a = create_template(&state, new_template("Memo", TemplateCategory::Business)).await;
    let b = create_template(&state, new_template("Memo", TemplateCategory::Business)).await;
    assert_ne!(a.id, b.id);
    assert_eq!(list_templates(&state, Some(TemplateCategory::Business)).await.len(), 2);
}

#[tokio::test]
async fn update_applies_only_present_fields() {
    let state = test_helpers::test_app_state();
    let patch = TemplatePatch { name: Some("Resume v2".into()), ..TemplatePatch::default() };
    let updated = update_template(&state, "resume-modern", patch).await.unwrap();
    assert_eq!(updated.name, "Resume v2");
    assert_eq!(updated.category, TemplateCategory::Resume);
    assert!(updated.typst_code.contains("教育背景"));
    assert_eq!(get_template(&state, "resume-modern").await.unwrap().name, "Resume v2");
}

#[tokio::test]
async fn update_unknown_template_is_not_found() {
    let state = test_helpers::test_app_state();
    let result = update_template(&state, "missing", TemplatePatch::default()).await;
    assert!(matches!(result, Err(TemplateError::NotFound(_))));
}

#[tokio::test]
async fn delete_removes_template_once() {
    let state = test_helpers::test_app_state();
    delete_template(&state, "academic-ieee").await.unwrap();
    assert!(get_template(&state, "academic-ieee").await.is_err());
    assert!(matches!(delete_template(&state, "academic-ieee").await, Err(TemplateError::NotFound(_))));
}

#[tokio::test]
async fn patch_sets_and_clears_preview() {
    let state = test_helpers::test_app_state();
    let patch: TemplatePatch = serde_json::from_value(serde_json::json!({ "preview": "<svg/>" })).unwrap();
    let updated = update_template(&state, "resume-modern", patch).await.unwrap();
    assert_eq!(updated.preview.as_deref(), Some("<svg/>"));

    let untouched = update_template(&state, "resume-modern", TemplatePatch::default()).await.unwrap();
    assert_eq!(untouched.preview.as_deref(), Some("<svg/>"));

    let patch: TemplatePatch = serde_json::from_value(serde_json::json!({ "preview": null })).unwrap();
    let cleared = update_template(&state, "resume-modern", patch).await.unwrap();
    assert!(cleared.preview.is_none());
}
