//! Chat service — writing-assistant panel backed by a canned responder.
//!
//! DESIGN
//! ======
//! Receives a user message, appends it to the in-memory log, picks a reply
//! by keyword matching, and appends the assistant message. Replies that
//! carry markup replace the target document's content, so the preview
//! refreshes with the generated skeleton.
//!
//! The responder is deliberately a stub: no model is called.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::services::document::{self, DocumentError};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Code,
    Suggestion,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String, kind: MessageKind) -> Self {
        Self { id: Uuid::new_v4(), role, content, timestamp: OffsetDateTime::now_utc(), kind: Some(kind) }
    }
}

/// What the responder produced for one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReply {
    pub text: String,
    pub code: Option<String>,
    pub kind: MessageKind,
}

/// Result of one exchange: both appended messages plus any generated code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchange {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Document whose content was replaced by the generated code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_document: Option<Uuid>,
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Append `content` and the responder's reply to the log.
///
/// # Errors
///
/// Returns [`DocumentError::NotFound`] if `document_id` names an unknown
/// document. Nothing is appended in that case.
pub async fn send_message(
    state: &AppState,
    content: &str,
    document_id: Option<Uuid>,
) -> Result<ChatExchange, DocumentError> {
    if let Some(id) = document_id {
        document::get_document(state, id).await?;
    }
    info!(content_len = content.len(), ?document_id, "chat: message received");

    let reply = mock_reply(content);
    let user = ChatMessage::new(ChatRole::User, content.to_owned(), MessageKind::Text);
    let assistant = ChatMessage::new(ChatRole::Assistant, reply.text, reply.kind);

    let updated_document = match (&reply.code, document_id) {
        (Some(code), Some(id)) => {
            document::update_content(state, id, code.clone()).await?;
            Some(id)
        }
        _ => None,
    };

    {
        let mut log = state.chat.write().await;
        log.push(user.clone());
        log.push(assistant.clone());
    }

    Ok(ChatExchange { user, assistant, code: reply.code, updated_document })
}

/// Messages in the order they were appended.
pub async fn list_messages(state: &AppState) -> Vec<ChatMessage> {
    state.chat.read().await.clone()
}

/// Empty the log. Returns how many messages were dropped.
pub async fn clear_messages(state: &AppState) -> usize {
    let mut log = state.chat.write().await;
    let dropped = log.len();
    log.clear();
    info!(dropped, "chat: cleared");
    dropped
}

// =============================================================================
// RESPONDER
// =============================================================================

pub const IEEE_REPLY_CODE: &str = r#"#import "@preview/ieee:1.0.0": ieee

#show: ieee.with(
  title: [论文标题],
  authors: (
    (name: "作者姓名", organization: [研究机构], email: "author@example.com")
  ),
  abstract: [
    这里是摘要内容。简要描述研究的目的、方法、结果和结论。
  ],
  keywords: ("关键词1", "关键词2", "关键词3"),
)

= 引言

这里开始写你的论文内容...

= 相关工作

= 方法

= 实验结果

= 结论"#;

pub const RESUME_REPLY_CODE: &str = r#"#set page(margin: (x: 0.8in, y: 0.6in))
#set text(font: "Arial", size: 11pt)

#align(center)[
  #text(24pt, weight: "bold")[你的姓名]
  #text(12pt)[
    邮箱：your.email@example.com | 电话：+86 138 0000 0000
  ]
]

#line(length: 100%, stroke: 0.5pt)

== 教育背景
*大学名称* #h(1fr) 2020-2024 \
专业名称学士学位 #h(1fr) GPA: 3.8/4.0

== 工作经验
*公司名称* - 职位名称 #h(1fr) 2023-至今
- 工作职责描述
- 主要成就

== 项目经验
*项目名称* #h(1fr) 2023
- 项目描述和你的贡献
- 使用的技术栈

== 技能
*编程语言：* Python, JavaScript, Java
*框架工具：* React, Node.js, Docker"#;

/// Pick a canned reply by keyword. Matching is case-insensitive.
#[must_use]
pub fn mock_reply(input: &str) -> MockReply {
    let lowered = input.to_lowercase();

    if lowered.contains("学术论文") || lowered.contains("ieee") {
        return MockReply {
            text: "我来帮你创建一个IEEE格式的学术论文模板：".to_owned(),
            code: Some(IEEE_REPLY_CODE.to_owned()),
            kind: MessageKind::Code,
        };
    }

    if lowered.contains("简历") {
        return MockReply {
            text: "我为你生成了一个现代简历模板：".to_owned(),
            code: Some(RESUME_REPLY_CODE.to_owned()),
            kind: MessageKind::Code,
        };
    }

    MockReply {
        text: format!(
            "我理解你想要{input}。让我为你提供一些建议和帮助。你可以更具体地描述你的需求，比如：\n\n\
             • 想要什么类型的文档？\n\
             • 有什么特殊的格式要求？\n\
             • 需要包含哪些部分？\n\n\
             这样我就能为你生成更准确的内容了！"
        ),
        code: None,
        kind: MessageKind::Text,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
