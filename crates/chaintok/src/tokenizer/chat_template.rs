//! # Chat Templates
//!
//! Chat prompts are rendered by a [`ChatTemplateRenderer`]; with the
//! `chat-template` feature (on by default) that is [`MiniJinjaRenderer`].

use crate::errors::{Result, TokenizerError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One chat turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, `assistant`, ...
    pub role: String,

    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a message.
    pub fn new<R: Into<String>, C: Into<String>>(
        role: R,
        content: C,
    ) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// A `system` message.
    pub fn system<C: Into<String>>(content: C) -> Self {
        Self::new("system", content)
    }

    /// A `user` message.
    pub fn user<C: Into<String>>(content: C) -> Self {
        Self::new("user", content)
    }

    /// An `assistant` message.
    pub fn assistant<C: Into<String>>(content: C) -> Self {
        Self::new("assistant", content)
    }
}

/// Options for rendering a chat prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatTemplateOptions {
    /// Template source; overrides the configured template.
    pub template: Option<String>,

    /// Name of a configured template; `None` for the default.
    pub template_name: Option<String>,

    /// Open an assistant turn at the end.
    pub add_generation_prompt: bool,
}

impl ChatTemplateOptions {
    /// Use this template source.
    pub fn with_template<S: Into<String>>(
        self,
        template: S,
    ) -> Self {
        Self {
            template: Some(template.into()),
            ..self
        }
    }

    /// Use the configured template with this name.
    pub fn with_template_name<S: Into<String>>(
        self,
        name: S,
    ) -> Self {
        Self {
            template_name: Some(name.into()),
            ..self
        }
    }

    /// Set `add_generation_prompt`.
    pub fn with_add_generation_prompt(
        self,
        add_generation_prompt: bool,
    ) -> Self {
        Self {
            add_generation_prompt,
            ..self
        }
    }
}

/// The variables a template sees.
#[derive(Clone, Debug, Serialize)]
pub struct ChatContext<'a> {
    /// The conversation.
    pub messages: &'a [ChatMessage],

    /// Open an assistant turn at the end.
    pub add_generation_prompt: bool,

    /// The BOS token, or `""`.
    pub bos_token: &'a str,

    /// The EOS token, or `""`.
    pub eos_token: &'a str,

    /// The UNK token, or `""`.
    pub unk_token: &'a str,

    /// The PAD token, or `""`.
    pub pad_token: &'a str,
}

/// A template engine.
pub trait ChatTemplateRenderer: Send + Sync + Debug {
    /// Render `template` against `context`.
    fn render(
        &self,
        template: &str,
        context: &ChatContext<'_>,
    ) -> Result<String>;
}

/// Renders Jinja templates with [`minijinja`].
///
/// Blocks are trimmed the way hub templates expect, and templates may call
/// `raise_exception(message)` to reject a conversation.
#[cfg(feature = "chat-template")]
#[derive(Clone, Copy, Debug, Default)]
pub struct MiniJinjaRenderer;

#[cfg(feature = "chat-template")]
fn raise_exception(message: String) -> std::result::Result<String, minijinja::Error> {
    Err(minijinja::Error::new(
        minijinja::ErrorKind::InvalidOperation,
        message,
    ))
}

#[cfg(feature = "chat-template")]
impl ChatTemplateRenderer for MiniJinjaRenderer {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    fn render(
        &self,
        template: &str,
        context: &ChatContext<'_>,
    ) -> Result<String> {
        let mut env = minijinja::Environment::new();
        env.set_recursion_limit(100);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_function("raise_exception", raise_exception);
        env.add_template_owned("chat", template.to_string())
            .map_err(|e| TokenizerError::ChatTemplate(e.to_string()))?;

        env.get_template("chat")
            .and_then(|tmpl| tmpl.render(context))
            .map_err(|e| TokenizerError::ChatTemplate(e.to_string()))
    }
}

#[cfg(all(test, feature = "chat-template"))]
mod tests {
    use super::*;

    const CHATML: &str = "{% for m in messages %}<|im_start|>{{ m.role }}\n{{ m.content }}<|im_end|>\n{% endfor %}{% if add_generation_prompt %}<|im_start|>assistant\n{% endif %}";

    fn context<'a>(
        messages: &'a [ChatMessage],
        add_generation_prompt: bool,
    ) -> ChatContext<'a> {
        ChatContext {
            messages,
            add_generation_prompt,
            bos_token: "<s>",
            eos_token: "</s>",
            unk_token: "",
            pad_token: "",
        }
    }

    #[test]
    fn test_render_chatml() {
        let messages = vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")];
        let out = MiniJinjaRenderer
            .render(CHATML, &context(&messages, true))
            .unwrap();
        assert_eq!(
            out,
            "<|im_start|>system\nBe brief.<|im_end|>\n<|im_start|>user\nHi<|im_end|>\n<|im_start|>assistant\n"
        );
    }

    #[test]
    fn test_trim_blocks_and_tokens() {
        let template = "{{ bos_token }}\n{% for m in messages %}\n{{ m.content }}{{ eos_token }}\n{% endfor %}\n";
        let messages = vec![ChatMessage::user("a"), ChatMessage::assistant("b")];
        let out = MiniJinjaRenderer
            .render(template, &context(&messages, false))
            .unwrap();
        assert_eq!(out, "<s>\na</s>\nb</s>\n");
    }

    #[test]
    fn test_errors() {
        let messages = vec![ChatMessage::user("x")];
        let raised = MiniJinjaRenderer.render(
            "{{ raise_exception('roles must alternate') }}",
            &context(&messages, false),
        );
        assert!(matches!(raised, Err(TokenizerError::ChatTemplate(ref m)) if m.contains("roles must alternate")));

        let syntax = MiniJinjaRenderer.render("{% for %}", &context(&messages, false));
        assert!(matches!(syntax, Err(TokenizerError::ChatTemplate(_))));
    }
}
