//! # Tokenizer
//!
//! [`Tokenizer`] runs the full pipeline:
//!
//! ```text
//! raw text
//!   -> split raw added tokens
//!   -> per text span: normalize -> split normalized added tokens
//!                     -> pre-tokenize -> model
//!   -> truncate -> post-process -> pad
//! ```
//!
//! It is immutable once built and can be shared across threads; the only
//! interior state is the BPE word cache.

pub mod chat_template;
pub mod truncation;

pub use chat_template::{ChatContext, ChatMessage, ChatTemplateOptions, ChatTemplateRenderer};
#[cfg(feature = "chat-template")]
pub use chat_template::MiniJinjaRenderer;
pub use truncation::{PaddingParams, PaddingStrategy, TruncationParams, TruncationStrategy};

use crate::config::{
    ChatTemplateConfig, NamedChatTemplate, TokenizerConfig, TokenizerFiles, TokenizerJson,
};
use crate::decoders::{Decoder, cleanup_tokenization_spaces};
use crate::encoding::Encoding;
use crate::errors::{Result, TokenizerError};
use crate::models::Model;
use crate::normalizers::Normalizer;
use crate::pre_tokenizers::{PreTokenizedString, PreTokenizer};
use crate::processors::{DefaultProcessor, PostProcessor};
use crate::types::{StringToTokenMap, TokenType, token_to_u64, try_token_from_u64};
use crate::vocab::{AddedToken, AddedVocabulary, Segment};
use ahash::{AHashMap, AHashSet};
use std::path::Path;
use std::sync::Arc;

/// The structural role of a special token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialRole {
    /// Beginning of sequence.
    Bos,
    /// End of sequence.
    Eos,
    /// Unknown.
    Unk,
    /// Padding.
    Pad,
    /// Classifier.
    Cls,
    /// Separator.
    Sep,
    /// Mask.
    Mask,
}

/// A tokenizer pipeline.
#[derive(Clone, Debug)]
pub struct Tokenizer<T: TokenType = u32> {
    normalizer: Option<Normalizer>,
    pre_tokenizer: Option<PreTokenizer>,
    model: Model<T>,
    post_processor: PostProcessor<T>,
    decoder: Option<Decoder>,
    added_vocab: AddedVocabulary<T>,

    roles: AHashMap<SpecialRole, (String, T)>,
    special_ids: AHashSet<T>,

    truncation: Option<TruncationParams>,
    padding: Option<PaddingParams>,

    chat_templates: Option<ChatTemplateConfig>,
    renderer: Option<Arc<dyn ChatTemplateRenderer>>,

    clean_up_tokenization_spaces: bool,
    model_max_length: Option<usize>,
    parallel: bool,
}

/// Programmatic construction of a [`Tokenizer`].
#[derive(Clone, Debug)]
pub struct TokenizerBuilder<T: TokenType = u32> {
    model: Model<T>,
    normalizer: Option<Normalizer>,
    pre_tokenizer: Option<PreTokenizer>,
    post_processor: Option<PostProcessor<T>>,
    decoder: Option<Decoder>,
    added_tokens: Vec<(AddedToken, T)>,
    extra_specials: Vec<AddedToken>,
    roles: Vec<(SpecialRole, AddedToken)>,
    truncation: Option<TruncationParams>,
    padding: Option<PaddingParams>,
    chat_templates: Option<ChatTemplateConfig>,
    renderer: Option<Arc<dyn ChatTemplateRenderer>>,
    add_bos_token: bool,
    add_eos_token: bool,
    clean_up_tokenization_spaces: bool,
    model_max_length: Option<usize>,
    parallel: bool,
}

impl<T: TokenType> TokenizerBuilder<T> {
    /// Start from a subword model; every other stage is optional.
    pub fn new(model: Model<T>) -> Self {
        #[cfg(feature = "chat-template")]
        let renderer: Option<Arc<dyn ChatTemplateRenderer>> = Some(Arc::new(MiniJinjaRenderer));
        #[cfg(not(feature = "chat-template"))]
        let renderer: Option<Arc<dyn ChatTemplateRenderer>> = None;

        Self {
            model,
            normalizer: None,
            pre_tokenizer: None,
            post_processor: None,
            decoder: None,
            added_tokens: Vec::new(),
            extra_specials: Vec::new(),
            roles: Vec::new(),
            truncation: None,
            padding: None,
            chat_templates: None,
            renderer,
            add_bos_token: false,
            add_eos_token: false,
            clean_up_tokenization_spaces: false,
            model_max_length: None,
            parallel: crate::DEFAULT_PARALLEL,
        }
    }

    /// Set the normalizer.
    pub fn with_normalizer(
        self,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            normalizer: Some(normalizer),
            ..self
        }
    }

    /// Set the pre-tokenizer.
    pub fn with_pre_tokenizer(
        self,
        pre_tokenizer: PreTokenizer,
    ) -> Self {
        Self {
            pre_tokenizer: Some(pre_tokenizer),
            ..self
        }
    }

    /// Set the post-processor; without one, BOS/EOS wrapping is used.
    pub fn with_post_processor(
        self,
        post_processor: PostProcessor<T>,
    ) -> Self {
        Self {
            post_processor: Some(post_processor),
            ..self
        }
    }

    /// Set the decoder; without one, tokens are joined with spaces.
    pub fn with_decoder(
        self,
        decoder: Decoder,
    ) -> Self {
        Self {
            decoder: Some(decoder),
            ..self
        }
    }

    /// Add a token with a fixed id.
    pub fn with_added_token(
        mut self,
        token: AddedToken,
        id: T,
    ) -> Self {
        self.added_tokens.push((token, id));
        self
    }

    /// Bind a special-token role.
    ///
    /// The token's id is taken from the added tokens, then the model
    /// vocabulary; an unknown token gets the next free id.
    pub fn with_special_token(
        mut self,
        role: SpecialRole,
        token: AddedToken,
    ) -> Self {
        self.roles.push((role, token));
        self
    }

    /// Add a special token with no role.
    pub fn with_additional_special_token(
        mut self,
        token: AddedToken,
    ) -> Self {
        self.extra_specials.push(token);
        self
    }

    /// Enable truncation.
    pub fn with_truncation(
        self,
        truncation: Option<TruncationParams>,
    ) -> Self {
        Self { truncation, ..self }
    }

    /// Enable padding.
    pub fn with_padding(
        self,
        padding: Option<PaddingParams>,
    ) -> Self {
        Self { padding, ..self }
    }

    /// Set the configured chat template(s).
    pub fn with_chat_templates(
        self,
        chat_templates: Option<ChatTemplateConfig>,
    ) -> Self {
        Self {
            chat_templates,
            ..self
        }
    }

    /// Make `template` the default chat template, keeping named ones.
    pub fn with_default_chat_template<S: Into<String>>(
        self,
        template: S,
    ) -> Self {
        let template = template.into();
        let chat_templates = match self.chat_templates {
            Some(ChatTemplateConfig::Named(mut list)) => {
                list.retain(|t| t.name != "default");
                list.push(NamedChatTemplate {
                    name: "default".to_string(),
                    template,
                });
                ChatTemplateConfig::Named(list)
            }
            _ => ChatTemplateConfig::Single(template),
        };
        Self {
            chat_templates: Some(chat_templates),
            ..self
        }
    }

    /// Replace the template engine.
    pub fn with_chat_renderer(
        self,
        renderer: Arc<dyn ChatTemplateRenderer>,
    ) -> Self {
        Self {
            renderer: Some(renderer),
            ..self
        }
    }

    /// Prepend BOS in the default post-processor.
    pub fn with_add_bos_token(
        self,
        add_bos_token: bool,
    ) -> Self {
        Self {
            add_bos_token,
            ..self
        }
    }

    /// Append EOS in the default post-processor.
    pub fn with_add_eos_token(
        self,
        add_eos_token: bool,
    ) -> Self {
        Self {
            add_eos_token,
            ..self
        }
    }

    /// Clean up spaces before punctuation after decoding.
    pub fn with_clean_up_tokenization_spaces(
        self,
        clean_up_tokenization_spaces: bool,
    ) -> Self {
        Self {
            clean_up_tokenization_spaces,
            ..self
        }
    }

    /// Record the model's input length limit.
    pub fn with_model_max_length(
        self,
        model_max_length: Option<usize>,
    ) -> Self {
        Self {
            model_max_length,
            ..self
        }
    }

    /// Encode batches in parallel.
    pub fn with_parallel(
        self,
        parallel: bool,
    ) -> Self {
        Self { parallel, ..self }
    }

    /// Start from the parsed configuration documents.
    pub fn from_documents(
        json: &TokenizerJson,
        config: Option<&TokenizerConfig>,
    ) -> Result<Self> {
        let mut builder = Self::new(Model::from_config(&json.model)?);

        if let Some(c) = &json.normalizer {
            builder = builder.with_normalizer(Normalizer::from_config(c)?);
        }
        if let Some(c) = &json.pre_tokenizer {
            builder = builder.with_pre_tokenizer(PreTokenizer::from_config(c)?);
        }
        if let Some(c) = &json.post_processor {
            builder = builder.with_post_processor(PostProcessor::from_config(c)?);
        }
        if let Some(c) = &json.decoder {
            builder = builder.with_decoder(Decoder::from_config(c)?);
        }
        for entry in &json.added_tokens {
            builder = builder.with_added_token(entry.token.clone(), try_token_from_u64(entry.id)?);
        }
        builder = builder
            .with_truncation(json.truncation.clone())
            .with_padding(json.padding.clone());

        let Some(config) = config else {
            return Ok(builder);
        };

        let mut decoder_entries = Vec::with_capacity(config.added_tokens_decoder.len());
        for (key, token) in &config.added_tokens_decoder {
            let id = key.parse::<u64>().map_err(|_| {
                TokenizerError::config("added_tokens_decoder", format!("bad token id {key:?}"))
            })?;
            decoder_entries.push((try_token_from_u64::<T>(id)?, token.clone()));
        }
        decoder_entries.sort_by_key(|(id, _)| *id);
        for (id, token) in decoder_entries {
            if !builder.added_tokens.iter().any(|(_, known)| *known == id) {
                builder = builder.with_added_token(token, id);
            }
        }

        let roles = [
            (SpecialRole::Bos, &config.bos_token),
            (SpecialRole::Eos, &config.eos_token),
            (SpecialRole::Unk, &config.unk_token),
            (SpecialRole::Pad, &config.pad_token),
            (SpecialRole::Cls, &config.cls_token),
            (SpecialRole::Sep, &config.sep_token),
            (SpecialRole::Mask, &config.mask_token),
        ];
        for (role, value) in roles {
            if let Some(value) = value {
                builder = builder.with_special_token(role, value.to_added_token());
            }
        }
        for value in &config.additional_special_tokens {
            builder = builder.with_additional_special_token(value.to_added_token());
        }

        Ok(builder
            .with_chat_templates(config.chat_template.clone())
            .with_add_bos_token(config.add_bos_token.unwrap_or(false))
            .with_add_eos_token(config.add_eos_token.unwrap_or(false))
            .with_clean_up_tokenization_spaces(config.clean_up_tokenization_spaces.unwrap_or(false))
            .with_model_max_length(config.max_length()))
    }

    /// Resolve the id of a special token, registering it as an added token.
    fn resolve_special(
        &mut self,
        token: AddedToken,
        next_id: &mut u64,
    ) -> Result<T> {
        if let Some((known, id)) = self
            .added_tokens
            .iter_mut()
            .find(|(t, _)| t.content == token.content)
        {
            known.special = true;
            return Ok(*id);
        }

        let id = match self.model.token_to_id(&token.content) {
            Some(id) => id,
            None => {
                let id = try_token_from_u64(*next_id)?;
                log::warn!(
                    "special token {:?} is not in the vocabulary; assigning id {}",
                    token.content,
                    next_id
                );
                *next_id += 1;
                id
            }
        };
        self.added_tokens.push((token, id));
        Ok(id)
    }

    /// Build the tokenizer.
    pub fn build(mut self) -> Result<Tokenizer<T>> {
        let mut next_id = self
            .model
            .vocab()
            .max_token()
            .map(token_to_u64)
            .into_iter()
            .chain(self.added_tokens.iter().map(|(_, id)| token_to_u64(*id)))
            .max()
            .map_or(0, |max| max + 1);

        let mut roles = AHashMap::new();
        for (role, token) in std::mem::take(&mut self.roles) {
            let content = token.content.clone();
            let id = self.resolve_special(token, &mut next_id)?;
            roles.insert(role, (content, id));
        }
        for token in std::mem::take(&mut self.extra_specials) {
            self.resolve_special(token, &mut next_id)?;
        }

        let added_vocab = AddedVocabulary::new(self.added_tokens, self.normalizer.as_ref())?;
        let special_ids: AHashSet<T> = added_vocab
            .tokens()
            .filter(|(t, _)| t.special)
            .map(|(_, id)| *id)
            .chain(roles.values().map(|(_, id)| *id))
            .collect();

        let post_processor = match self.post_processor {
            Some(p) => p,
            None => PostProcessor::Default(DefaultProcessor::new(
                roles.get(&SpecialRole::Bos).cloned(),
                roles.get(&SpecialRole::Eos).cloned(),
                roles.get(&SpecialRole::Sep).cloned(),
                self.add_bos_token,
                self.add_eos_token,
            )),
        };

        log::info!(
            "built tokenizer: {} model tokens, {} added tokens, {} special ids",
            self.model.vocab_size(),
            added_vocab.len(),
            special_ids.len()
        );
        log::debug!(
            "pipeline: normalizer={} pre_tokenizer={} decoder={} truncation={} padding={}",
            self.normalizer.is_some(),
            self.pre_tokenizer.is_some(),
            self.decoder.is_some(),
            self.truncation.is_some(),
            self.padding.is_some()
        );

        Ok(Tokenizer {
            normalizer: self.normalizer,
            pre_tokenizer: self.pre_tokenizer,
            model: self.model,
            post_processor,
            decoder: self.decoder,
            added_vocab,
            roles,
            special_ids,
            truncation: self.truncation,
            padding: self.padding,
            chat_templates: self.chat_templates,
            renderer: self.renderer,
            clean_up_tokenization_spaces: self.clean_up_tokenization_spaces,
            model_max_length: self.model_max_length,
            parallel: self.parallel,
        })
    }
}

impl<T: TokenType> Tokenizer<T> {
    /// Build from the two JSON documents.
    pub fn from_json_str(
        tokenizer_json: &str,
        tokenizer_config: Option<&str>,
    ) -> Result<Self> {
        let json = TokenizerJson::from_json_str(tokenizer_json)?;
        let config = tokenizer_config
            .map(TokenizerConfig::from_json_str)
            .transpose()?;
        TokenizerBuilder::from_documents(&json, config.as_ref())?.build()
    }

    /// Build from raw tokenizer files.
    pub fn from_tokenizer_files(files: &TokenizerFiles) -> Result<Self> {
        let json = TokenizerJson::from_json_str(&files.tokenizer_json)?;
        let config = files
            .tokenizer_config
            .as_deref()
            .map(TokenizerConfig::from_json_str)
            .transpose()?;

        let mut builder = TokenizerBuilder::from_documents(&json, config.as_ref())?;
        if let Some(template) = &files.chat_template {
            builder = builder.with_default_chat_template(template.as_str());
        }
        builder.build()
    }

    /// Load from explicit file paths.
    pub fn from_files<P, Q>(
        tokenizer_json: P,
        tokenizer_config: Option<Q>,
    ) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let files = TokenizerFiles::from_files(tokenizer_json, tokenizer_config)?;
        Ok(Self::from_tokenizer_files(&files)?)
    }

    /// Load from a model directory.
    ///
    /// Reads `tokenizer.json`, and `tokenizer_config.json` and
    /// `chat_template.jinja` when present.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let files = TokenizerFiles::from_dir(dir)?;
        Ok(Self::from_tokenizer_files(&files)?)
    }

    /// The subword model.
    pub fn model(&self) -> &Model<T> {
        &self.model
    }

    /// The normalizer, if any.
    pub fn normalizer(&self) -> Option<&Normalizer> {
        self.normalizer.as_ref()
    }

    /// The pre-tokenizer, if any.
    pub fn pre_tokenizer(&self) -> Option<&PreTokenizer> {
        self.pre_tokenizer.as_ref()
    }

    /// The post-processor.
    pub fn post_processor(&self) -> &PostProcessor<T> {
        &self.post_processor
    }

    /// The decoder, if any.
    pub fn decoder(&self) -> Option<&Decoder> {
        self.decoder.as_ref()
    }

    /// The added tokens.
    pub fn added_vocabulary(&self) -> &AddedVocabulary<T> {
        &self.added_vocab
    }

    /// The truncation settings.
    pub fn truncation(&self) -> Option<&TruncationParams> {
        self.truncation.as_ref()
    }

    /// The padding settings.
    pub fn padding(&self) -> Option<&PaddingParams> {
        self.padding.as_ref()
    }

    /// The model's input length limit, if known.
    pub fn model_max_length(&self) -> Option<usize> {
        self.model_max_length
    }

    /// Replace the truncation settings.
    pub fn set_truncation(
        &mut self,
        truncation: Option<TruncationParams>,
    ) {
        self.truncation = truncation;
    }

    /// Replace the padding settings.
    pub fn set_padding(
        &mut self,
        padding: Option<PaddingParams>,
    ) {
        self.padding = padding;
    }

    /// Run one input through the pipeline, up to the model.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, text)))]
    fn encode_sequence(
        &self,
        text: &str,
        type_id: u32,
    ) -> Result<Encoding<T>> {
        let mut encoding =
            Encoding::with_capacity((text.len() as f64 / crate::BYTES_PER_TOKEN_HINT) as usize + 1);

        for segment in self.added_vocab.split_raw(text) {
            let (raw, raw_offset) = match segment {
                Segment::Added { content, id, special } => {
                    encoding.push(id, content, type_id, special);
                    continue;
                }
                Segment::Text { text, offset } => (text, offset),
            };

            let normalized = match &self.normalizer {
                Some(n) => n.normalize(raw)?,
                None => raw.to_string(),
            };
            for sub in self.added_vocab.split_normalized(&normalized) {
                match sub {
                    Segment::Added { content, id, special } => {
                        encoding.push(id, content, type_id, special);
                    }
                    Segment::Text { text, offset } => {
                        let mut pts = PreTokenizedString::new(text, raw_offset == 0 && offset == 0);
                        if let Some(p) = &self.pre_tokenizer {
                            p.pre_tokenize(&mut pts)?;
                        }
                        for split in pts.splits() {
                            for token in self.model.tokenize(&split.text)? {
                                encoding.push(token.id, token.value, type_id, false);
                            }
                        }
                    }
                }
            }
        }
        Ok(encoding)
    }

    fn encode_unpadded(
        &self,
        text: &str,
        pair: Option<&str>,
        add_special_tokens: bool,
    ) -> Result<Encoding<T>> {
        let encoding = self.encode_sequence(text, 0)?;
        let pair = pair.map(|p| self.encode_sequence(p, 1)).transpose()?;

        let (encoding, pair) = match &self.truncation {
            Some(params) => {
                let added = if add_special_tokens {
                    self.post_processor.added_tokens(pair.is_some())
                } else {
                    0
                };
                params.apply(encoding, pair, added)?
            }
            None => (encoding, pair),
        };
        Ok(self.post_processor.process(encoding, pair, add_special_tokens))
    }

    /// Encode one input (or a pair) into a full [`Encoding`].
    pub fn encode_to_encoding(
        &self,
        text: &str,
        pair: Option<&str>,
        add_special_tokens: bool,
    ) -> Result<Encoding<T>> {
        let mut encoding = self.encode_unpadded(text, pair, add_special_tokens)?;
        if let Some(padding) = &self.padding {
            padding.apply(std::slice::from_mut(&mut encoding))?;
        }
        Ok(encoding)
    }

    /// Encode text into token ids.
    pub fn encode(
        &self,
        text: &str,
        add_special_tokens: bool,
    ) -> Result<Vec<T>> {
        Ok(self
            .encode_to_encoding(text, None, add_special_tokens)?
            .into_ids())
    }

    /// Encode an input pair into token ids.
    pub fn encode_pair(
        &self,
        text: &str,
        pair: &str,
        add_special_tokens: bool,
    ) -> Result<Vec<T>> {
        Ok(self
            .encode_to_encoding(text, Some(pair), add_special_tokens)?
            .into_ids())
    }

    /// Encode a batch; padding applies across the whole batch.
    pub fn encode_batch<S: AsRef<str> + Sync>(
        &self,
        batch: &[S],
        add_special_tokens: bool,
    ) -> Result<Vec<Encoding<T>>> {
        let encode = |text: &S| self.encode_unpadded(text.as_ref(), None, add_special_tokens);

        #[cfg(feature = "rayon")]
        let encodings: Result<Vec<_>> = if self.parallel {
            use rayon::prelude::*;
            batch.par_iter().map(encode).collect()
        } else {
            batch.iter().map(encode).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let encodings: Result<Vec<_>> = batch.iter().map(encode).collect();

        let mut encodings = encodings?;
        if let Some(padding) = &self.padding {
            padding.apply(&mut encodings)?;
        }
        Ok(encodings)
    }

    /// Split text into token strings, without special tokens.
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Result<Vec<String>> {
        Ok(self.encode_sequence(text, 0)?.tokens().to_vec())
    }

    /// Decode token ids into text.
    ///
    /// Any id missing from the vocabulary fails the whole call.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, ids)))]
    pub fn decode(
        &self,
        ids: &[T],
        skip_special_tokens: bool,
    ) -> Result<String> {
        let mut tokens = Vec::with_capacity(ids.len());
        for &id in ids {
            if skip_special_tokens && self.special_ids.contains(&id) {
                continue;
            }
            let token = self
                .id_to_token(id)
                .ok_or(TokenizerError::UnknownId(token_to_u64(id)))?;
            tokens.push(token.to_string());
        }

        let text = match &self.decoder {
            Some(decoder) => decoder.decode(tokens)?,
            None => tokens.join(" "),
        };
        Ok(if self.clean_up_tokenization_spaces {
            cleanup_tokenization_spaces(&text)
        } else {
            text
        })
    }

    /// Decode a batch of id sequences.
    pub fn decode_batch<S: AsRef<[T]> + Sync>(
        &self,
        batch: &[S],
        skip_special_tokens: bool,
    ) -> Result<Vec<String>> {
        let decode = |ids: &S| self.decode(ids.as_ref(), skip_special_tokens);

        #[cfg(feature = "rayon")]
        if self.parallel {
            use rayon::prelude::*;
            return batch.par_iter().map(decode).collect();
        }
        batch.iter().map(decode).collect()
    }

    /// Look up a token id; added tokens win over the model vocabulary.
    pub fn token_to_id(
        &self,
        token: &str,
    ) -> Option<T> {
        self.added_vocab
            .token_to_id(token)
            .or_else(|| self.model.token_to_id(token))
    }

    /// Look up a token string.
    pub fn id_to_token(
        &self,
        id: T,
    ) -> Option<&str> {
        self.added_vocab
            .id_to_token(id)
            .or_else(|| self.model.id_to_token(id))
    }

    /// The number of distinct ids, added tokens included.
    pub fn vocab_size(&self) -> usize {
        let extra = self
            .added_vocab
            .tokens()
            .filter(|(_, id)| self.model.id_to_token(*id).is_none())
            .map(|(_, id)| *id)
            .collect::<AHashSet<T>>()
            .len();
        self.model.vocab_size() + extra
    }

    /// The full token to id map, added tokens included.
    pub fn get_vocab(&self) -> StringToTokenMap<T> {
        let mut vocab: StringToTokenMap<T> = self.model.vocab().token_map().clone();
        for (token, id) in self.added_vocab.tokens() {
            vocab.insert(token.content.clone(), *id);
        }
        vocab
    }

    /// The token bound to a special role.
    pub fn special_token(
        &self,
        role: SpecialRole,
    ) -> Option<&str> {
        self.roles.get(&role).map(|(s, _)| s.as_str())
    }

    /// The id bound to a special role.
    pub fn special_token_id(
        &self,
        role: SpecialRole,
    ) -> Option<T> {
        self.roles.get(&role).map(|(_, id)| *id)
    }

    /// Is this id a special token?
    pub fn is_special_id(
        &self,
        id: T,
    ) -> bool {
        self.special_ids.contains(&id)
    }

    /// The BOS token.
    pub fn bos_token(&self) -> Option<&str> {
        self.special_token(SpecialRole::Bos)
    }

    /// The BOS id.
    pub fn bos_token_id(&self) -> Option<T> {
        self.special_token_id(SpecialRole::Bos)
    }

    /// The EOS token.
    pub fn eos_token(&self) -> Option<&str> {
        self.special_token(SpecialRole::Eos)
    }

    /// The EOS id.
    pub fn eos_token_id(&self) -> Option<T> {
        self.special_token_id(SpecialRole::Eos)
    }

    /// The unknown token; falls back to the model's.
    pub fn unk_token(&self) -> Option<&str> {
        self.special_token(SpecialRole::Unk)
            .or_else(|| self.model.unk_token())
    }

    /// The unknown id; falls back to the model's.
    pub fn unk_token_id(&self) -> Option<T> {
        self.special_token_id(SpecialRole::Unk)
            .or_else(|| self.model.unk_token_id())
    }

    /// The padding token; falls back to the padding settings.
    pub fn pad_token(&self) -> Option<&str> {
        self.special_token(SpecialRole::Pad)
            .or_else(|| self.padding.as_ref().map(|p| p.pad_token.as_str()))
    }

    /// The padding id; falls back to the padding settings.
    pub fn pad_token_id(&self) -> Option<T> {
        self.special_token_id(SpecialRole::Pad).or_else(|| {
            self.padding
                .as_ref()
                .and_then(|p| try_token_from_u64(p.pad_id).ok())
        })
    }

    /// Render a conversation into prompt text.
    ///
    /// The template is `options.template` if given, else the configured
    /// template named by `options.template_name` (or the default).
    pub fn render_chat_template(
        &self,
        messages: &[ChatMessage],
        options: &ChatTemplateOptions,
    ) -> Result<String> {
        let template = match &options.template {
            Some(t) => t.as_str(),
            None => self
                .chat_templates
                .as_ref()
                .and_then(|c| c.get(options.template_name.as_deref()))
                .ok_or(TokenizerError::MissingChatTemplate)?,
        };
        let renderer = self.renderer.as_ref().ok_or_else(|| {
            TokenizerError::ChatTemplate("no chat template engine configured".to_string())
        })?;

        let context = ChatContext {
            messages,
            add_generation_prompt: options.add_generation_prompt,
            bos_token: self.bos_token().unwrap_or(""),
            eos_token: self.eos_token().unwrap_or(""),
            unk_token: self.unk_token().unwrap_or(""),
            pad_token: self.special_token(SpecialRole::Pad).unwrap_or(""),
        };
        renderer.render(template, &context)
    }

    /// Render a conversation and encode it.
    ///
    /// The template writes its own special tokens, so none are added.
    pub fn apply_chat_template(
        &self,
        messages: &[ChatMessage],
        options: &ChatTemplateOptions,
    ) -> Result<Vec<T>> {
        let prompt = self.render_chat_template(messages, options)?;
        self.encode(&prompt, false)
    }
}
