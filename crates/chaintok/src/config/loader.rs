//! # Tokenizer File Loading

use anyhow::Context;
use std::path::{Path, PathBuf};

/// The tokenizer data file name.
pub const TOKENIZER_JSON: &str = "tokenizer.json";

/// The generic config file name.
pub const TOKENIZER_CONFIG_JSON: &str = "tokenizer_config.json";

/// A standalone chat template, preferred over the config's.
pub const CHAT_TEMPLATE_JINJA: &str = "chat_template.jinja";

/// The raw documents that make up a tokenizer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenizerFiles {
    /// `tokenizer.json` contents.
    pub tokenizer_json: String,

    /// `tokenizer_config.json` contents, if present.
    pub tokenizer_config: Option<String>,

    /// `chat_template.jinja` contents, if present.
    pub chat_template: Option<String>,
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_if_exists(path: &Path) -> anyhow::Result<Option<String>> {
    if path.is_file() {
        read(path).map(Some)
    } else {
        Ok(None)
    }
}

impl TokenizerFiles {
    /// Read the two JSON documents from explicit paths.
    pub fn from_files<P, Q>(
        tokenizer_json: P,
        tokenizer_config: Option<Q>,
    ) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Ok(Self {
            tokenizer_json: read(tokenizer_json.as_ref())?,
            tokenizer_config: tokenizer_config
                .map(|p| read(p.as_ref()))
                .transpose()?,
            chat_template: None,
        })
    }

    /// Read whatever tokenizer files a model directory holds.
    ///
    /// `tokenizer.json` is required; the others are optional.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir: PathBuf = dir.as_ref().to_path_buf();
        let files = Self {
            tokenizer_json: read(&dir.join(TOKENIZER_JSON))?,
            tokenizer_config: read_if_exists(&dir.join(TOKENIZER_CONFIG_JSON))?,
            chat_template: read_if_exists(&dir.join(CHAT_TEMPLATE_JINJA))?,
        };
        log::info!(
            "loaded tokenizer files from {} (config: {}, chat template: {})",
            dir.display(),
            files.tokenizer_config.is_some(),
            files.chat_template.is_some()
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_from_dir() {
        let dir = TempDir::new("chaintok_loader").unwrap();
        std::fs::write(dir.path().join(TOKENIZER_JSON), "{}").unwrap();
        std::fs::write(dir.path().join(CHAT_TEMPLATE_JINJA), "{{ x }}").unwrap();

        let files = TokenizerFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.tokenizer_json, "{}");
        assert_eq!(files.tokenizer_config, None);
        assert_eq!(files.chat_template.as_deref(), Some("{{ x }}"));
    }

    #[test]
    fn test_missing_tokenizer_json() {
        let dir = TempDir::new("chaintok_loader").unwrap();
        let err = TokenizerFiles::from_dir(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(TOKENIZER_JSON));

        let err = TokenizerFiles::from_files(dir.path().join("nope.json"), None::<&Path>)
            .unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
