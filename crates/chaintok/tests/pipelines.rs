use chaintok::tokenizer::{
    ChatMessage, ChatTemplateOptions, PaddingParams, PaddingStrategy, SpecialRole,
    TruncationParams,
};
use chaintok::vocab::ByteTable;
use chaintok::{Tokenizer, TokenizerError};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use tempdir::TempDir;

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bert() -> Tokenizer {
    Tokenizer::from_dir(fixture_dir("bert-tiny")).unwrap()
}

/// A byte-level BPE `tokenizer.json` over the full 256-byte alphabet.
fn byte_level_json() -> String {
    let table = ByteTable::gpt2();
    let mut vocab = Map::new();
    for b in 0..=255u8 {
        vocab.insert(table.get_char(b).to_string(), json!(b));
    }
    let merged = ["He", "ll", "Hell", "Hello", "Ġw", "or", "Ġwor", "ld", "Ġworld"];
    for (i, token) in merged.iter().enumerate() {
        vocab.insert(token.to_string(), json!(256 + i));
    }

    json!({
        "version": "1.0",
        "added_tokens": [
            {"id": 265, "content": "<|im_start|>", "special": true, "normalized": false},
            {"id": 266, "content": "<|im_end|>", "special": true, "normalized": false},
            {"id": 267, "content": "<|endoftext|>", "special": true, "normalized": false}
        ],
        "normalizer": null,
        "pre_tokenizer": {"type": "ByteLevel", "add_prefix_space": false, "trim_offsets": true, "use_regex": true},
        "post_processor": {"type": "ByteLevel", "add_prefix_space": true, "trim_offsets": false, "use_regex": true},
        "decoder": {"type": "ByteLevel", "add_prefix_space": true, "trim_offsets": true, "use_regex": true},
        "model": {
            "type": "BPE",
            "dropout": null,
            "unk_token": null,
            "vocab": Value::Object(vocab),
            "merges": ["H e", "l l", "He ll", "Hell o", "Ġ w", "o r", "Ġw or", "l d", "Ġwor ld"]
        }
    })
    .to_string()
}

const CHATML: &str = "{% for m in messages %}<|im_start|>{{ m.role }}\n{{ m.content }}<|im_end|>\n{% endfor %}\
{% if add_generation_prompt %}<|im_start|>assistant\n{% endif %}";

/// A model directory with a config template and an overriding `chat_template.jinja`.
fn chat_model_dir() -> TempDir {
    let dir = TempDir::new("chaintok").unwrap();
    std::fs::write(dir.path().join("tokenizer.json"), byte_level_json()).unwrap();
    std::fs::write(
        dir.path().join("tokenizer_config.json"),
        json!({
            "eos_token": "<|im_end|>",
            "pad_token": "<|endoftext|>",
            "chat_template": "{% for m in messages %}{{ m.role }}: {{ m.content }}\n{% endfor %}",
            "model_max_length": 1e30
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(dir.path().join("chat_template.jinja"), CHATML).unwrap();
    dir
}

#[test]
fn test_bert_accented_word() {
    let tokenizer = bert();
    assert_eq!(tokenizer.tokenize("mąka").unwrap(), vec!["ma", "##ka"]);
    assert_eq!(
        tokenizer.encode("mąka", true).unwrap(),
        vec![101, 5003, 2912, 102]
    );
}

#[test]
fn test_bert_encode_decode() {
    let tokenizer = bert();

    let ids = tokenizer.encode("The sun is shining.", true).unwrap();
    assert_eq!(ids, vec![101, 1996, 3103, 2003, 11895, 2075, 1012, 102]);
    assert_eq!(tokenizer.decode(&ids, true).unwrap(), "the sun is shining.");

    // Uncased: the original casing does not survive.
    let ids = tokenizer.encode("Hello, world!", false).unwrap();
    assert_eq!(ids, vec![7592, 1010, 2088, 999]);
    assert_eq!(tokenizer.decode(&ids, false).unwrap(), "hello, world!");

    assert_eq!(tokenizer.encode("xyz", false).unwrap(), vec![100]);
}

#[test]
fn test_bert_pair_and_added_tokens() {
    let tokenizer = bert();

    let encoding = tokenizer
        .encode_to_encoding("hello", Some("world"), true)
        .unwrap();
    assert_eq!(encoding.ids(), &[101, 7592, 102, 2088, 102]);
    assert_eq!(encoding.type_ids(), &[0, 0, 0, 1, 1]);
    assert_eq!(encoding.special_tokens_mask(), &[1, 0, 1, 0, 1]);

    assert_eq!(
        tokenizer.encode("the [MASK] is shining", false).unwrap(),
        vec![1996, 103, 2003, 11895, 2075]
    );
}

#[test]
fn test_bert_lookups() {
    let tokenizer = bert();

    assert_eq!(tokenizer.vocab_size(), 17);
    assert_eq!(tokenizer.get_vocab().len(), 17);
    assert_eq!(tokenizer.token_to_id("[CLS]"), Some(101));
    assert_eq!(tokenizer.id_to_token(2912), Some("##ka"));
    assert_eq!(tokenizer.token_to_id("nope"), None);

    assert_eq!(tokenizer.special_token(SpecialRole::Cls), Some("[CLS]"));
    assert_eq!(tokenizer.special_token_id(SpecialRole::Mask), Some(103));
    assert_eq!(tokenizer.pad_token_id(), Some(0));
    assert_eq!(tokenizer.unk_token(), Some("[UNK]"));
    assert_eq!(tokenizer.bos_token(), None);
    assert_eq!(tokenizer.model_max_length(), Some(512));

    for (token, id) in tokenizer.get_vocab() {
        assert_eq!(tokenizer.id_to_token(id), Some(token.as_str()));
    }

    assert!(matches!(
        tokenizer.decode(&[101, 424242], false),
        Err(TokenizerError::UnknownId(424242))
    ));
}

#[test]
fn test_bert_truncation_and_padding() {
    let mut tokenizer = bert();

    tokenizer.set_truncation(Some(TruncationParams::new(5)));
    let encoding = tokenizer
        .encode_to_encoding("The sun is shining.", None, true)
        .unwrap();
    assert_eq!(encoding.ids(), &[101, 1996, 3103, 2003, 102]);
    assert_eq!(encoding.overflowing()[0].ids(), &[11895, 2075, 1012]);

    tokenizer.set_truncation(None);
    tokenizer.set_padding(Some(PaddingParams {
        strategy: PaddingStrategy::Fixed(6),
        ..PaddingParams::default()
    }));
    let batch = tokenizer.encode_batch(&["hello", "hello world"], true).unwrap();
    assert_eq!(batch[0].ids(), &[101, 7592, 102, 0, 0, 0]);
    assert_eq!(batch[0].attention_mask(), &[1, 1, 1, 0, 0, 0]);
    assert_eq!(batch[1].ids(), &[101, 7592, 2088, 102, 0, 0]);
}

#[test]
fn test_bert_from_files_matches_from_dir() {
    let dir = fixture_dir("bert-tiny");
    let from_files: Tokenizer = Tokenizer::from_files(
        dir.join("tokenizer.json"),
        Some(dir.join("tokenizer_config.json")),
    )
    .unwrap();
    let from_dir = bert();

    let text = "Hello, the sun is shining! mąka";
    assert_eq!(
        from_files.encode(text, true).unwrap(),
        from_dir.encode(text, true).unwrap()
    );

    // Without the config there are no role bindings.
    let bare: Tokenizer = Tokenizer::from_files(dir.join("tokenizer.json"), None::<PathBuf>).unwrap();
    assert_eq!(bare.special_token(SpecialRole::Cls), None);
    assert_eq!(bare.encode(text, true).unwrap(), from_dir.encode(text, true).unwrap());
}

#[test]
fn test_missing_files() {
    let dir = TempDir::new("chaintok").unwrap();
    let err = Tokenizer::<u32>::from_dir(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("tokenizer.json"));
}

#[test]
fn test_bert_has_no_chat_template() {
    let tokenizer = bert();
    let messages = vec![ChatMessage::user("hello")];
    assert!(matches!(
        tokenizer.apply_chat_template(&messages, &ChatTemplateOptions::default()),
        Err(TokenizerError::MissingChatTemplate)
    ));
}

#[test]
fn test_byte_level_round_trip() {
    let tokenizer: Tokenizer = Tokenizer::from_json_str(&byte_level_json(), None).unwrap();

    assert_eq!(tokenizer.tokenize("Hello world").unwrap(), vec!["Hello", "Ġworld"]);
    assert_eq!(tokenizer.encode("Hello world", true).unwrap(), vec![259, 264]);

    for text in ["Hello world", "héllo,  wörld!\n\ttabs", "🦀 crabs 🦀", ""] {
        let ids = tokenizer.encode(text, true).unwrap();
        assert_eq!(tokenizer.decode(&ids, false).unwrap(), text);
        assert_eq!(tokenizer.encode(text, true).unwrap(), ids);
    }
}

#[test]
fn test_byte_level_special_tokens() {
    let tokenizer: Tokenizer = Tokenizer::from_json_str(&byte_level_json(), None).unwrap();

    let ids = tokenizer
        .encode("Hello<|endoftext|>Hello", false)
        .unwrap();
    assert_eq!(ids, vec![259, 267, 259]);
    assert_eq!(tokenizer.decode(&ids, false).unwrap(), "Hello<|endoftext|>Hello");
    assert_eq!(tokenizer.decode(&ids, true).unwrap(), "HelloHello");
    assert_eq!(tokenizer.vocab_size(), 268);
}

#[cfg(feature = "chat-template")]
#[test]
fn test_chat_template_from_dir() {
    let dir = chat_model_dir();
    let tokenizer: Tokenizer = Tokenizer::from_dir(dir.path()).unwrap();

    assert_eq!(tokenizer.eos_token_id(), Some(266));
    assert_eq!(tokenizer.pad_token_id(), Some(267));
    assert_eq!(tokenizer.model_max_length(), None);

    let messages = vec![ChatMessage::user("Hello world")];
    let options = ChatTemplateOptions::default().with_add_generation_prompt(true);

    // The standalone template wins over the config's.
    let prompt = tokenizer.render_chat_template(&messages, &options).unwrap();
    assert_eq!(
        prompt,
        "<|im_start|>user\nHello world<|im_end|>\n<|im_start|>assistant\n"
    );

    let ids = tokenizer.apply_chat_template(&messages, &options).unwrap();
    assert_eq!(ids[0], 265);
    assert!(ids.contains(&259));
    assert!(ids.contains(&264));
    assert_eq!(tokenizer.decode(&ids, false).unwrap(), prompt);
    assert_eq!(
        tokenizer.decode(&ids, true).unwrap(),
        "user\nHello world\nassistant\n"
    );

    // An explicit template wins over both.
    let options = options.with_template("{{ messages[0].content }}{{ eos_token }}");
    assert_eq!(
        tokenizer.render_chat_template(&messages, &options).unwrap(),
        "Hello world<|im_end|>"
    );
}

/// A Unigram model behind a Metaspace pre-tokenizer with the given prepend scheme.
fn unigram_metaspace_json(prepend_scheme: &str) -> String {
    json!({
        "added_tokens": [
            {"id": 0, "content": "<unk>", "special": true, "normalized": false},
            {"id": 1, "content": "<s>", "special": true, "normalized": false},
            {"id": 2, "content": "</s>", "special": true, "normalized": false}
        ],
        "normalizer": null,
        "pre_tokenizer": {"type": "Metaspace", "replacement": "▁", "prepend_scheme": prepend_scheme, "split": true},
        "post_processor": {
            "type": "TemplateProcessing",
            "single": "<s> $A",
            "pair": "<s> $A <s>:1 $B:1",
            "special_tokens": {"<s>": {"id": "<s>", "ids": [1], "tokens": ["<s>"]}}
        },
        "decoder": {"type": "Metaspace", "replacement": "▁", "prepend_scheme": prepend_scheme, "split": true},
        "model": {
            "type": "Unigram",
            "unk_id": 0,
            "vocab": [
                ["<unk>", 0.0], ["<s>", 0.0], ["</s>", 0.0],
                ["▁hello", -1.0], ["▁world", -1.5],
                ["▁", -10.0], ["h", -10.0], ["e", -10.0], ["l", -10.0], ["o", -10.0],
                ["w", -10.0], ["r", -10.0], ["d", -10.0], ["world", -2.0]
            ]
        }
    })
    .to_string()
}

#[test]
fn test_unigram_metaspace_pipeline() {
    let json = unigram_metaspace_json("always");
    let tokenizer: Tokenizer = Tokenizer::from_json_str(&json, None).unwrap();

    assert_eq!(tokenizer.tokenize("hello world").unwrap(), vec!["▁hello", "▁world"]);
    let ids = tokenizer.encode("hello world", true).unwrap();
    assert_eq!(ids, vec![1, 3, 4]);
    assert_eq!(tokenizer.decode(&ids, true).unwrap(), "hello world");

    let encoding = tokenizer
        .encode_to_encoding("hello", Some("world"), true)
        .unwrap();
    assert_eq!(encoding.ids(), &[1, 3, 1, 4]);
    assert_eq!(encoding.type_ids(), &[0, 0, 1, 1]);
}

#[test]
fn test_metaspace_prepend_around_added_tokens() {
    let first: Tokenizer =
        Tokenizer::from_json_str(&unigram_metaspace_json("first"), None).unwrap();
    assert_eq!(
        first.tokenize("hello<s>world").unwrap(),
        vec!["▁hello", "<s>", "world"]
    );
    assert_eq!(first.encode("hello<s>world", false).unwrap(), vec![3, 1, 13]);

    // A leading added token still leaves the text after it mid-sequence.
    assert_eq!(first.tokenize("<s>hello").unwrap(), vec!["<s>", "h", "e", "l", "l", "o"]);

    let always: Tokenizer =
        Tokenizer::from_json_str(&unigram_metaspace_json("always"), None).unwrap();
    assert_eq!(
        always.tokenize("hello<s>world").unwrap(),
        vec!["▁hello", "<s>", "▁world"]
    );
    assert_eq!(always.encode("hello<s>world", false).unwrap(), vec![3, 1, 4]);
}

#[test]
fn test_bad_config_names_field() {
    let err = Tokenizer::<u32>::from_json_str(
        r#"{"model": {"type": "WordLevel", "vocab": {"a": 0}}, "pre_tokenizer": {"type": "Nope"}}"#,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, TokenizerError::Config { ref field, .. } if field == "pre_tokenizer"));
}
