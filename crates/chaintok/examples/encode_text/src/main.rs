use chaintok::Tokenizer;
use chaintok::tokenizer::{ChatMessage, ChatTemplateOptions};
use clap::Parser;
use std::time::Duration;

/// Encode text with a hub tokenizer directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a directory holding `tokenizer.json`.
    #[arg(long)]
    pub tokenizer_dir: String,

    /// Text to encode.
    #[arg(long, default_value = "Hello world!")]
    pub text: String,

    /// Optional pair text.
    #[arg(long)]
    pub pair: Option<String>,

    /// Add special tokens.
    #[arg(long, default_value = "true")]
    pub add_special_tokens: bool,

    /// Render `--text` as a single user message through the chat template.
    #[arg(long, default_value = "false")]
    pub chat: bool,

    /// Number of timing repetitions; 0 to skip timing.
    #[arg(long, default_value = "0")]
    pub timing_reps: usize,

    /// Enable verbose output.
    #[arg(long, default_value = "false")]
    pub verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.verbose {
        println!("{:#?}", args);
    }

    let t0 = std::time::Instant::now();
    let tokenizer: Tokenizer = Tokenizer::from_dir(&args.tokenizer_dir)?;
    println!("Loaded Tokenizer:");
    println!("- load time: {:?}", std::time::Instant::now().duration_since(t0));
    println!("- vocab_size: {}", tokenizer.vocab_size());
    if args.verbose {
        println!("- bos: {:?}", tokenizer.bos_token());
        println!("- eos: {:?}", tokenizer.eos_token());
        println!("- unk: {:?}", tokenizer.unk_token());
        println!("- max length: {:?}", tokenizer.model_max_length());
    }

    let text = if args.chat {
        let messages = vec![ChatMessage::user(args.text.as_str())];
        let options = ChatTemplateOptions::default().with_add_generation_prompt(true);
        let prompt = tokenizer.render_chat_template(&messages, &options)?;
        println!();
        println!("Chat Prompt:");
        println!("{prompt}");
        prompt
    } else {
        args.text.clone()
    };
    let add_special_tokens = args.add_special_tokens && !args.chat;

    let encoding =
        tokenizer.encode_to_encoding(&text, args.pair.as_deref(), add_special_tokens)?;

    println!();
    println!("Encoding:");
    println!("- tokens: {:?}", encoding.tokens());
    println!("- ids: {:?}", encoding.ids());
    println!("- type_ids: {:?}", encoding.type_ids());
    if !encoding.overflowing().is_empty() {
        println!("- overflowing parts: {}", encoding.overflowing().len());
    }

    let decoded = tokenizer.decode(encoding.ids(), true)?;
    println!();
    println!("Decoded:");
    println!("- text: {decoded:?}");
    println!("- round trip: {}", decoded == text);

    if args.timing_reps > 0 {
        let t0 = std::time::Instant::now();
        for _ in 0..args.timing_reps {
            tokenizer.encode(&text, add_special_tokens)?;
        }
        let avg_ns = std::time::Instant::now().duration_since(t0).as_nanos() as u64
            / args.timing_reps as u64;

        println!();
        println!("Timing Encode:");
        println!("- avg: {:?}", Duration::from_nanos(avg_ns));
        let mb_p_s = text.len() as f64 / avg_ns.max(1) as f64 * 1e9 / 1e6;
        println!("- avg bps: {:.2} MB/s", mb_p_s);
    }

    Ok(())
}
