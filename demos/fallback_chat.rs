use std::env;
use std::io::{self, Write};

use cascadellm::client_wrapper::{ClientWrapper, Message, RequestOptions, Role};
use cascadellm::presets::Preset;
use cascadellm::{BackendRegistry, ClientError, FallbackClient, ProviderSettings};
use futures_util::StreamExt;

// Run from the root folder of the repo as follows:
// GOOGLE_GENERATIVE_AI_API_KEY=... GROQ_API_KEY=... OPENAI_API_KEY=... cargo run --example fallback_chat
// Pick another chain with FALLBACK_PRESET=ultra_fast (balanced, premium, free_tier_max, ...)
// RUST_LOG=info shows which backend served each turn.

#[tokio::main]
async fn main() {
    cascadellm::init_logger();

    println!("=== cascadellm Fallback Chat ===\n");

    let preset: Preset = env::var("FALLBACK_PRESET")
        .unwrap_or_else(|_| "balanced".to_string())
        .parse()
        .expect("FALLBACK_PRESET must name a known preset");

    let registry = BackendRegistry::from_settings(ProviderSettings::from_env());
    let model = match FallbackClient::from_preset(preset, &registry) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("{}", err);
            for (backend, reason) in &err.skipped {
                eprintln!("  - {}: {}", backend, reason);
            }
            eprintln!("Set at least one of the provider API keys and try again.");
            return;
        }
    };

    println!("Preset: {}", preset);
    println!("Chain: {}\n", model.display_names().join(" -> "));

    let options = RequestOptions {
        temperature: Some(0.7),
        max_tokens: Some(1024),
    };
    let mut history = vec![Message::new(
        Role::System,
        "You are a helpful assistant. Keep answers short.",
    )];

    loop {
        print!("\nYou [empty line to quit]: ");
        io::stdout().flush().unwrap();

        let mut user_input = String::new();
        io::stdin()
            .read_line(&mut user_input)
            .expect("Failed to read line");
        let user_input = user_input.trim();
        if user_input.is_empty() {
            break;
        }
        history.push(Message::new(Role::User, user_input));

        print!("\nAssistant: ");
        io::stdout().flush().unwrap();

        let mut stream = match model.send_message_stream(&history, &options).await {
            Ok(stream) => stream,
            Err(ClientError::Exhausted(exhausted)) => {
                println!("\nEvery backend is out of capacity right now:");
                for attempt in &exhausted.attempts {
                    println!("  - {}: {}", attempt.backend, attempt.error);
                }
                history.pop();
                continue;
            }
            Err(err) => {
                println!("\nError: {}", err);
                history.pop();
                continue;
            }
        };

        let mut reply = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    print!("{}", chunk.content);
                    io::stdout().flush().unwrap();
                    reply.push_str(&chunk.content);
                }
                Err(err) => {
                    println!("\n[stream interrupted: {}]", err);
                    break;
                }
            }
        }
        println!();
        history.push(Message::new(Role::Assistant, reply));
    }
}
