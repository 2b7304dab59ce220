//! Basic Anthropic client usage example

use anthropic_client::{AnthropicClient, Message, MessagesRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = AnthropicClient::from_env()?;

    let response = client
        .messages(
            MessagesRequest::new("claude-sonnet-4-5-20250929")
                .max_tokens(200)
                .system("You are a concise assistant.")
                .message(Message::user("What is Rust in one sentence?")),
        )
        .await?;

    println!("Response: {}", response.text());

    if let Some(usage) = &response.usage {
        println!(
            "Tokens: {} in / {} out",
            usage.input_tokens, usage.output_tokens
        );
    }

    Ok(())
}
