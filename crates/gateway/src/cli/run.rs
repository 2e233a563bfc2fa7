//! One-shot commands: each boots an orchestrator, handles a single request,
//! prints the reply and exits.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use gr_domain::config::Config;
use gr_domain::ConversationScope;

use crate::bootstrap;
use crate::runtime::ImageReply;

#[derive(Debug, Serialize)]
struct AiOutput<'a> {
    scope: String,
    prompt: &'a str,
    search: bool,
    reply: &'a str,
}

/// `gemrelay ai`.
pub async fn ai(
    config: &Config,
    ephemeral: bool,
    scope: ConversationScope,
    prompt: &str,
    search: bool,
    json: bool,
) -> anyhow::Result<()> {
    let orchestrator = bootstrap::build_orchestrator(config, ephemeral)?;
    let reply = orchestrator
        .handle_text_request(scope, prompt, search)
        .await
        .context("saving conversation history")?;

    if json {
        let out = AiOutput {
            scope: scope.to_string(),
            prompt,
            search,
            reply: &reply,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{reply}");
    }
    Ok(())
}

/// `gemrelay ai-upload`.
pub async fn ai_upload(
    config: &Config,
    image: &Path,
    text: Option<&str>,
    search: bool,
    mime: Option<&str>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;
    let mime = mime.map(str::to_owned).unwrap_or_else(|| guess_mime(image).to_owned());

    // Vision requests never touch history, so the store can stay in memory.
    let orchestrator = bootstrap::build_orchestrator(config, true)?;
    let reply = orchestrator
        .handle_vision_request(bytes, &mime, text, search)
        .await;
    println!("{reply}");
    Ok(())
}

/// `gemrelay generate-image`. Fails (non-zero exit) when no image came back.
pub async fn generate_image(config: &Config, prompt: &str, out: &Path) -> anyhow::Result<()> {
    let orchestrator = bootstrap::build_orchestrator(config, true)?;
    match orchestrator.handle_image_generation_request(prompt).await {
        ImageReply::Image(bytes) => {
            tokio::fs::write(out, &bytes)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Image written to {} ({} bytes)", out.display(), bytes.len());
            Ok(())
        }
        ImageReply::Failed(message) => anyhow::bail!(message),
    }
}

/// `gemrelay reset-ai`.
pub async fn reset_ai(config: &Config, ephemeral: bool, scope: ConversationScope) -> anyhow::Result<()> {
    let orchestrator = bootstrap::build_orchestrator(config, ephemeral)?;
    let message = orchestrator
        .reset_scope(scope)
        .await
        .context("saving conversation history")?;
    println!("{message}");
    Ok(())
}

/// MIME type from a file extension. Unknown extensions are not images.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(Path::new("cat.PNG")), "image/png");
        assert_eq!(guess_mime(Path::new("a/b.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(guess_mime(Path::new("noext")), "application/octet-stream");
    }
}
