//! Instruction prompt shared by every backend.

use learnforge_core::{OutputMode, ProviderRequest, DEFAULT_LANGUAGE};

const RESPONSE_SCHEMA: &str = r#"{
  "topic": "string",
  "topic_source": "user" or "inferred",
  "topic_confidence": 0.0-1.0,
  "summary": "string",
  "key_points": ["string"],
  "flashcards": [{"q": "string", "a": "string"}],
  "quiz": [{"q": "string", "choices": ["string"], "answer": "string"}]
}"#;

fn mode_instruction(mode: OutputMode) -> &'static str {
    match mode {
        OutputMode::Lesson => {
            "Generate a comprehensive lesson with summary, key points, flashcards, and quiz questions.\n"
        }
        OutputMode::Flashcards => "Generate flashcards (question-answer pairs) from this text.\n",
        OutputMode::Quiz => "Generate quiz questions with multiple choice answers from this text.\n",
    }
}

/// Build the deterministic instruction prompt for a request.
pub fn build_prompt(request: &ProviderRequest) -> String {
    let mut prompt = String::with_capacity(request.text.len() + 1024);

    prompt.push_str(
        "You are an educational content generator. Process the following text and create structured learning content.\n\n",
    );
    prompt.push_str("Text to process:\n");
    prompt.push_str(&request.text);
    prompt.push_str("\n\n");

    prompt.push_str(mode_instruction(request.mode));

    match &request.topic {
        Some(topic) => {
            prompt.push_str("Topic: ");
            prompt.push_str(topic);
            prompt.push('\n');
        }
        None => prompt
            .push_str("Infer the topic from the text and provide your confidence (0.0-1.0).\n"),
    }

    if let Some(level) = request.level {
        prompt.push_str("Difficulty level: ");
        prompt.push_str(level.as_str());
        prompt.push('\n');
    }

    if !request.language.is_empty() && request.language != DEFAULT_LANGUAGE {
        prompt.push_str("Language: ");
        prompt.push_str(&request.language);
        prompt.push('\n');
    }

    prompt.push('\n');
    prompt.push_str("IMPORTANT: Respond ONLY with valid JSON matching this exact schema:\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push_str("\n\nDo not include any text outside the JSON. Return only the JSON object.");

    prompt
}
