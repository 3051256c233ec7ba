//! Prompt templates for TubeTalk.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    pub summary: SummaryPrompts,
    pub topics: TopicPrompts,
    pub quiz: QuizPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the retrieval-augmented chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub system: String,
    /// Second system message carrying the retrieved transcript excerpts.
    pub context: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are the YouTuber from the video, directly answering the viewer's question with comprehensive and helpful responses.

Core rules:
- ONLY use the transcript provided - no external knowledge
- Provide detailed, structured answers that fully address the viewer's question
- Each point should start with the core information, then supporting context from the transcript
- Timestamps in the transcript appear in parentheses after the text, in seconds. Do NOT round or estimate them

Response guidelines:
- 3-6 detailed points, roughly 100-200 words in total
- Conversational and engaging, as if you're personally explaining to the viewer
- If the transcript doesn't contain the answer, say: "Sorry, I didn't cover that topic in this video."
- If the viewer greets first, respond warmly, then proceed with their question

Respond with a JSON object and nothing else:
{"answer": ["point one", "point two"], "timestamp": <seconds where the answer was taken from, as a number>}
Do not put timestamps inside the answer strings."#
                .to_string(),

            context: "Transcript:\n{{context}}".to_string(),
        }
    }
}

/// Prompts for video summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert video content analyzer and summarizer.
You will receive a transcript of a YouTube video with timestamps.

Your task is to:
1. Create a structured summary with key points
2. Include timestamp references for each point
3. Identify main topics and themes
4. Provide an overall assessment of the video content

Be concise but comprehensive. Focus on the most important information.
Always include the timestamp reference for where you found each piece of information.

Respond with a JSON object matching this shape:
{
  "title": "Suggested title for the video based on content",
  "overview": "Brief overview of the entire video, up to 200 words",
  "key_points": [
    {"content": "A key point with a brief summary", "timestamp": 12.5, "importance": "high|medium|low"}
  ],
  "main_topics": [
    {"topic": "Topic name", "timestamp": 0.0}
  ],
  "duration_summary": "Summary of video duration and pacing"
}"#
            .to_string(),

            user: r#"Please analyze and summarize the following timestamped video transcript:

{{transcript}}

Provide a structured summary following the specified format."#
                .to_string(),
        }
    }
}

/// Prompts for topic / timestamp outline extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicPrompts {
    pub system: String,
    pub user: String,
}

impl Default for TopicPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert in analyzing and structuring video transcripts.
You will receive a transcript of a YouTube video with timestamps.

Your task is to:
1. Extract all MAIN TOPICS discussed in the transcript.
2. For each MAIN TOPIC, list its SUBTOPICS in a hierarchical structure.
3. Always include timestamp references (in seconds) for both MAIN TOPICS and SUBTOPICS.
4. For each subtopic, optionally add an "importance" (high/medium/low) if it is clearly emphasized.
5. Be concise and only include material that is actually discussed in the transcript.

Respond with valid JSON matching this shape:
{
  "main_topics": [
    {
      "topic": "Main topic name",
      "timestamp": 0.0,
      "subtopics": [
        {"subtopic": "Subtopic name", "timestamp": 14.2, "importance": "high"}
      ]
    }
  ]
}"#
            .to_string(),

            user: r#"Transcript:
{{transcript}}

Notes:
- Use timestamps in seconds (floats allowed).
- Only include main topics and subtopics actually present in the transcript.
- If something is unclear, omit it rather than inventing timestamps.

Now extract main topics and subtopics."#
                .to_string(),
        }
    }
}

/// Prompts for quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QuizPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are QuizBot, an AI assistant that creates professional quizzes.
Your task is to generate exactly {{question_count}} multiple-choice questions from the provided YouTube transcript.

Each question must:
- Be clear, concise, and relevant to the transcript content
- Include 4 answer options
- Clearly specify the correct answer, copied verbatim from the options
- Include the timestamp (in seconds) of the part of the transcript the question was picked from

Respond with a JSON object and nothing else:
{"quizzes": [{"question": "...", "options": ["a", "b", "c", "d"], "correct_answer": "b", "timestamp": 42.0}]}"#
                .to_string(),

            user: r#"Here is the YouTube video transcript:

{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let topics_path = custom_path.join("topics.toml");
            if topics_path.exists() {
                let content = std::fs::read_to_string(&topics_path)?;
                prompts.topics = toml::from_str(&content)?;
            }

            let quiz_path = custom_path.join("quiz.toml");
            if quiz_path.exists() {
                let content = std::fs::read_to_string(&quiz_path)?;
                prompts.quiz = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single pass, so substituted text is never
    /// expanded again. Unknown placeholders are left as written.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.chat.context.contains("{{context}}"));
        assert!(prompts.summary.user.contains("{{transcript}}"));
        assert!(prompts.topics.user.contains("{{transcript}}"));
        assert!(prompts.quiz.system.contains("{{question_count}}"));
    }

    #[test]
    fn test_render_with_custom_prefers_call_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("audience".to_string(), "students".to_string());
        prompts.variables.insert("context".to_string(), "ignored".to_string());

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "intro (0.0)".to_string());

        let rendered = prompts.render_with_custom("For {{audience}}:\n{{context}}", &vars);
        assert_eq!(rendered, "For students:\nintro (0.0)");
    }

    #[test]
    fn test_substituted_text_is_not_expanded_again() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "he said {{question}}".to_string());
        vars.insert("question".to_string(), "why?".to_string());

        let rendered = Prompts::render("{{context}} / {{question}} / {{missing}}", &vars);
        assert_eq!(rendered, "he said {{question}} / why? / {{missing}}");
    }

    #[test]
    fn test_load_custom_dir_overrides_single_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("quiz.toml"),
            "system = \"Make {{question_count}} questions\"\nuser = \"{{transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.quiz.system, "Make {{question_count}} questions");
        assert_eq!(prompts.chat.context, ChatPrompts::default().context);
    }
}
