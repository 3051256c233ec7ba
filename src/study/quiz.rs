//! Multiple-choice quizzes.

use super::{require_segments, transcript_vars};
use crate::config::Prompts;
use crate::error::{Result, TubetalkError};
use crate::llm::{parse_json, LanguageModel, PromptMessage};
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One question with its options and the transcript position it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub timestamp: f64,
}

impl QuizQuestion {
    pub fn is_correct(&self, choice: &str) -> bool {
        choice.trim() == self.correct_answer
    }

    /// Index of the correct option.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }

    /// Point `correct_answer` at the option it names, ignoring case and whitespace.
    fn normalize(mut self) -> Option<Self> {
        let wanted = self.correct_answer.trim().to_lowercase();
        let option = self
            .options
            .iter()
            .find(|o| o.trim().to_lowercase() == wanted)?
            .clone();
        self.correct_answer = option;
        Some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quiz {
    pub quizzes: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    /// Count correct choices. Unanswered questions count as wrong.
    pub fn score(&self, choices: &[Option<usize>]) -> usize {
        self.quizzes
            .iter()
            .zip(choices)
            .filter(|(q, choice)| {
                choice
                    .and_then(|i| q.options.get(i))
                    .is_some_and(|o| q.is_correct(o))
            })
            .count()
    }
}

/// Generates quizzes with a language model.
pub struct QuizGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    question_count: usize,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, question_count: usize) -> Self {
        Self {
            model,
            prompts,
            question_count,
        }
    }

    #[instrument(skip(self, transcript), fields(video_id = %transcript.video_id))]
    pub async fn generate(&self, transcript: &Transcript) -> Result<Quiz> {
        require_segments(transcript)?;

        let mut vars = transcript_vars(transcript.flatten());
        vars.insert("question_count".to_string(), self.question_count.to_string());

        let messages = vec![
            PromptMessage::system(self.prompts.render_with_custom(&self.prompts.quiz.system, &vars)),
            PromptMessage::user(self.prompts.render_with_custom(&self.prompts.quiz.user, &vars)),
        ];

        let reply = self.model.complete(&messages).await?;
        let quiz = Self::validate(parse_json(&reply)?)?;

        if quiz.len() != self.question_count {
            warn!(
                "Asked for {} questions, model returned {}",
                self.question_count,
                quiz.len()
            );
        }

        info!("Generated quiz with {} questions", quiz.len());
        Ok(quiz)
    }

    /// Drop questions whose answer is not one of their options.
    fn validate(quiz: Quiz) -> Result<Quiz> {
        let mut kept = Vec::with_capacity(quiz.quizzes.len());

        for question in quiz.quizzes {
            if question.options.len() != 4 {
                warn!(
                    "Question {:?} has {} options",
                    question.question,
                    question.options.len()
                );
            }
            match question.clone().normalize() {
                Some(q) => kept.push(q),
                None => warn!(
                    "Dropping question {:?}: answer {:?} is not an option",
                    question.question, question.correct_answer
                ),
            }
        }

        if kept.is_empty() {
            return Err(TubetalkError::MalformedResponse(
                "quiz contains no usable questions".to_string(),
            ));
        }

        Ok(Quiz { quizzes: kept })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{lecture, CannedModel};

    const REPLY: &str = r#"{"quizzes": [
        {"question": "What is a tree?", "options": ["A cycle", "A connected acyclic graph", "A list", "A map"],
         "correct_answer": "a connected acyclic graph ", "timestamp": 10.0},
        {"question": "Broken", "options": ["a", "b", "c", "d"], "correct_answer": "e", "timestamp": 0.0}
    ]}"#;

    #[tokio::test]
    async fn test_generate_quiz_normalizes_and_drops() {
        let model = Arc::new(CannedModel::new(REPLY));
        let generator = QuizGenerator::new(model.clone(), Prompts::default(), 10);

        let quiz = generator.generate(&lecture()).await.unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.quizzes[0].correct_answer, "A connected acyclic graph");
        assert_eq!(quiz.quizzes[0].correct_index(), Some(1));

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].content.contains("exactly 10 multiple-choice"));
        assert!(prompts[1].content.contains("welcome to the course (0.0)"));
    }

    #[test]
    fn test_score() {
        let quiz = Quiz {
            quizzes: vec![
                QuizQuestion {
                    question: "q1".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                    correct_answer: "b".to_string(),
                    timestamp: 0.0,
                },
                QuizQuestion {
                    question: "q2".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                    correct_answer: "a".to_string(),
                    timestamp: 5.0,
                },
            ],
        };

        assert_eq!(quiz.score(&[Some(1), Some(0)]), 2);
        assert_eq!(quiz.score(&[Some(0), None]), 0);
        assert_eq!(quiz.score(&[Some(1), Some(7)]), 1);
    }

    #[tokio::test]
    async fn test_quiz_without_valid_questions_fails() {
        let reply = r#"{"quizzes": [{"question": "x", "options": ["a"], "correct_answer": "z", "timestamp": 1}]}"#;
        let generator = QuizGenerator::new(Arc::new(CannedModel::new(reply)), Prompts::default(), 10);
        assert!(matches!(
            generator.generate(&lecture()).await,
            Err(TubetalkError::MalformedResponse(_))
        ));
    }
}
