//! Quiz command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::study::{Quiz, QuizQuestion};
use crate::transcript::{embed_url_at, format_timestamp};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

pub async fn run_quiz(
    url: &str,
    thread: Option<&str>,
    regenerate: bool,
    interactive: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Generate)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Generating quiz...");
    let result = orchestrator.quiz(url, thread, regenerate).await;
    spinner.finish_and_clear();

    let generated = result?;
    if generated.cached {
        Output::success("Quiz loaded from store.");
    } else if thread.is_some() {
        Output::success("Quiz generated and saved.");
    }

    if interactive {
        play(url, &generated.value)?;
    } else {
        print_answer_key(url, &generated.value);
    }

    Ok(())
}

fn print_question(index: usize, question: &QuizQuestion) {
    println!(
        "\n{} {}",
        style(format!("Question {}:", index + 1)).bold(),
        question.question
    );
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
}

fn print_answer_key(url: &str, quiz: &Quiz) {
    Output::header(&format!("Quiz ({} questions)", quiz.len()));
    for (i, question) in quiz.quizzes.iter().enumerate() {
        print_question(i, question);
        println!(
            "  {} {} {}",
            style("Answer:").green(),
            question.correct_answer,
            style(format!("⏰ {}", format_timestamp(question.timestamp))).dim()
        );
        println!("  {}", style(embed_url_at(url, question.timestamp)).dim());
    }
}

fn play(url: &str, quiz: &Quiz) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut choices = Vec::with_capacity(quiz.len());

    for (i, question) in quiz.quizzes.iter().enumerate() {
        print_question(i, question);
        print!("Your answer (1-{}, enter to skip): ", question.options.len());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let choice = input
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=question.options.len()).contains(n))
            .map(|n| n - 1);
        choices.push(choice);

        match choice.map(|c| question.is_correct(&question.options[c])) {
            Some(true) => println!("{}", style("Correct!").green().bold()),
            _ => println!(
                "{} Correct answer is: {}",
                style("Wrong!").red().bold(),
                question.correct_answer
            ),
        }
        println!(
            "  {} {}",
            style("▶ Watch:").dim(),
            style(embed_url_at(url, question.timestamp)).dim()
        );
    }

    println!();
    Output::success(&format!("Score: {}/{}", quiz.score(&choices), quiz.len()));
    Ok(())
}
